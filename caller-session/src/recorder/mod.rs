//! Call history sink.

mod memory_call_log;

pub use memory_call_log::MemoryCallLog;

use crate::error::RecorderError;
use async_trait::async_trait;
use caller_core::CallRecord;

/// Persists one record per finished call. Failures are logged by the caller
/// and never affect call state.
#[async_trait]
pub trait CallLogRecorder: Send + Sync {
    async fn record(&self, record: CallRecord) -> Result<(), RecorderError>;
}
