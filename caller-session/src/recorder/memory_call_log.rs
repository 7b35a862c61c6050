use crate::error::RecorderError;
use crate::recorder::CallLogRecorder;
use async_trait::async_trait;
use caller_core::CallRecord;
use tokio::sync::RwLock;

/// In-memory call history.
#[derive(Default)]
pub struct MemoryCallLog {
    records: RwLock<Vec<CallRecord>>,
}

impl MemoryCallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Up to `limit` records, newest first.
    pub async fn recent(&self, limit: usize) -> Vec<CallRecord> {
        self.records
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    /// All records in the order they were stored.
    pub async fn all(&self) -> Vec<CallRecord> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

#[async_trait]
impl CallLogRecorder for MemoryCallLog {
    async fn record(&self, record: CallRecord) -> Result<(), RecorderError> {
        self.records.write().await.push(record);
        Ok(())
    }
}
