use crate::model::call::CallId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallType {
    Audio,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallDirection {
    Incoming,
    Outgoing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallOutcome {
    Answered,
    Missed,
    Rejected,
    Failed,
    Cancelled,
}

/// History entry handed to the call log when a session terminates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub call_id: CallId,
    pub peer_name: String,
    pub peer_number: String,
    /// When the call went live, or when it was placed/received if it never did.
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Milliseconds spent live; zero for calls that never connected.
    pub duration_ms: u64,
    pub call_type: CallType,
    pub direction: CallDirection,
    pub outcome: CallOutcome,
    pub quality_label: String,
}
