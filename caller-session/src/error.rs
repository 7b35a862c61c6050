use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media engine unavailable: {0}")]
    Engine(String),

    #[error("capture device unavailable: {0}")]
    Capture(String),

    #[error("negotiation failed: {0}")]
    Negotiation(String),

    #[error("no session description produced")]
    MissingDescription,

    #[error("invalid ICE candidate: {0}")]
    InvalidCandidate(String),

    #[error("media session is closed")]
    Closed,

    #[error("failed to release media resources: {}", .0.join("; "))]
    Release(Vec<String>),
}

#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("not connected to the signaling relay")]
    NotConnected,

    #[error("failed to encode signal: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("signaling transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("failed to store call record: {0}")]
    Storage(String),
}

/// Anything that can sink the current call.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Signaling(#[from] SignalingError),
}
