mod config;
mod error;
pub mod media;
pub mod quality;
pub mod recorder;
pub mod session;
pub mod signaling;

pub use config::{CallConfig, SignalingConfig};
pub use error::{MediaError, RecorderError, SessionError, SignalingError};
pub use media::{MediaEngine, MediaEvent, MediaEventSink, MediaSession, PeerConnectionState};
pub use quality::QualityMonitor;
pub use recorder::{CallLogRecorder, MemoryCallLog};
pub use session::{CallCommand, CallManager, MediaFlags};
pub use signaling::{ConnectionStatus, SignalingChannel, WsSignalingClient};

#[cfg(feature = "webrtc")]
pub use media::{WebRtcMediaEngine, WebRtcMediaSession};
