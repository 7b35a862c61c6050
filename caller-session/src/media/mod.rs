mod media_event;
#[cfg(feature = "webrtc")]
mod webrtc_session;

pub use media_event::{MediaEvent, MediaEventSink, PeerConnectionState};
#[cfg(feature = "webrtc")]
pub use webrtc_session::{WebRtcMediaEngine, WebRtcMediaSession};

use crate::error::MediaError;
use async_trait::async_trait;
use caller_core::{IceCandidate, MediaHandle, SessionDescription, StatsSnapshot};
use std::sync::Arc;

/// Creates one media session per call.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Builds a fresh peer connection that reports its callbacks to `events`.
    async fn create_session(
        &self,
        events: MediaEventSink,
    ) -> Result<Arc<dyn MediaSession>, MediaError>;
}

/// Negotiation and media control for a single call.
///
/// A session exclusively owns its capture, encoder and transport resources;
/// `close` must release all of them and be safe to call more than once.
#[async_trait]
pub trait MediaSession: Send + Sync {
    async fn start_local_capture(&self, video_enabled: bool) -> Result<MediaHandle, MediaError>;

    async fn create_offer(&self) -> Result<SessionDescription, MediaError>;

    async fn create_answer(&self) -> Result<SessionDescription, MediaError>;

    async fn set_local_description(&self, description: SessionDescription)
    -> Result<(), MediaError>;

    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), MediaError>;

    /// Candidates may arrive before the remote description; buffering them is
    /// the session's job.
    async fn add_remote_ice_candidate(&self, candidate: IceCandidate) -> Result<(), MediaError>;

    async fn toggle_audio(&self, enabled: bool) -> Result<(), MediaError>;

    async fn toggle_video(&self, enabled: bool) -> Result<(), MediaError>;

    async fn switch_camera(&self) -> Result<(), MediaError>;

    async fn set_speaker(&self, _enabled: bool) -> Result<(), MediaError> {
        Ok(())
    }

    async fn stats_snapshot(&self) -> Result<StatsSnapshot, MediaError>;

    async fn close(&self) -> Result<(), MediaError>;
}
