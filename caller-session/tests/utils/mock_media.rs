use async_trait::async_trait;
use caller_core::{IceCandidate, MediaHandle, SdpType, SessionDescription, StatsSnapshot};
use caller_session::{MediaEngine, MediaError, MediaEventSink, MediaSession, PeerConnectionState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Which media operations should fail.
#[derive(Debug, Clone, Default)]
pub struct MediaBehavior {
    pub fail_create_session: bool,
    pub fail_capture: bool,
    pub fail_offer: bool,
    pub fail_answer: bool,
    pub fail_remote_description: bool,
    pub fail_close: bool,
    /// Holds `create_answer` for this long before it completes.
    pub answer_delay: Option<Duration>,
}

/// One recorded call into a mock media session.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaCall {
    StartCapture(bool),
    CreateOffer,
    CreateAnswer,
    SetLocal(SdpType),
    SetRemote(SdpType),
    AddCandidate(String),
    ToggleAudio(bool),
    ToggleVideo(bool),
    Speaker(bool),
    SwitchCamera,
    Stats,
    Close,
}

/// Engine handing out [`MockMediaSession`]s and keeping them for inspection.
#[derive(Clone, Default)]
pub struct MockMediaEngine {
    behavior: Arc<Mutex<MediaBehavior>>,
    sessions: Arc<Mutex<Vec<Arc<MockMediaSession>>>>,
}

impl MockMediaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(behavior: MediaBehavior) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(behavior)),
            sessions: Arc::default(),
        }
    }

    pub async fn set_behavior(&self, behavior: MediaBehavior) {
        *self.behavior.lock().await = behavior;
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn last_session(&self) -> Arc<MockMediaSession> {
        self.sessions
            .lock()
            .await
            .last()
            .cloned()
            .expect("no media session was created")
    }
}

#[async_trait]
impl MediaEngine for MockMediaEngine {
    async fn create_session(
        &self,
        events: MediaEventSink,
    ) -> Result<Arc<dyn MediaSession>, MediaError> {
        let behavior = self.behavior.lock().await.clone();
        if behavior.fail_create_session {
            return Err(MediaError::Engine("no peer connection factory".into()));
        }

        let session = Arc::new(MockMediaSession {
            sink: events,
            behavior,
            calls: Mutex::new(Vec::new()),
            stats: Mutex::new(StatsSnapshot::default()),
        });
        self.sessions.lock().await.push(session.clone());
        Ok(session)
    }
}

pub struct MockMediaSession {
    sink: MediaEventSink,
    behavior: MediaBehavior,
    calls: Mutex<Vec<MediaCall>>,
    stats: Mutex<StatsSnapshot>,
}

impl MockMediaSession {
    async fn log(&self, call: MediaCall) {
        tracing::debug!("[MockMedia] {:?}", call);
        self.calls.lock().await.push(call);
    }

    pub async fn calls(&self) -> Vec<MediaCall> {
        self.calls.lock().await.clone()
    }

    pub async fn count(&self, call: &MediaCall) -> usize {
        self.calls.lock().await.iter().filter(|c| *c == call).count()
    }

    pub async fn close_count(&self) -> usize {
        self.count(&MediaCall::Close).await
    }

    pub async fn set_stats(&self, snapshot: StatsSnapshot) {
        *self.stats.lock().await = snapshot;
    }

    pub async fn emit_connection_state(&self, state: PeerConnectionState) {
        self.sink.connection_state(state).await;
    }

    pub async fn emit_remote_stream(&self, handle: MediaHandle) {
        self.sink.remote_stream(handle).await;
    }

    pub async fn emit_ice_candidate(&self, candidate: IceCandidate) {
        self.sink.ice_candidate(candidate).await;
    }
}

pub fn local_handle(video: bool) -> MediaHandle {
    MediaHandle {
        stream_id: "local".into(),
        has_audio: true,
        has_video: video,
    }
}

pub fn remote_handle(video: bool) -> MediaHandle {
    MediaHandle {
        stream_id: "remote".into(),
        has_audio: true,
        has_video: video,
    }
}

#[async_trait]
impl MediaSession for MockMediaSession {
    async fn start_local_capture(&self, video_enabled: bool) -> Result<MediaHandle, MediaError> {
        self.log(MediaCall::StartCapture(video_enabled)).await;
        if self.behavior.fail_capture {
            return Err(MediaError::Capture("camera busy".into()));
        }
        Ok(local_handle(video_enabled))
    }

    async fn create_offer(&self) -> Result<SessionDescription, MediaError> {
        self.log(MediaCall::CreateOffer).await;
        if self.behavior.fail_offer {
            return Err(MediaError::Negotiation("offer rejected by engine".into()));
        }
        Ok(SessionDescription::offer("v=0 mock-offer"))
    }

    async fn create_answer(&self) -> Result<SessionDescription, MediaError> {
        self.log(MediaCall::CreateAnswer).await;
        if let Some(delay) = self.behavior.answer_delay {
            tokio::time::sleep(delay).await;
        }
        if self.behavior.fail_answer {
            return Err(MediaError::Negotiation("answer rejected by engine".into()));
        }
        Ok(SessionDescription::answer("v=0 mock-answer"))
    }

    async fn set_local_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), MediaError> {
        self.log(MediaCall::SetLocal(description.kind)).await;
        Ok(())
    }

    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), MediaError> {
        self.log(MediaCall::SetRemote(description.kind)).await;
        if self.behavior.fail_remote_description {
            return Err(MediaError::Negotiation("malformed sdp".into()));
        }
        Ok(())
    }

    async fn add_remote_ice_candidate(&self, candidate: IceCandidate) -> Result<(), MediaError> {
        self.log(MediaCall::AddCandidate(candidate.candidate)).await;
        Ok(())
    }

    async fn toggle_audio(&self, enabled: bool) -> Result<(), MediaError> {
        self.log(MediaCall::ToggleAudio(enabled)).await;
        Ok(())
    }

    async fn toggle_video(&self, enabled: bool) -> Result<(), MediaError> {
        self.log(MediaCall::ToggleVideo(enabled)).await;
        Ok(())
    }

    async fn switch_camera(&self) -> Result<(), MediaError> {
        self.log(MediaCall::SwitchCamera).await;
        Ok(())
    }

    async fn set_speaker(&self, enabled: bool) -> Result<(), MediaError> {
        self.log(MediaCall::Speaker(enabled)).await;
        Ok(())
    }

    async fn stats_snapshot(&self) -> Result<StatsSnapshot, MediaError> {
        self.log(MediaCall::Stats).await;
        Ok(self.stats.lock().await.clone())
    }

    async fn close(&self) -> Result<(), MediaError> {
        self.log(MediaCall::Close).await;
        if self.behavior.fail_close {
            return Err(MediaError::Release(vec!["audio track stuck".into()]));
        }
        Ok(())
    }
}
