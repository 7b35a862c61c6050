use crate::config::CallConfig;
use crate::media::MediaEngine;
use crate::recorder::CallLogRecorder;
use crate::session::MediaFlags;
use crate::session::call_command::{CallCommand, CallRequest};
use crate::session::call_session::CallSession;
use crate::signaling::SignalingChannel;
use caller_core::{
    CallState, ConnectionQuality, IncomingOffer, PeerId, QualityMetrics, RelaySignal,
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Handle to a running call session.
///
/// Every operation is queued to the session loop and resolves once it has been
/// processed. None of them fail: a request that does not fit the current
/// state is ignored, and call failures surface as state transitions.
#[derive(Clone)]
pub struct CallManager {
    request_tx: mpsc::Sender<CallRequest>,
    state_rx: watch::Receiver<CallState>,
    state_events: broadcast::Sender<CallState>,
    flags_rx: watch::Receiver<MediaFlags>,
    quality_rx: watch::Receiver<ConnectionQuality>,
    metrics_rx: watch::Receiver<QualityMetrics>,
}

impl CallManager {
    /// Spawns the session loop. `incoming` is the relay inbox, usually the
    /// receiver returned by [`crate::WsSignalingClient::new`].
    pub fn start(
        config: CallConfig,
        engine: Arc<dyn MediaEngine>,
        signaling: Arc<dyn SignalingChannel>,
        incoming: mpsc::Receiver<RelaySignal>,
        recorder: Arc<dyn CallLogRecorder>,
    ) -> (Self, JoinHandle<()>) {
        let (request_tx, request_rx) = mpsc::channel(config.mailbox_capacity.max(1));
        let session = CallSession::new(config, engine, signaling, recorder, request_rx, incoming);

        let manager = Self {
            request_tx,
            state_rx: session.subscribe_state(),
            state_events: session.state_events(),
            flags_rx: session.subscribe_flags(),
            quality_rx: session.monitor().subscribe_quality(),
            metrics_rx: session.monitor().subscribe_metrics(),
        };

        info!("Starting call session");
        let task = tokio::spawn(session.run());
        (manager, task)
    }

    async fn submit(&self, command: CallCommand) {
        let (ack, done) = oneshot::channel();
        if self
            .request_tx
            .send(CallRequest { command, ack })
            .await
            .is_err()
        {
            warn!("Call session is not running; request dropped");
            return;
        }
        let _ = done.await;
    }

    pub async fn start_outgoing_call(
        &self,
        peer_id: impl Into<PeerId>,
        peer_name: impl Into<String>,
        peer_number: impl Into<String>,
        is_video: bool,
    ) {
        self.submit(CallCommand::StartOutgoing {
            peer_id: peer_id.into(),
            peer_name: peer_name.into(),
            peer_number: peer_number.into(),
            is_video,
        })
        .await;
    }

    pub async fn handle_incoming_offer(&self, offer: IncomingOffer) {
        self.submit(CallCommand::IncomingOffer(offer)).await;
    }

    pub async fn answer_call(&self) {
        self.submit(CallCommand::Answer).await;
    }

    pub async fn reject_call(&self) {
        self.submit(CallCommand::Reject).await;
    }

    pub async fn end_call(&self) {
        self.submit(CallCommand::End).await;
    }

    pub async fn toggle_mute(&self, muted: bool) {
        self.submit(CallCommand::ToggleMute(muted)).await;
    }

    pub async fn toggle_video(&self, enabled: bool) {
        self.submit(CallCommand::ToggleVideo(enabled)).await;
    }

    pub async fn toggle_speaker(&self, on: bool) {
        self.submit(CallCommand::ToggleSpeaker(on)).await;
    }

    pub async fn switch_camera(&self) {
        self.submit(CallCommand::SwitchCamera).await;
    }

    pub async fn clear_call_state(&self) {
        self.submit(CallCommand::Clear).await;
    }

    /// Ends any active call and stops the session loop.
    pub async fn shutdown(&self) {
        self.submit(CallCommand::Shutdown).await;
    }

    pub fn state(&self) -> CallState {
        self.state_rx.borrow().clone()
    }

    /// Latest-value view of the call state.
    pub fn subscribe_state(&self) -> watch::Receiver<CallState> {
        self.state_rx.clone()
    }

    /// Every published state in order, including the transient `Ended`.
    pub fn subscribe_events(&self) -> broadcast::Receiver<CallState> {
        self.state_events.subscribe()
    }

    pub fn flags(&self) -> MediaFlags {
        *self.flags_rx.borrow()
    }

    pub fn subscribe_flags(&self) -> watch::Receiver<MediaFlags> {
        self.flags_rx.clone()
    }

    pub fn connection_quality(&self) -> ConnectionQuality {
        *self.quality_rx.borrow()
    }

    pub fn subscribe_quality(&self) -> watch::Receiver<ConnectionQuality> {
        self.quality_rx.clone()
    }

    pub fn quality_metrics(&self) -> QualityMetrics {
        *self.metrics_rx.borrow()
    }

    pub fn subscribe_metrics(&self) -> watch::Receiver<QualityMetrics> {
        self.metrics_rx.clone()
    }
}
