use crate::config::CallConfig;
use crate::media::{MediaEngine, MediaEventSink, MediaSession};
use crate::quality::QualityMonitor;
use crate::recorder::CallLogRecorder;
use crate::session::MediaFlags;
use crate::session::SessionEvent;
use crate::session::call_command::{CallCommand, CallRequest};
use crate::session::duration_timer::DurationTimer;
use crate::signaling::SignalingChannel;
use caller_core::{
    CallDetails, CallOutcome, CallRecord, CallState, ClientSignal, MediaHandle, OngoingState,
    RelaySignal,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Everything owned by the call that is currently active.
pub(crate) struct ActiveCall {
    pub epoch: u64,
    pub details: CallDetails,
    pub media: Option<Arc<dyn MediaSession>>,
    pub placed_at: DateTime<Utc>,
    pub live_since: Option<(Instant, DateTime<Utc>)>,
    /// The local user accepted the call; set before the answer is sent.
    pub answered: bool,
    pub timer: Option<DurationTimer>,
    pub negotiation: Option<JoinHandle<()>>,
    pub local_media: Option<MediaHandle>,
    pub remote_media: Option<MediaHandle>,
}

impl ActiveCall {
    fn new(epoch: u64, details: CallDetails) -> Self {
        Self {
            epoch,
            details,
            media: None,
            placed_at: Utc::now(),
            live_since: None,
            answered: false,
            timer: None,
            negotiation: None,
            local_media: None,
            remote_media: None,
        }
    }

    pub fn live_duration_ms(&self) -> u64 {
        self.live_since
            .map(|(since, _)| u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }

    pub fn ongoing_state(&self) -> OngoingState {
        OngoingState {
            details: self.details.clone(),
            duration_ms: self.live_duration_ms(),
            local_media: self.local_media.clone(),
            remote_media: self.remote_media.clone(),
        }
    }

    fn into_record(self, outcome: CallOutcome, quality_label: String) -> CallRecord {
        let duration_ms = self.live_duration_ms();
        let start_time = self.live_since.map_or(self.placed_at, |(_, at)| at);

        CallRecord {
            call_id: self.details.call_id,
            peer_name: self.details.peer_name.clone(),
            peer_number: self.details.peer_number.clone(),
            start_time,
            end_time: Utc::now(),
            duration_ms,
            call_type: self.details.call_type(),
            direction: self.details.direction(),
            outcome,
            quality_label,
        }
    }
}

/// How a call is being torn down.
#[derive(Debug)]
pub(crate) struct Termination {
    pub outcome: CallOutcome,
    pub reason: String,
    pub notify_peer: bool,
    /// Leave the session in `Error` instead of returning to `Idle`.
    pub fatal: bool,
}

impl Termination {
    pub fn new(outcome: CallOutcome, reason: impl Into<String>) -> Self {
        Self {
            outcome,
            reason: reason.into(),
            notify_peer: true,
            fatal: false,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::new(CallOutcome::Failed, reason)
    }

    pub fn without_notify(mut self) -> Self {
        self.notify_peer = false;
        self
    }

    pub fn fatal(mut self) -> Self {
        self.fatal = true;
        self
    }
}

/// The call session actor. Sole writer of the call state; every request,
/// relay message, media callback and timer tick is handled here one at a time.
pub(crate) struct CallSession {
    pub(super) config: CallConfig,
    pub(super) engine: Arc<dyn MediaEngine>,
    pub(super) signaling: Arc<dyn SignalingChannel>,
    pub(super) recorder: Arc<dyn CallLogRecorder>,
    request_rx: mpsc::Receiver<CallRequest>,
    signal_rx: Option<mpsc::Receiver<RelaySignal>>,
    pub(super) event_tx: mpsc::Sender<SessionEvent>,
    event_rx: mpsc::Receiver<SessionEvent>,
    state_tx: watch::Sender<CallState>,
    state_events: broadcast::Sender<CallState>,
    pub(super) flags_tx: watch::Sender<MediaFlags>,
    pub(super) monitor: QualityMonitor,
    epoch: u64,
    pub(super) active: Option<ActiveCall>,
}

impl CallSession {
    pub fn new(
        config: CallConfig,
        engine: Arc<dyn MediaEngine>,
        signaling: Arc<dyn SignalingChannel>,
        recorder: Arc<dyn CallLogRecorder>,
        request_rx: mpsc::Receiver<CallRequest>,
        signal_rx: mpsc::Receiver<RelaySignal>,
    ) -> Self {
        let capacity = config.mailbox_capacity.max(1);
        let (event_tx, event_rx) = mpsc::channel(capacity);
        let (state_tx, _) = watch::channel(CallState::Idle);
        let (state_events, _) = broadcast::channel(capacity);
        let (flags_tx, _) = watch::channel(MediaFlags::default());
        let monitor = QualityMonitor::new(config.quality_interval());

        Self {
            config,
            engine,
            signaling,
            recorder,
            request_rx,
            signal_rx: Some(signal_rx),
            event_tx,
            event_rx,
            state_tx,
            state_events,
            flags_tx,
            monitor,
            epoch: 0,
            active: None,
        }
    }

    pub fn subscribe_state(&self) -> watch::Receiver<CallState> {
        self.state_tx.subscribe()
    }

    pub fn state_events(&self) -> broadcast::Sender<CallState> {
        self.state_events.clone()
    }

    pub fn subscribe_flags(&self) -> watch::Receiver<MediaFlags> {
        self.flags_tx.subscribe()
    }

    pub fn monitor(&self) -> &QualityMonitor {
        &self.monitor
    }

    pub async fn run(mut self) {
        info!("Call session loop started");

        loop {
            tokio::select! {
                req = self.request_rx.recv() => {
                    match req {
                        Some(CallRequest { command: CallCommand::Shutdown, ack }) => {
                            self.shutdown().await;
                            let _ = ack.send(());
                            break;
                        }
                        Some(CallRequest { command, ack }) => {
                            self.handle_command(command).await;
                            let _ = ack.send(());
                        }
                        None => {
                            info!("All call handles dropped. Shutting down session.");
                            self.shutdown().await;
                            break;
                        }
                    }
                }

                signal = next_signal(&mut self.signal_rx) => {
                    match signal {
                        Some(s) => self.handle_signal(s).await,
                        None => self.on_signaling_closed().await,
                    }
                }

                Some(event) = self.event_rx.recv() => {
                    self.handle_event(event).await;
                }
            }
        }

        info!("Call session loop finished");
    }

    pub(super) fn state(&self) -> CallState {
        self.state_tx.borrow().clone()
    }

    fn answered(&self) -> bool {
        self.active.as_ref().is_some_and(|active| active.answered)
    }

    /// Outcome of a hang-up by the local user.
    pub(super) fn local_end_outcome(&self) -> CallOutcome {
        match self.state() {
            CallState::Ongoing(_) => CallOutcome::Answered,
            _ if self.answered() => CallOutcome::Answered,
            CallState::Incoming(_) => CallOutcome::Rejected,
            _ => CallOutcome::Cancelled,
        }
    }

    /// Outcome of a hang-up by the peer.
    pub(super) fn remote_end_outcome(&self) -> CallOutcome {
        match self.state() {
            CallState::Ongoing(_) => CallOutcome::Answered,
            _ if self.answered() => CallOutcome::Answered,
            CallState::Incoming(_) => CallOutcome::Missed,
            _ => CallOutcome::Rejected,
        }
    }

    /// Sets the authoritative state and broadcasts it.
    pub(super) fn publish(&self, state: CallState) {
        debug!("Call state -> {}", state.name());
        self.state_tx.send_replace(state.clone());
        let _ = self.state_events.send(state);
    }

    /// Starts tracking a new call and returns its epoch.
    pub(super) fn begin_call(&mut self, details: CallDetails) -> u64 {
        self.epoch += 1;
        self.flags_tx
            .send_replace(MediaFlags::for_call(details.is_video));
        self.active = Some(ActiveCall::new(self.epoch, details));
        self.epoch
    }

    pub(super) fn media_sink(&self, epoch: u64) -> MediaEventSink {
        MediaEventSink::new(epoch, self.event_tx.clone())
    }

    /// The active call, if `epoch` still identifies it.
    pub(super) fn active_for(&mut self, epoch: u64) -> Option<&mut ActiveCall> {
        self.active.as_mut().filter(|active| active.epoch == epoch)
    }

    pub(super) fn enter_ongoing(&mut self) {
        let period = self.config.duration_tick();
        let events = self.event_tx.clone();
        let Some(active) = self.active.as_mut() else {
            return;
        };

        active.live_since = Some((Instant::now(), Utc::now()));
        active.timer = Some(DurationTimer::start(active.epoch, period, events));
        let ongoing = active.ongoing_state();

        info!("Call with {} is live", ongoing.details.peer_id);
        self.publish(CallState::Ongoing(ongoing));
    }

    /// Republishes `Ongoing` after a payload change; no-op in any other state.
    pub(super) fn refresh_ongoing(&self) {
        if !matches!(*self.state_tx.borrow(), CallState::Ongoing(_)) {
            return;
        }
        if let Some(active) = &self.active {
            self.publish(CallState::Ongoing(active.ongoing_state()));
        }
    }

    /// Tears the active call down: stops in-flight work and timers, notifies
    /// the peer if asked, releases media, then records the call exactly once.
    pub(super) async fn terminate(&mut self, termination: Termination) {
        let Some(mut active) = self.active.take() else {
            return;
        };
        info!(
            "Ending call {} with {}: {} ({:?})",
            active.details.call_id,
            active.details.peer_id,
            termination.reason,
            termination.outcome
        );

        if let Some(task) = active.negotiation.take() {
            task.abort();
        }
        active.timer.take();

        if termination.notify_peer {
            let signal = ClientSignal::end_call(active.details.peer_id.clone());
            if let Err(e) = self.signaling.send(signal).await {
                warn!("Failed to notify {} of call end: {}", active.details.peer_id, e);
            }
        }

        let quality_label = self.monitor.current().to_string();
        self.monitor.stop();

        if let Some(media) = active.media.take() {
            if let Err(e) = media.close().await {
                warn!("Media session did not close cleanly: {}", e);
            }
        }

        self.publish(CallState::Ended(termination.reason.clone()));

        let record = active.into_record(termination.outcome, quality_label);
        if let Err(e) = self.recorder.record(record).await {
            error!("Failed to record call: {}", e);
        }

        if termination.fatal {
            self.publish(CallState::Error(termination.reason));
        } else {
            self.publish(CallState::Idle);
        }
    }

    async fn on_signaling_closed(&mut self) {
        self.signal_rx = None;
        warn!("Signaling inbox closed");

        if self.active.is_some() {
            self.terminate(
                Termination::failed("Signaling connection lost")
                    .without_notify()
                    .fatal(),
            )
            .await;
        }
    }

    async fn shutdown(&mut self) {
        if self.active.is_some() {
            let outcome = self.local_end_outcome();
            self.terminate(Termination::new(outcome, "Call ended")).await;
        }
        self.monitor.stop();
    }
}

async fn next_signal(rx: &mut Option<mpsc::Receiver<RelaySignal>>) -> Option<RelaySignal> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
