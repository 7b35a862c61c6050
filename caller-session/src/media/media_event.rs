use crate::session::SessionEvent;
use caller_core::{IceCandidate, MediaHandle};
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl PeerConnectionState {
    /// States after which the call cannot carry media any more.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Failed | Self::Closed)
    }
}

/// Events the media session raises for the call session.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// A local ICE candidate to trickle to the peer.
    IceCandidate(IceCandidate),

    /// The peer's media arrived.
    RemoteStream(MediaHandle),

    ConnectionState(PeerConnectionState),
}

/// Callback target handed to a media session when it is created.
///
/// Every event is stamped with the session it belongs to, so events raised by a
/// session that has since been closed are recognised and dropped.
#[derive(Clone)]
pub struct MediaEventSink {
    epoch: u64,
    tx: mpsc::Sender<SessionEvent>,
}

impl MediaEventSink {
    pub(crate) fn new(epoch: u64, tx: mpsc::Sender<SessionEvent>) -> Self {
        Self { epoch, tx }
    }

    pub async fn emit(&self, event: MediaEvent) {
        let event = SessionEvent::Media {
            epoch: self.epoch,
            event,
        };
        if self.tx.send(event).await.is_err() {
            debug!("Call session gone, media event dropped");
        }
    }

    pub async fn ice_candidate(&self, candidate: IceCandidate) {
        self.emit(MediaEvent::IceCandidate(candidate)).await;
    }

    pub async fn remote_stream(&self, handle: MediaHandle) {
        self.emit(MediaEvent::RemoteStream(handle)).await;
    }

    pub async fn connection_state(&self, state: PeerConnectionState) {
        self.emit(MediaEvent::ConnectionState(state)).await;
    }
}
