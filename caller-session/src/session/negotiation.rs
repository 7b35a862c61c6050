//! Offer/answer handshakes, run off the session loop.

use crate::error::SessionError;
use crate::media::MediaSession;
use crate::session::SessionEvent;
use crate::session::session_event::NegotiationStep;
use crate::signaling::SignalingChannel;
use caller_core::{ClientSignal, MediaHandle, PeerId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

pub(crate) struct Negotiation {
    pub epoch: u64,
    pub media: Arc<dyn MediaSession>,
    pub signaling: Arc<dyn SignalingChannel>,
    pub peer_id: PeerId,
    pub is_video: bool,
    pub events: mpsc::Sender<SessionEvent>,
}

impl Negotiation {
    /// Capture, create and apply the offer, then send it.
    pub async fn send_offer(self, caller_name: String) {
        let result = self.offer(caller_name).await;
        self.report(NegotiationStep::Offer, result).await;
    }

    /// Capture, create and apply the answer, then send it.
    pub async fn send_answer(self) {
        let result = self.answer().await;
        self.report(NegotiationStep::Answer, result).await;
    }

    async fn offer(&self, caller_name: String) -> Result<MediaHandle, SessionError> {
        let local = self.media.start_local_capture(self.is_video).await?;
        let offer = self.media.create_offer().await?;
        self.media.set_local_description(offer.clone()).await?;
        self.signaling
            .send(ClientSignal::offer(
                self.peer_id.clone(),
                caller_name,
                self.is_video,
                offer,
            ))
            .await?;
        Ok(local)
    }

    async fn answer(&self) -> Result<MediaHandle, SessionError> {
        let local = self.media.start_local_capture(self.is_video).await?;
        let answer = self.media.create_answer().await?;
        self.media.set_local_description(answer.clone()).await?;
        self.signaling
            .send(ClientSignal::answer(self.peer_id.clone(), answer))
            .await?;
        Ok(local)
    }

    async fn report(&self, step: NegotiationStep, result: Result<MediaHandle, SessionError>) {
        let event = SessionEvent::Negotiated {
            epoch: self.epoch,
            step,
            result,
        };
        if self.events.send(event).await.is_err() {
            debug!("Call session gone, {:?} result dropped", step);
        }
    }
}
