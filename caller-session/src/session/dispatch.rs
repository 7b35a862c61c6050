use crate::media::{MediaEvent, MediaSession, PeerConnectionState};
use crate::session::SessionEvent;
use crate::session::call_command::CallCommand;
use crate::session::call_session::{CallSession, Termination};
use crate::session::negotiation::Negotiation;
use crate::session::session_event::NegotiationStep;
use caller_core::{
    CallDetails, CallOutcome, CallState, ClientSignal, IceCandidate, IncomingOffer, MediaHandle,
    PeerId, RelaySignal, SdpType, SessionDescription,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

impl CallSession {
    pub(super) async fn handle_command(&mut self, cmd: CallCommand) {
        match cmd {
            CallCommand::StartOutgoing {
                peer_id,
                peer_name,
                peer_number,
                is_video,
            } => {
                let details = CallDetails::outgoing(peer_id, peer_name, peer_number, is_video);
                self.start_outgoing(details).await;
            }

            CallCommand::IncomingOffer(offer) => self.handle_incoming_offer(offer).await,

            CallCommand::Answer => self.answer().await,

            CallCommand::Reject => {
                if self.state().is_active() {
                    self.terminate(Termination::new(CallOutcome::Rejected, "Call rejected"))
                        .await;
                }
            }

            CallCommand::End => {
                if self.state().is_active() {
                    let outcome = self.local_end_outcome();
                    self.terminate(Termination::new(outcome, "Call ended")).await;
                }
            }

            CallCommand::ToggleMute(muted) => {
                self.flags_tx.send_modify(|f| f.muted = muted);
                if let Some(media) = self.current_media() {
                    if let Err(e) = media.toggle_audio(!muted).await {
                        warn!("Failed to toggle audio: {}", e);
                    }
                }
            }

            CallCommand::ToggleVideo(enabled) => {
                self.flags_tx.send_modify(|f| f.video_enabled = enabled);
                if let Some(media) = self.current_media() {
                    if let Err(e) = media.toggle_video(enabled).await {
                        warn!("Failed to toggle video: {}", e);
                    }
                }
            }

            CallCommand::ToggleSpeaker(on) => {
                self.flags_tx.send_modify(|f| f.speaker_on = on);
                if let Some(media) = self.current_media() {
                    if let Err(e) = media.set_speaker(on).await {
                        warn!("Failed to route audio: {}", e);
                    }
                }
            }

            CallCommand::SwitchCamera => {
                if let Some(media) = self.current_media() {
                    if let Err(e) = media.switch_camera().await {
                        warn!("Failed to switch camera: {}", e);
                    }
                }
            }

            CallCommand::Clear => {
                if self.state().is_active() {
                    let outcome = self.local_end_outcome();
                    self.terminate(Termination::new(outcome, "Call ended")).await;
                }
                if !self.state().is_idle() {
                    self.publish(CallState::Idle);
                }
            }

            // Handled by the run loop.
            CallCommand::Shutdown => {}
        }
    }

    pub(super) async fn handle_signal(&mut self, signal: RelaySignal) {
        match signal {
            RelaySignal::Offer {
                from,
                caller_name,
                is_video,
                kind,
                sdp,
                room_id,
            } => {
                let offer = IncomingOffer {
                    from,
                    caller_name,
                    is_video,
                    description: SessionDescription { kind, sdp },
                    room_id,
                };
                self.handle_incoming_offer(offer).await;
            }

            RelaySignal::Answer { from, kind, sdp } => {
                self.handle_remote_answer(from, SessionDescription { kind, sdp })
                    .await;
            }

            RelaySignal::IceCandidate {
                from,
                candidate,
                sdp_mid,
                sdp_m_line_index,
            } => {
                let candidate = IceCandidate {
                    candidate,
                    sdp_mid,
                    sdp_m_line_index,
                };
                self.handle_remote_candidate(from, candidate).await;
            }

            RelaySignal::CallEnded { user_id } => {
                if !self.is_current_peer(&user_id) {
                    debug!("Ignoring call-ended from {}", user_id);
                    return;
                }
                let outcome = self.remote_end_outcome();
                self.terminate(Termination::new(outcome, "Call ended").without_notify())
                    .await;
            }
        }
    }

    pub(super) async fn handle_event(&mut self, event: SessionEvent) {
        let epoch = event.epoch();
        if self.active_for(epoch).is_none() {
            debug!("Dropping stale event from call epoch {}", epoch);
            return;
        }

        match event {
            SessionEvent::Media { event, .. } => self.handle_media_event(event).await,

            SessionEvent::Negotiated { step, result, .. } => {
                if let Some(active) = self.active.as_mut() {
                    active.negotiation = None;
                }

                match (step, result) {
                    (NegotiationStep::Offer, Ok(local)) => self.on_offer_sent(local),
                    (NegotiationStep::Answer, Ok(local)) => {
                        if let Some(active) = self.active.as_mut() {
                            active.local_media = Some(local);
                        }
                        self.enter_ongoing();
                    }
                    (NegotiationStep::Offer, Err(e)) => {
                        // The offer never reached the peer.
                        let reason = format!("Failed to start call: {e}");
                        self.terminate(Termination::failed(reason).without_notify())
                            .await;
                    }
                    (NegotiationStep::Answer, Err(e)) => {
                        let reason = format!("Failed to answer call: {e}");
                        self.terminate(Termination::failed(reason)).await;
                    }
                }
            }

            SessionEvent::Tick { .. } => self.refresh_ongoing(),
        }
    }

    async fn start_outgoing(&mut self, details: CallDetails) {
        let state = self.state();
        if !state.is_idle() {
            warn!(
                "Cannot call {} while {}; request rejected",
                details.peer_id,
                state.name()
            );
            return;
        }

        info!("Calling {} (video: {})", details.peer_id, details.is_video);
        let epoch = self.begin_call(details.clone());
        self.publish(CallState::Dialing(details.clone()));

        let media = match self.engine.create_session(self.media_sink(epoch)).await {
            Ok(media) => media,
            Err(e) => {
                let reason = format!("Failed to start call: {e}");
                self.terminate(Termination::failed(reason).without_notify())
                    .await;
                return;
            }
        };

        let negotiation = Negotiation {
            epoch,
            media: media.clone(),
            signaling: self.signaling.clone(),
            peer_id: details.peer_id,
            is_video: details.is_video,
            events: self.event_tx.clone(),
        };
        let caller_name = self.config.display_name.clone();
        let task = tokio::spawn(negotiation.send_offer(caller_name));

        if let Some(active) = self.active.as_mut() {
            active.media = Some(media);
            active.negotiation = Some(task);
        }
    }

    fn on_offer_sent(&mut self, local: MediaHandle) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        active.local_media = Some(local);
        let details = active.details.clone();

        match self.state() {
            CallState::Dialing(_) => self.publish(CallState::Ringing(details)),
            // The answer overtook the offer completion.
            CallState::Ongoing(_) => self.refresh_ongoing(),
            _ => {}
        }
    }

    async fn handle_incoming_offer(&mut self, offer: IncomingOffer) {
        if let Some(active) = &self.active {
            if active.details.peer_id == offer.from {
                debug!("Duplicate offer from {}", offer.from);
                return;
            }
            info!("Busy; turning away call from {}", offer.from);
            if let Err(e) = self.signaling.send(ClientSignal::end_call(offer.from)).await {
                warn!("Failed to send busy response: {}", e);
            }
            return;
        }

        if let CallState::Error(message) = self.state() {
            warn!(
                "Ignoring offer from {} while in error: {}",
                offer.from, message
            );
            return;
        }

        if offer.description.kind != SdpType::Offer {
            warn!("Offer from {} carries a non-offer description", offer.from);
            return;
        }

        let details = CallDetails::incoming(&offer);
        info!(
            "Incoming {} call from {}",
            if details.is_video { "video" } else { "audio" },
            details.peer_id
        );
        let epoch = self.begin_call(details.clone());

        let media = match self.engine.create_session(self.media_sink(epoch)).await {
            Ok(media) => media,
            Err(e) => {
                let reason = format!("Failed to accept offer: {e}");
                self.terminate(Termination::failed(reason)).await;
                return;
            }
        };
        if let Some(active) = self.active.as_mut() {
            active.media = Some(media.clone());
        }

        if let Err(e) = media.set_remote_description(offer.description).await {
            let reason = format!("Failed to accept offer: {e}");
            self.terminate(Termination::failed(reason)).await;
            return;
        }

        self.publish(CallState::Incoming(details));
    }

    async fn answer(&mut self) {
        if !matches!(self.state(), CallState::Incoming(_)) {
            debug!("No incoming call to answer");
            return;
        }
        let signaling = self.signaling.clone();
        let events = self.event_tx.clone();
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if active.negotiation.is_some() {
            debug!("Answer already in progress");
            return;
        }
        let Some(media) = active.media.clone() else {
            return;
        };

        info!("Answering call from {}", active.details.peer_id);
        active.answered = true;
        let negotiation = Negotiation {
            epoch: active.epoch,
            media,
            signaling,
            peer_id: active.details.peer_id.clone(),
            is_video: active.details.is_video,
            events,
        };
        active.negotiation = Some(tokio::spawn(negotiation.send_answer()));
    }

    async fn handle_remote_answer(&mut self, from: PeerId, description: SessionDescription) {
        if !self.is_current_peer(&from) {
            warn!("Ignoring answer from {}; not the current peer", from);
            return;
        }
        if !matches!(
            self.state(),
            CallState::Dialing(_) | CallState::Ringing(_)
        ) {
            debug!("Ignoring answer from {} in state {}", from, self.state().name());
            return;
        }
        if description.kind != SdpType::Answer {
            warn!("Answer from {} carries a non-answer description", from);
            return;
        }
        let Some(media) = self.current_media() else {
            return;
        };

        if let Err(e) = media.set_remote_description(description).await {
            self.terminate(Termination::failed(format!("Connection failed: {e}")))
                .await;
            return;
        }

        self.enter_ongoing();
    }

    async fn handle_remote_candidate(&mut self, from: PeerId, candidate: IceCandidate) {
        if !self.is_current_peer(&from) {
            debug!("Ignoring ICE candidate from {}", from);
            return;
        }
        let Some(media) = self.current_media() else {
            return;
        };
        if let Err(e) = media.add_remote_ice_candidate(candidate).await {
            warn!("Failed to add ICE candidate from {}: {}", from, e);
        }
    }

    async fn handle_media_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::IceCandidate(candidate) => {
                let Some(peer_id) = self.active.as_ref().map(|a| a.details.peer_id.clone()) else {
                    return;
                };
                if let Err(e) = self
                    .signaling
                    .send(ClientSignal::ice_candidate(peer_id, candidate))
                    .await
                {
                    warn!("Failed to send ICE candidate: {}", e);
                }
            }

            MediaEvent::RemoteStream(handle) => {
                if let Some(active) = self.active.as_mut() {
                    active.remote_media = Some(merge_remote(active.remote_media.take(), handle));
                }
                self.refresh_ongoing();
            }

            MediaEvent::ConnectionState(state) => self.on_connection_state(state).await,
        }
    }

    async fn on_connection_state(&mut self, state: PeerConnectionState) {
        debug!("Peer connection state: {:?}", state);

        if state == PeerConnectionState::Connected {
            if let Some(media) = self.current_media() {
                self.monitor.start(media);
            }
            return;
        }

        if state.is_terminal() && self.state().is_active() {
            // terminate reads the last rating before stopping the monitor.
            self.terminate(Termination::failed("Connection failed")).await;
        } else {
            self.monitor.stop();
        }
    }

    fn current_media(&self) -> Option<Arc<dyn MediaSession>> {
        self.active.as_ref().and_then(|a| a.media.clone())
    }

    fn is_current_peer(&self, peer_id: &PeerId) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| &a.details.peer_id == peer_id)
    }
}

/// Tracks arriving one at a time for the same stream widen the handle.
fn merge_remote(current: Option<MediaHandle>, incoming: MediaHandle) -> MediaHandle {
    match current {
        Some(existing) if existing.stream_id == incoming.stream_id => MediaHandle {
            stream_id: existing.stream_id,
            has_audio: existing.has_audio || incoming.has_audio,
            has_video: existing.has_video || incoming.has_video,
        },
        _ => incoming,
    }
}
