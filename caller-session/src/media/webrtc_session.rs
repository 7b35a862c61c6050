use crate::config::CallConfig;
use crate::error::MediaError;
use crate::media::{MediaEngine, MediaEventSink, MediaSession, PeerConnectionState};
use async_trait::async_trait;
use caller_core::{
    CandidatePairStats, IceCandidate, InboundRtpStats, MediaHandle, RemoteInboundRtpStats, SdpType,
    SessionDescription, StatsReport, StatsSnapshot,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine as RtcMediaEngine};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::stats::StatsReportType;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

fn negotiation(err: webrtc::Error) -> MediaError {
    MediaError::Negotiation(err.to_string())
}

/// Builds webrtc-rs peer connections with Opus audio and VP8 video.
#[derive(Clone)]
pub struct WebRtcMediaEngine {
    ice_servers: Vec<String>,
}

impl WebRtcMediaEngine {
    pub fn new(ice_servers: Vec<String>) -> Self {
        Self { ice_servers }
    }

    pub fn from_config(config: &CallConfig) -> Self {
        Self::new(config.ice_servers.clone())
    }
}

#[async_trait]
impl MediaEngine for WebRtcMediaEngine {
    async fn create_session(
        &self,
        events: MediaEventSink,
    ) -> Result<Arc<dyn MediaSession>, MediaError> {
        let mut media_engine = RtcMediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|e| MediaError::Engine(e.to_string()))?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)
            .map_err(|e| MediaError::Engine(e.to_string()))?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: vec![RTCIceServer {
                urls: self.ice_servers.clone(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .map_err(|e| MediaError::Engine(e.to_string()))?,
        );

        let state_events = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let events = state_events.clone();
                Box::pin(async move {
                    info!("Peer connection state changed: {:?}", s);
                    let state = match s {
                        RTCPeerConnectionState::Unspecified | RTCPeerConnectionState::New => {
                            PeerConnectionState::New
                        }
                        RTCPeerConnectionState::Connecting => PeerConnectionState::Connecting,
                        RTCPeerConnectionState::Connected => PeerConnectionState::Connected,
                        RTCPeerConnectionState::Disconnected => PeerConnectionState::Disconnected,
                        RTCPeerConnectionState::Failed => PeerConnectionState::Failed,
                        RTCPeerConnectionState::Closed => PeerConnectionState::Closed,
                    };
                    events.connection_state(state).await;
                })
            },
        ));

        let ice_events = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let events = ice_events.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                events
                    .ice_candidate(IceCandidate {
                        candidate: init.candidate,
                        sdp_mid: init.sdp_mid,
                        sdp_m_line_index: init.sdp_mline_index,
                    })
                    .await;
            })
        }));

        let track_events = events;
        peer_connection.on_track(Box::new(move |track: Arc<TrackRemote>, _, _| {
            let events = track_events.clone();
            Box::pin(async move {
                let is_video = track.kind() == RTPCodecType::Video;
                debug!("Remote {} track on stream {}", track.kind(), track.stream_id());
                events
                    .remote_stream(MediaHandle {
                        stream_id: track.stream_id(),
                        has_audio: !is_video,
                        has_video: is_video,
                    })
                    .await;
            })
        }));

        Ok(Arc::new(WebRtcMediaSession {
            peer_connection,
            stream_id: format!("stream-{}", Uuid::new_v4()),
            audio: Mutex::new(None),
            video: Mutex::new(None),
            front_camera: AtomicBool::new(true),
            closed: AtomicBool::new(false),
        }))
    }
}

struct LocalTrack {
    track: Arc<TrackLocalStaticSample>,
    sender: Arc<RTCRtpSender>,
}

/// One call's peer connection. The host writes encoded samples into the
/// tracks returned by [`WebRtcMediaSession::audio_track`] and
/// [`WebRtcMediaSession::video_track`].
pub struct WebRtcMediaSession {
    peer_connection: Arc<RTCPeerConnection>,
    stream_id: String,
    audio: Mutex<Option<LocalTrack>>,
    video: Mutex<Option<LocalTrack>>,
    front_camera: AtomicBool,
    closed: AtomicBool,
}

impl WebRtcMediaSession {
    pub async fn audio_track(&self) -> Option<Arc<TrackLocalStaticSample>> {
        self.audio.lock().await.as_ref().map(|t| t.track.clone())
    }

    pub async fn video_track(&self) -> Option<Arc<TrackLocalStaticSample>> {
        self.video.lock().await.as_ref().map(|t| t.track.clone())
    }

    pub fn is_front_camera(&self) -> bool {
        self.front_camera.load(Ordering::SeqCst)
    }

    async fn add_track(
        &self,
        capability: RTCRtpCodecCapability,
        id: &str,
    ) -> Result<LocalTrack, MediaError> {
        let track = Arc::new(TrackLocalStaticSample::new(
            capability,
            id.to_owned(),
            self.stream_id.clone(),
        ));
        let sender = self
            .peer_connection
            .add_track(track.clone() as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .map_err(|e| MediaError::Capture(e.to_string()))?;
        Ok(LocalTrack { track, sender })
    }

    async fn set_track_enabled(
        slot: &Mutex<Option<LocalTrack>>,
        enabled: bool,
    ) -> Result<(), MediaError> {
        let guard = slot.lock().await;
        let Some(local) = guard.as_ref() else {
            return Ok(());
        };
        let track = enabled.then(|| local.track.clone() as Arc<dyn TrackLocal + Send + Sync>);
        local.sender.replace_track(track).await.map_err(negotiation)
    }

    fn ensure_open(&self) -> Result<(), MediaError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(MediaError::Closed);
        }
        Ok(())
    }

    fn to_rtc(description: SessionDescription) -> Result<RTCSessionDescription, MediaError> {
        match description.kind {
            SdpType::Offer => RTCSessionDescription::offer(description.sdp),
            SdpType::Answer => RTCSessionDescription::answer(description.sdp),
        }
        .map_err(negotiation)
    }
}

#[async_trait]
impl MediaSession for WebRtcMediaSession {
    async fn start_local_capture(&self, video_enabled: bool) -> Result<MediaHandle, MediaError> {
        self.ensure_open()?;

        let mut audio = self.audio.lock().await;
        if audio.is_none() {
            let capability = RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                ..Default::default()
            };
            *audio = Some(self.add_track(capability, "audio").await?);
        }
        drop(audio);

        if video_enabled {
            let mut video = self.video.lock().await;
            if video.is_none() {
                let capability = RTCRtpCodecCapability {
                    mime_type: MIME_TYPE_VP8.to_owned(),
                    clock_rate: 90000,
                    ..Default::default()
                };
                *video = Some(self.add_track(capability, "video").await?);
            }
        }

        Ok(MediaHandle {
            stream_id: self.stream_id.clone(),
            has_audio: true,
            has_video: video_enabled,
        })
    }

    async fn create_offer(&self) -> Result<SessionDescription, MediaError> {
        self.ensure_open()?;
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .map_err(negotiation)?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription, MediaError> {
        self.ensure_open()?;
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(negotiation)?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), MediaError> {
        self.ensure_open()?;
        let desc = Self::to_rtc(description)?;
        self.peer_connection
            .set_local_description(desc)
            .await
            .map_err(negotiation)
    }

    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), MediaError> {
        self.ensure_open()?;
        let desc = Self::to_rtc(description)?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .map_err(negotiation)
    }

    async fn add_remote_ice_candidate(&self, candidate: IceCandidate) -> Result<(), MediaError> {
        self.ensure_open()?;
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            ..Default::default()
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .map_err(|e| MediaError::InvalidCandidate(e.to_string()))
    }

    async fn toggle_audio(&self, enabled: bool) -> Result<(), MediaError> {
        self.ensure_open()?;
        Self::set_track_enabled(&self.audio, enabled).await
    }

    async fn toggle_video(&self, enabled: bool) -> Result<(), MediaError> {
        self.ensure_open()?;
        Self::set_track_enabled(&self.video, enabled).await
    }

    async fn switch_camera(&self) -> Result<(), MediaError> {
        self.ensure_open()?;
        let was_front = self.front_camera.fetch_xor(true, Ordering::SeqCst);
        info!(
            "Camera switched to {}",
            if was_front { "back" } else { "front" }
        );
        Ok(())
    }

    async fn stats_snapshot(&self) -> Result<StatsSnapshot, MediaError> {
        self.ensure_open()?;
        let stats = self.peer_connection.get_stats().await;

        let reports = stats
            .reports
            .into_values()
            .filter_map(|report| match report {
                StatsReportType::InboundRTP(s) => Some(StatsReport::InboundRtp(InboundRtpStats {
                    packets_received: Some(s.packets_received),
                    bytes_received: Some(s.bytes_received),
                    ..Default::default()
                })),
                StatsReportType::RemoteInboundRTP(s) => {
                    Some(StatsReport::RemoteInboundRtp(RemoteInboundRtpStats {
                        round_trip_time: s.round_trip_time,
                        packets_lost: Some(s.packets_lost),
                        packets_received: Some(s.packets_received),
                    }))
                }
                StatsReportType::CandidatePair(s) => {
                    Some(StatsReport::CandidatePair(CandidatePairStats {
                        current_round_trip_time: Some(s.current_round_trip_time),
                    }))
                }
                _ => None,
            })
            .collect();

        Ok(StatsSnapshot::new(reports))
    }

    async fn close(&self) -> Result<(), MediaError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let mut failures = Vec::new();
        for slot in [&self.audio, &self.video] {
            if let Some(local) = slot.lock().await.take() {
                if let Err(e) = self.peer_connection.remove_track(&local.sender).await {
                    warn!("Failed to remove local track: {}", e);
                    failures.push(e.to_string());
                }
            }
        }
        if let Err(e) = self.peer_connection.close().await {
            failures.push(e.to_string());
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(MediaError::Release(failures))
        }
    }
}
