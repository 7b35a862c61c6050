use crate::model::peer::PeerId;
use crate::model::record::{CallDirection, CallType};
use crate::model::signaling::IncomingOffer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
pub struct CallId(pub Uuid);

impl CallId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who the call is with and what kind of call it is. Fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallDetails {
    pub call_id: CallId,
    pub peer_id: PeerId,
    pub peer_name: String,
    pub peer_number: String,
    pub is_video: bool,
    pub is_outgoing: bool,
}

impl CallDetails {
    pub fn outgoing(
        peer_id: PeerId,
        peer_name: impl Into<String>,
        peer_number: impl Into<String>,
        is_video: bool,
    ) -> Self {
        Self {
            call_id: CallId::new(),
            peer_id,
            peer_name: peer_name.into(),
            peer_number: peer_number.into(),
            is_video,
            is_outgoing: true,
        }
    }

    /// The relay only knows the caller by id, so the id doubles as the number.
    pub fn incoming(offer: &IncomingOffer) -> Self {
        Self {
            call_id: CallId::new(),
            peer_id: offer.from.clone(),
            peer_name: offer.caller_name.clone(),
            peer_number: offer.from.to_string(),
            is_video: offer.is_video,
            is_outgoing: false,
        }
    }

    pub fn call_type(&self) -> CallType {
        if self.is_video {
            CallType::Video
        } else {
            CallType::Audio
        }
    }

    pub fn direction(&self) -> CallDirection {
        if self.is_outgoing {
            CallDirection::Outgoing
        } else {
            CallDirection::Incoming
        }
    }
}

/// Opaque reference to a media stream owned by the media session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaHandle {
    pub stream_id: String,
    pub has_audio: bool,
    pub has_video: bool,
}

/// Payload of a live call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OngoingState {
    pub details: CallDetails,
    /// Milliseconds since the call went live.
    pub duration_ms: u64,
    pub local_media: Option<MediaHandle>,
    /// May arrive after negotiation completes.
    pub remote_media: Option<MediaHandle>,
}

impl OngoingState {
    pub fn new(
        details: CallDetails,
        local_media: Option<MediaHandle>,
        remote_media: Option<MediaHandle>,
    ) -> Self {
        Self {
            details,
            duration_ms: 0,
            local_media,
            remote_media,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "data")]
pub enum CallState {
    #[default]
    Idle,
    /// Offer received, waiting for the local user to accept or reject.
    Incoming(CallDetails),
    /// Local offer being prepared and sent.
    Dialing(CallDetails),
    /// Offer delivered, waiting for the peer to answer.
    Ringing(CallDetails),
    Ongoing(OngoingState),
    /// Transient; the session returns to `Idle` right after.
    Ended(String),
    /// Stays until the host clears it.
    Error(String),
}

impl CallState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// True while a call occupies the single call slot.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Incoming(_) | Self::Dialing(_) | Self::Ringing(_) | Self::Ongoing(_)
        )
    }

    pub fn details(&self) -> Option<&CallDetails> {
        match self {
            Self::Incoming(details) | Self::Dialing(details) | Self::Ringing(details) => {
                Some(details)
            }
            Self::Ongoing(ongoing) => Some(&ongoing.details),
            Self::Idle | Self::Ended(_) | Self::Error(_) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Incoming(_) => "incoming",
            Self::Dialing(_) => "dialing",
            Self::Ringing(_) => "ringing",
            Self::Ongoing(_) => "ongoing",
            Self::Ended(_) => "ended",
            Self::Error(_) => "error",
        }
    }
}
