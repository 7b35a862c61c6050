use crate::model::peer::{PeerId, RoomId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpType::Answer,
            sdp: sdp.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_m_line_index: Option<u16>,
}

/// An offer addressed to us, as handed to the call session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingOffer {
    pub from: PeerId,
    pub caller_name: String,
    pub is_video: bool,
    pub description: SessionDescription,
    pub room_id: Option<RoomId>,
}

/// Messages a client sends to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientSignal {
    #[serde(rename_all = "camelCase")]
    Register { user_id: PeerId },

    #[serde(rename_all = "camelCase")]
    JoinRoom { room_id: RoomId },

    #[serde(rename_all = "camelCase")]
    LeaveRoom { room_id: RoomId },

    #[serde(rename_all = "camelCase")]
    Offer {
        to: PeerId,
        caller_name: String,
        is_video: bool,
        #[serde(rename = "type")]
        kind: SdpType,
        sdp: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<RoomId>,
    },

    #[serde(rename_all = "camelCase")]
    Answer {
        to: PeerId,
        #[serde(rename = "type")]
        kind: SdpType,
        sdp: String,
    },

    #[serde(rename_all = "camelCase")]
    IceCandidate {
        to: PeerId,
        candidate: String,
        sdp_mid: Option<String>,
        sdp_m_line_index: Option<u16>,
    },

    #[serde(rename_all = "camelCase")]
    EndCall { to: PeerId },
}

impl ClientSignal {
    pub fn offer(
        to: PeerId,
        caller_name: impl Into<String>,
        is_video: bool,
        description: SessionDescription,
    ) -> Self {
        Self::Offer {
            to,
            caller_name: caller_name.into(),
            is_video,
            kind: description.kind,
            sdp: description.sdp,
            room_id: None,
        }
    }

    pub fn answer(to: PeerId, description: SessionDescription) -> Self {
        Self::Answer {
            to,
            kind: description.kind,
            sdp: description.sdp,
        }
    }

    pub fn ice_candidate(to: PeerId, candidate: IceCandidate) -> Self {
        Self::IceCandidate {
            to,
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_m_line_index: candidate.sdp_m_line_index,
        }
    }

    pub fn end_call(to: PeerId) -> Self {
        Self::EndCall { to }
    }

    /// Addressee of a peer-to-peer message; `None` for relay bookkeeping messages.
    pub fn recipient(&self) -> Option<&PeerId> {
        match self {
            Self::Offer { to, .. }
            | Self::Answer { to, .. }
            | Self::IceCandidate { to, .. }
            | Self::EndCall { to } => Some(to),
            Self::Register { .. } | Self::JoinRoom { .. } | Self::LeaveRoom { .. } => None,
        }
    }

    /// Rewrites an outbound peer message into what the recipient receives.
    pub fn into_relayed(self, from: PeerId) -> Option<RelaySignal> {
        match self {
            Self::Offer {
                caller_name,
                is_video,
                kind,
                sdp,
                room_id,
                ..
            } => Some(RelaySignal::Offer {
                from,
                caller_name,
                is_video,
                kind,
                sdp,
                room_id,
            }),
            Self::Answer { kind, sdp, .. } => Some(RelaySignal::Answer { from, kind, sdp }),
            Self::IceCandidate {
                candidate,
                sdp_mid,
                sdp_m_line_index,
                ..
            } => Some(RelaySignal::IceCandidate {
                from,
                candidate,
                sdp_mid,
                sdp_m_line_index,
            }),
            Self::EndCall { .. } => Some(RelaySignal::CallEnded { user_id: from }),
            Self::Register { .. } | Self::JoinRoom { .. } | Self::LeaveRoom { .. } => None,
        }
    }
}

/// Messages the relay delivers to a client, keyed by sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum RelaySignal {
    #[serde(rename_all = "camelCase")]
    Offer {
        from: PeerId,
        caller_name: String,
        is_video: bool,
        #[serde(rename = "type")]
        kind: SdpType,
        sdp: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<RoomId>,
    },

    #[serde(rename_all = "camelCase")]
    Answer {
        from: PeerId,
        #[serde(rename = "type")]
        kind: SdpType,
        sdp: String,
    },

    #[serde(rename_all = "camelCase")]
    IceCandidate {
        from: PeerId,
        candidate: String,
        sdp_mid: Option<String>,
        sdp_m_line_index: Option<u16>,
    },

    #[serde(rename_all = "camelCase")]
    CallEnded { user_id: PeerId },
}

impl RelaySignal {
    pub fn sender(&self) -> &PeerId {
        match self {
            Self::Offer { from, .. }
            | Self::Answer { from, .. }
            | Self::IceCandidate { from, .. } => from,
            Self::CallEnded { user_id } => user_id,
        }
    }
}
