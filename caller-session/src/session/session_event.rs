use crate::error::SessionError;
use crate::media::MediaEvent;
use caller_core::MediaHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NegotiationStep {
    Offer,
    Answer,
}

/// Internal mailbox traffic. Every variant carries the epoch of the call that
/// produced it; the session drops anything from an older call.
#[derive(Debug)]
pub(crate) enum SessionEvent {
    Media {
        epoch: u64,
        event: MediaEvent,
    },

    /// A negotiation task finished; `Ok` carries the local media it captured.
    Negotiated {
        epoch: u64,
        step: NegotiationStep,
        result: Result<MediaHandle, SessionError>,
    },

    Tick {
        epoch: u64,
    },
}

impl SessionEvent {
    pub fn epoch(&self) -> u64 {
        match self {
            Self::Media { epoch, .. } | Self::Negotiated { epoch, .. } | Self::Tick { epoch } => {
                *epoch
            }
        }
    }
}
