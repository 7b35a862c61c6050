use caller_core::{IncomingOffer, PeerId};
use tokio::sync::oneshot;

/// Requests the host sends to the call session.
#[derive(Debug)]
pub enum CallCommand {
    StartOutgoing {
        peer_id: PeerId,
        peer_name: String,
        peer_number: String,
        is_video: bool,
    },

    /// An offer handed over by the host instead of arriving on the signaling inbox.
    IncomingOffer(IncomingOffer),

    Answer,
    Reject,
    End,

    ToggleMute(bool),
    ToggleVideo(bool),
    ToggleSpeaker(bool),
    SwitchCamera,

    /// Forces the session back to `Idle`, ending any active call.
    Clear,

    /// Ends any active call and stops the session loop.
    Shutdown,
}

/// A command plus the acknowledgement sent once it has been fully processed.
pub(crate) struct CallRequest {
    pub command: CallCommand,
    pub ack: oneshot::Sender<()>,
}
