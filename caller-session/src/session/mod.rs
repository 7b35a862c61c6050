mod call_command;
mod call_manager;
mod call_session;
mod dispatch;
mod duration_timer;
mod negotiation;
mod session_event;

pub use call_command::CallCommand;
pub use call_manager::CallManager;
pub(crate) use session_event::SessionEvent;

/// Local media toggles, observable next to the call state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MediaFlags {
    pub muted: bool,
    pub video_enabled: bool,
    pub speaker_on: bool,
}

impl MediaFlags {
    /// Flags every new call starts with.
    pub fn for_call(is_video: bool) -> Self {
        Self {
            muted: false,
            video_enabled: is_video,
            speaker_on: is_video,
        }
    }
}
