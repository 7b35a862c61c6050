mod call;
mod peer;
mod quality;
mod record;
mod signaling;
mod stats;

pub use call::{CallDetails, CallId, CallState, MediaHandle, OngoingState};
pub use peer::{PeerId, RoomId};
pub use quality::{ConnectionQuality, QualityMetrics};
pub use record::{CallDirection, CallOutcome, CallRecord, CallType};
pub use signaling::{
    ClientSignal, IceCandidate, IncomingOffer, RelaySignal, SdpType, SessionDescription,
};
pub use stats::{
    CandidatePairStats, InboundRtpStats, RemoteInboundRtpStats, StatsReport, StatsSnapshot,
};
