mod signaling_channel;
mod ws_client;

pub use signaling_channel::SignalingChannel;
pub use ws_client::{ConnectionStatus, WsSignalingClient};
