use caller_session::{
    CallConfig, CallLogRecorder, CallManager, MediaEngine, SignalingConfig, SignalingError,
    WsSignalingClient,
};
use std::sync::Arc;
use tokio::task::JoinHandle;

pub use caller_core::model::{CallState, PeerId};

pub mod model {
    pub use caller_core::model::*;
}

pub mod session {
    pub use caller_session::*;
}

#[cfg(feature = "relay")]
pub mod relay {
    pub use caller_relay::*;
}

/// Connects to the relay as `user_id` and starts a call session fed by it.
///
/// The session moves to `Error` if the relay connection is lost for good
/// during a call.
pub async fn connect(
    user_id: impl Into<PeerId>,
    signaling: SignalingConfig,
    config: CallConfig,
    engine: Arc<dyn MediaEngine>,
    recorder: Arc<dyn CallLogRecorder>,
) -> Result<(CallManager, WsSignalingClient, JoinHandle<()>), SignalingError> {
    let (client, inbox) = WsSignalingClient::new(signaling);
    client.connect(user_id.into()).await?;

    let (manager, task) =
        CallManager::start(config, engine, Arc::new(client.clone()), inbox, recorder);
    Ok((manager, client, task))
}
