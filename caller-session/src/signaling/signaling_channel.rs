use crate::error::SignalingError;
use async_trait::async_trait;
use caller_core::ClientSignal;

/// Outbound half of the signaling transport, as seen by the call session.
#[async_trait]
pub trait SignalingChannel: Send + Sync {
    /// Hands the signal to the relay. Delivery to the peer is not confirmed.
    async fn send(&self, signal: ClientSignal) -> Result<(), SignalingError>;
}
