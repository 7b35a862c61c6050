use clap::Parser;
use std::net::SocketAddr;

/// Signaling relay for caller clients.
#[derive(Debug, Clone, Parser)]
#[command(name = "caller-relay", version)]
pub struct RelayConfig {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Path the WebSocket endpoint is served on.
    #[arg(long, default_value = "/ws")]
    pub ws_path: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            ws_path: "/ws".to_owned(),
        }
    }
}
