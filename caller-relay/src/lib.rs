mod config;
pub mod relay;

pub use config::RelayConfig;
pub use relay::{ConnectionId, RelayService, router, ws_handler};
