mod relay_service;
mod ws_handler;

pub use relay_service::{ConnectionId, RelayService};
pub use ws_handler::ws_handler;

use axum::Router;
use axum::routing::get;

/// Router serving the signaling WebSocket at `path`.
pub fn router(service: RelayService, path: &str) -> Router {
    Router::new()
        .route(path, get(ws_handler))
        .with_state(service)
}
