use crate::relay::RelayService;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use caller_core::{ClientSignal, PeerId, RelaySignal};
use futures::{SinkExt, StreamExt};
use std::sync::{Arc, OnceLock};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<RelayService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

async fn handle_socket(socket: WebSocket, service: RelayService) {
    let connection = service.open_connection();
    info!("New WebSocket connection: {:?}", connection);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<RelaySignal>();

    let mut send_task = tokio::spawn(async move {
        while let Some(signal) = rx.recv().await {
            let json = match serde_json::to_string(&signal) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize relay message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Set once by the first register message.
    let user: Arc<OnceLock<PeerId>> = Arc::default();

    let mut recv_task = tokio::spawn({
        let service = service.clone();
        let user = user.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientSignal>(&text) {
                        Ok(ClientSignal::Register { user_id }) if user.get().is_none() => {
                            service.register(user_id.clone(), connection, tx.clone());
                            let _ = user.set(user_id);
                        }
                        Ok(signal) => match user.get() {
                            Some(from) => {
                                service.route(from, signal);
                            }
                            None => warn!(
                                "Dropping {:?} from unregistered connection {:?}",
                                signal, connection
                            ),
                        },
                        Err(e) => warn!("Invalid ClientSignal on {:?}: {:?}", connection, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    if let Some(user_id) = user.get() {
        service.disconnect(user_id, connection);
    }
    info!("WebSocket disconnected: {:?}", connection);
}
