use crate::config::SignalingConfig;
use crate::error::SignalingError;
use crate::signaling::SignalingChannel;
use async_trait::async_trait;
use caller_core::{ClientSignal, PeerId, RelaySignal, RoomId};
use futures::{SinkExt, StreamExt};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, RwLock, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    /// The client gave up or was shut down; the inbox is closed.
    Closed,
}

struct ClientInner {
    config: SignalingConfig,
    rooms: RwLock<BTreeSet<RoomId>>,
    outbound: RwLock<Option<mpsc::UnboundedSender<Message>>>,
    status_tx: watch::Sender<ConnectionStatus>,
    inbox: Mutex<Option<mpsc::Sender<RelaySignal>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// WebSocket client for the signaling relay.
///
/// Keeps the connection alive in a background task, announces the user and
/// rejoins remembered rooms after every reconnect, and pushes decoded relay
/// messages into the inbox returned by [`WsSignalingClient::new`]. The inbox
/// closes once the client gives up or is disconnected.
#[derive(Clone)]
pub struct WsSignalingClient {
    inner: Arc<ClientInner>,
}

impl WsSignalingClient {
    pub fn new(config: SignalingConfig) -> (Self, mpsc::Receiver<RelaySignal>) {
        let (inbox_tx, inbox_rx) = mpsc::channel(config.inbox_capacity.max(1));
        let (status_tx, _) = watch::channel(ConnectionStatus::Disconnected);

        let client = Self {
            inner: Arc::new(ClientInner {
                config,
                rooms: RwLock::new(BTreeSet::new()),
                outbound: RwLock::new(None),
                status_tx,
                inbox: Mutex::new(Some(inbox_tx)),
                task: Mutex::new(None),
            }),
        };

        (client, inbox_rx)
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.inner.status_tx.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.status_tx.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    /// Starts the connection loop for `user_id` and waits for the first
    /// successful registration, or for the loop to give up.
    pub async fn connect(&self, user_id: PeerId) -> Result<(), SignalingError> {
        {
            let mut task = self.inner.task.lock().await;
            if task.as_ref().is_some_and(|t| !t.is_finished()) {
                debug!("Signaling loop already running");
            } else {
                let inbox = self.inner.inbox.lock().await.take().ok_or_else(|| {
                    SignalingError::Transport("signaling client was shut down".to_owned())
                })?;
                self.inner.status_tx.send_replace(ConnectionStatus::Connecting);
                *task = Some(tokio::spawn(run_loop(self.inner.clone(), user_id, inbox)));
            }
        }

        let mut status = self.subscribe_status();
        let reached = status
            .wait_for(|s| matches!(s, ConnectionStatus::Connected | ConnectionStatus::Closed))
            .await
            .map(|s| *s)
            .unwrap_or(ConnectionStatus::Closed);

        match reached {
            ConnectionStatus::Connected => Ok(()),
            _ => Err(SignalingError::NotConnected),
        }
    }

    /// Leaves joined rooms, closes the socket and stops reconnecting.
    pub async fn disconnect(&self) {
        let rooms: Vec<RoomId> = std::mem::take(&mut *self.inner.rooms.write().await)
            .into_iter()
            .collect();
        for room_id in rooms {
            if let Err(e) = self.send(ClientSignal::LeaveRoom { room_id }).await {
                debug!("Leave on disconnect not sent: {}", e);
            }
        }

        if let Some(tx) = self.inner.outbound.write().await.take() {
            let _ = tx.send(Message::Close(None));
        }

        if let Some(task) = self.inner.task.lock().await.take() {
            task.abort();
            let _ = task.await;
        }

        // The loop may never have started; the inbox must close either way.
        self.inner.inbox.lock().await.take();
        self.inner.status_tx.send_replace(ConnectionStatus::Closed);
        info!("Signaling client disconnected");
    }

    /// Joins `room_id` now if connected, and again after every reconnect.
    pub async fn join_room(&self, room_id: RoomId) -> Result<(), SignalingError> {
        self.inner.rooms.write().await.insert(room_id.clone());
        self.send(ClientSignal::JoinRoom { room_id }).await
    }

    pub async fn leave_room(&self, room_id: RoomId) -> Result<(), SignalingError> {
        self.inner.rooms.write().await.remove(&room_id);
        self.send(ClientSignal::LeaveRoom { room_id }).await
    }

    async fn send_message(&self, message: Message) -> Result<(), SignalingError> {
        let outbound = self.inner.outbound.read().await;
        let tx = outbound.as_ref().ok_or(SignalingError::NotConnected)?;
        tx.send(message).map_err(|_| SignalingError::NotConnected)
    }
}

#[async_trait]
impl SignalingChannel for WsSignalingClient {
    async fn send(&self, signal: ClientSignal) -> Result<(), SignalingError> {
        let json = serde_json::to_string(&signal)?;
        self.send_message(Message::text(json)).await
    }
}

async fn run_loop(inner: Arc<ClientInner>, user_id: PeerId, inbox: mpsc::Sender<RelaySignal>) {
    let mut failures: u32 = 0;

    loop {
        inner.status_tx.send_replace(ConnectionStatus::Connecting);

        match connect_async(inner.config.url.as_str()).await {
            Ok((socket, _)) => {
                info!("Connected to signaling relay at {}", inner.config.url);
                failures = 0;
                drive_connection(&inner, socket, &user_id, &inbox).await;
                *inner.outbound.write().await = None;

                if inbox.is_closed() {
                    debug!("Signaling inbox dropped, stopping");
                    break;
                }
                warn!("Signaling connection lost");
            }
            Err(e) => warn!("Failed to connect to {}: {}", inner.config.url, e),
        }

        inner.status_tx.send_replace(ConnectionStatus::Disconnected);

        failures += 1;
        if failures > inner.config.max_reconnect_attempts {
            error!(
                "Giving up on signaling relay after {} attempts",
                failures - 1
            );
            break;
        }

        let delay = inner.config.reconnect_delay(failures);
        info!(
            "Will attempt to reconnect in {:?} (attempt {})",
            delay, failures
        );
        tokio::time::sleep(delay).await;
    }

    inner.status_tx.send_replace(ConnectionStatus::Closed);
}

async fn drive_connection(
    inner: &Arc<ClientInner>,
    socket: Socket,
    user_id: &PeerId,
    inbox: &mpsc::Sender<RelaySignal>,
) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    let mut greeting = vec![ClientSignal::Register {
        user_id: user_id.clone(),
    }];
    greeting.extend(
        inner
            .rooms
            .read()
            .await
            .iter()
            .cloned()
            .map(|room_id| ClientSignal::JoinRoom { room_id }),
    );
    for signal in greeting {
        match serde_json::to_string(&signal) {
            Ok(json) => {
                let _ = tx.send(Message::text(json));
            }
            Err(e) => error!("Failed to serialize {:?}: {}", signal, e),
        }
    }

    *inner.outbound.write().await = Some(tx);
    inner.status_tx.send_replace(ConnectionStatus::Connected);

    let send_loop = async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sender.send(msg).await.is_err() || closing {
                break;
            }
        }
    };

    let recv_loop = async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<RelaySignal>(&text) {
                    Ok(signal) => {
                        if inbox.send(signal).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Invalid relay message: {:?}", e),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    };

    // Both halves live inside this future so aborting the loop tears them down.
    tokio::select! {
        _ = send_loop => {},
        _ = recv_loop => {},
    };
}
