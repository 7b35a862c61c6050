use caller_core::{ClientSignal, PeerId, RelaySignal, RoomId};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Identifies one WebSocket connection for the lifetime of the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

struct Registration {
    connection: ConnectionId,
    tx: mpsc::UnboundedSender<RelaySignal>,
}

struct RelayInner {
    users: DashMap<PeerId, Registration>,
    rooms: DashMap<RoomId, HashSet<PeerId>>,
    next_connection: AtomicU64,
}

/// Registry of connected users and the routing rules between them.
///
/// Peer messages are addressed by `to`; the recipient receives them keyed by
/// the sender instead. Messages for users that are not registered are dropped.
#[derive(Clone)]
pub struct RelayService {
    inner: Arc<RelayInner>,
}

impl Default for RelayService {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RelayInner {
                users: DashMap::new(),
                rooms: DashMap::new(),
                next_connection: AtomicU64::new(1),
            }),
        }
    }

    pub fn open_connection(&self) -> ConnectionId {
        ConnectionId(self.inner.next_connection.fetch_add(1, Ordering::Relaxed))
    }

    /// Binds `user_id` to a connection. A newer connection for the same user
    /// replaces the older one.
    pub fn register(
        &self,
        user_id: PeerId,
        connection: ConnectionId,
        tx: mpsc::UnboundedSender<RelaySignal>,
    ) {
        let previous = self
            .inner
            .users
            .insert(user_id.clone(), Registration { connection, tx });

        match previous {
            Some(old) if old.connection != connection => {
                info!("User {} re-registered on a new connection", user_id)
            }
            Some(_) => debug!("User {} registered again", user_id),
            None => info!("User {} registered", user_id),
        }
    }

    /// Drops everything `connection` registered. A registration already taken
    /// over by a newer connection is left alone.
    pub fn disconnect(&self, user_id: &PeerId, connection: ConnectionId) {
        let removed = self
            .inner
            .users
            .remove_if(user_id, |_, reg| reg.connection == connection)
            .is_some();

        if !removed {
            return;
        }

        self.inner.rooms.retain(|_, members| {
            members.remove(user_id);
            !members.is_empty()
        });
        info!("User {} unregistered", user_id);
    }

    pub fn is_registered(&self, user_id: &PeerId) -> bool {
        self.inner.users.contains_key(user_id)
    }

    /// Connection currently holding the registration of `user_id`.
    pub fn connection_of(&self, user_id: &PeerId) -> Option<ConnectionId> {
        self.inner.users.get(user_id).map(|reg| reg.connection)
    }

    pub fn user_count(&self) -> usize {
        self.inner.users.len()
    }

    pub fn room_members(&self, room_id: &RoomId) -> Vec<PeerId> {
        self.inner
            .rooms
            .get(room_id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Applies a message from the registered user `from`. Returns whether a
    /// peer message reached its recipient.
    pub fn route(&self, from: &PeerId, signal: ClientSignal) -> bool {
        match signal {
            ClientSignal::Register { user_id } => {
                warn!(
                    "Ignoring register as {} from already registered {}",
                    user_id, from
                );
                false
            }
            ClientSignal::JoinRoom { room_id } => {
                debug!("{} joined room {}", from, room_id);
                self.inner
                    .rooms
                    .entry(room_id)
                    .or_default()
                    .insert(from.clone());
                false
            }
            ClientSignal::LeaveRoom { room_id } => {
                debug!("{} left room {}", from, room_id);
                self.inner.rooms.remove_if_mut(&room_id, |_, members| {
                    members.remove(from);
                    members.is_empty()
                });
                false
            }
            signal => {
                let Some(to) = signal.recipient().cloned() else {
                    return false;
                };
                match signal.into_relayed(from.clone()) {
                    Some(relayed) => self.deliver(&to, relayed),
                    None => false,
                }
            }
        }
    }

    fn deliver(&self, to: &PeerId, signal: RelaySignal) -> bool {
        let Some(user) = self.inner.users.get(to) else {
            warn!(
                "Dropping {:?} from {} for unregistered user {}",
                signal,
                signal.sender(),
                to
            );
            return false;
        };

        if user.tx.send(signal).is_err() {
            warn!("Connection of {} is closing, message dropped", to);
            return false;
        }
        true
    }
}
