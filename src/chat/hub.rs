use tokio::sync::broadcast;
use uuid::Uuid;

use super::events::ServerEvent;

/// Delivery target for an outbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
    /// Every connection, joined or not.
    All,
    /// The channel keyed by a user identity: whichever connection last
    /// joined as this user.
    User(Uuid),
    /// One specific connection, used for failure events back to the
    /// originator.
    Conn(Uuid),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub to: Address,
    pub event: ServerEvent,
}

impl Envelope {
    /// Whether a connection identified by `conn_id`, joined as `user_id`
    /// (if at all), should forward this envelope to its socket.
    pub fn is_for(&self, conn_id: Uuid, user_id: Option<Uuid>) -> bool {
        match self.to {
            Address::All => true,
            Address::User(user) => user_id == Some(user),
            Address::Conn(conn) => conn == conn_id,
        }
    }
}

/// Fan-out side of the transport: one broadcast channel of addressed
/// envelopes, filtered per connection. Best-effort at-most-once; a lagged
/// subscriber drops what it missed, history fetch is the durability
/// fallback.
#[derive(Clone)]
pub struct Hub {
    tx: broadcast::Sender<Envelope>,
}

impl Hub {
    pub fn new(capacity: usize) -> Self {
        Self {
            tx: broadcast::channel(capacity).0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }

    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.tx.send(Envelope { to: Address::All, event });
    }

    pub fn to_user(&self, user_id: Uuid, event: ServerEvent) {
        let _ = self.tx.send(Envelope { to: Address::User(user_id), event });
    }

    pub fn to_conn(&self, conn_id: Uuid, event: ServerEvent) {
        let _ = self.tx.send(Envelope { to: Address::Conn(conn_id), event });
    }
}
