use std::sync::Mutex;

use uuid::Uuid;

use super::events::{ClientEvent, ServerEvent};
use super::hub::Hub;
use crate::presence::PresenceRegistry;
use crate::store::MessageStore;

/// The realtime core: takes inbound events from connections, updates the
/// presence registry and the message store, and decides which channels get
/// which outbound events.
///
/// The registry lives behind a sync mutex that is never held across an
/// await; store calls suspend only the event being handled.
pub struct Coordinator {
    registry: Mutex<PresenceRegistry>,
    store: MessageStore,
    hub: Hub,
}

impl Coordinator {
    pub fn new(store: MessageStore, hub: Hub) -> Self {
        Self {
            registry: Mutex::new(PresenceRegistry::new()),
            store,
            hub,
        }
    }

    pub async fn handle(&self, conn_id: Uuid, event: ClientEvent) {
        match event {
            ClientEvent::Join { user_id } => {
                self.registry.lock().unwrap().set_online(user_id, conn_id);
                tracing::info!(%user_id, %conn_id, "joined");
                self.broadcast_online();
            }

            ClientEvent::SendMessage { sender, recipient, content } => {
                if content.trim().is_empty() {
                    tracing::debug!(%sender, "dropping empty message");
                    return;
                }

                match self.store.insert(sender, recipient, &content).await {
                    Ok(message) => {
                        self.hub.to_user(recipient, ServerEvent::ReceiveMessage {
                            message: message.clone(),
                        });
                        // Self-echo keeps the sender's other tabs in sync.
                        self.hub.to_user(sender, ServerEvent::ReceiveMessage { message });
                    }
                    Err(err) => self.send_failed(conn_id, "message was not saved", err.err),
                }
            }

            ClientEvent::Typing { sender, recipient } => {
                self.hub.to_user(recipient, ServerEvent::DisplayTyping { sender });
            }

            ClientEvent::StopTyping { sender, recipient } => {
                self.hub.to_user(recipient, ServerEvent::HideTyping { sender });
            }

            ClientEvent::MarkRead { sender_id, recipient_id } => {
                match self.store.mark_read(sender_id, recipient_id).await {
                    Ok(changed) => {
                        tracing::debug!(%sender_id, %recipient_id, changed, "marked read");
                        // Only the original sender needs this; the reader's
                        // own state is already current.
                        self.hub.to_user(sender_id, ServerEvent::MessagesReadUpdate {
                            reader_id: recipient_id,
                        });
                    }
                    Err(err) => self.send_failed(conn_id, "read state was not saved", err.err),
                }
            }
        }
    }

    /// Socket closed. Presence is only touched if this connection is still
    /// the one registered for its user; rebroadcast only when something
    /// actually changed.
    pub fn disconnect(&self, conn_id: Uuid) {
        let removed = self.registry.lock().unwrap().remove_by_connection(conn_id);

        if let Some(user_id) = removed {
            tracing::info!(%user_id, %conn_id, "disconnected");
            self.broadcast_online();
        }
    }

    fn broadcast_online(&self) {
        let users: Vec<Uuid> = self.registry.lock().unwrap().list_online().collect();
        self.hub.broadcast(ServerEvent::OnlineUsers { users });
    }

    fn send_failed(&self, conn_id: Uuid, reason: &str, err: anyhow::Error) {
        tracing::error!(%conn_id, "store failure: {err:#}");
        self.hub.to_conn(conn_id, ServerEvent::SendFailed {
            reason: reason.to_owned(),
        });
    }
}
