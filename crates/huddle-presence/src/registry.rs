//! Socket registry — associates socket IDs with authenticated identities.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use huddle_core::AppResult;
use huddle_entity::presence::PresenceState;
use huddle_entity::socket::ClientMessage;

use crate::store::{StatusStore, UserDirectory};

/// A socket the server has associated with an identity.
#[derive(Debug, Clone)]
pub struct RegisteredSocket {
    /// Socket ID.
    pub socket_id: String,
    /// User ID.
    pub uid: Uuid,
    /// Username.
    pub username: String,
    /// Avatar URL resolved through the directory, if any.
    pub avatar_url: Option<String>,
    /// Rooms joined in this session.
    pub rooms: Vec<Uuid>,
}

/// Tracks which socket belongs to which user.
///
/// Fed by the registration handshake and the logout notice; the
/// association is the implicit ack of the handshake.
#[derive(Debug)]
pub struct SocketRegistry {
    /// Socket ID → registered identity.
    sockets: DashMap<String, RegisteredSocket>,
    /// Durable status persistence.
    store: Arc<dyn StatusStore>,
    /// User directory for profile enrichment.
    directory: Arc<dyn UserDirectory>,
}

impl SocketRegistry {
    /// Create a registry over the given collaborators.
    pub fn new(store: Arc<dyn StatusStore>, directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            sockets: DashMap::new(),
            store,
            directory,
        }
    }

    /// Dispatch an inbound socket message.
    pub async fn handle_message(&self, message: ClientMessage) -> AppResult<()> {
        match message {
            ClientMessage::Register {
                uid,
                username,
                socket_id,
                rooms,
            } => self.register(uid, &username, &socket_id, rooms).await,
            ClientMessage::Logout {
                uid,
                username,
                socket_id,
            } => self.logout(uid, &username, &socket_id).await,
            ClientMessage::Pong { .. } => Ok(()),
        }
    }

    /// Handle the registration handshake: associate the socket with the
    /// identity and refresh the record's `last_seen` without disturbing a
    /// sticky state.
    pub async fn register(
        &self,
        uid: Uuid,
        username: &str,
        socket_id: &str,
        rooms: Vec<Uuid>,
    ) -> AppResult<()> {
        let avatar_url = match self.directory.avatar_url(uid).await {
            Ok(url) => url,
            Err(e) => {
                debug!(uid = %uid, error = %e, "Avatar resolution failed, continuing without");
                None
            }
        };

        self.sockets.insert(
            socket_id.to_string(),
            RegisteredSocket {
                socket_id: socket_id.to_string(),
                uid,
                username: username.to_string(),
                avatar_url,
                rooms,
            },
        );

        self.store.upsert_last_seen(uid, Utc::now()).await?;

        info!(
            uid = %uid,
            username = %username,
            socket_id = %socket_id,
            "Socket registered"
        );
        Ok(())
    }

    /// Handle the logout notice: drop the association and eagerly mark
    /// the user offline instead of waiting for a drop timeout. Logout is
    /// an explicit user action, so the write is unconditional.
    pub async fn logout(&self, uid: Uuid, username: &str, socket_id: &str) -> AppResult<()> {
        if self.sockets.remove(socket_id).is_none() {
            warn!(socket_id = %socket_id, "Logout notice for unknown socket");
        }

        self.store
            .force_update(uid, PresenceState::Offline, Utc::now())
            .await?;

        info!(
            uid = %uid,
            username = %username,
            socket_id = %socket_id,
            "Socket logged out, presence marked offline"
        );
        Ok(())
    }

    /// Handle a connection drop without a logout notice. Only the
    /// association is removed; the status record self-heals through the
    /// next heartbeat or idle transition.
    pub fn drop_connection(&self, socket_id: &str) {
        if let Some((_, registered)) = self.sockets.remove(socket_id) {
            debug!(
                uid = %registered.uid,
                socket_id = %socket_id,
                "Socket dropped without logout notice"
            );
        }
    }

    /// Look up the identity a socket is associated with.
    pub fn identity(&self, socket_id: &str) -> Option<RegisteredSocket> {
        self.sockets.get(socket_id).map(|r| r.clone())
    }

    /// Whether the user has at least one registered socket.
    pub fn is_connected(&self, uid: Uuid) -> bool {
        self.sockets.iter().any(|r| r.uid == uid)
    }

    /// Number of registered sockets.
    pub fn connection_count(&self) -> usize {
        self.sockets.len()
    }
}
