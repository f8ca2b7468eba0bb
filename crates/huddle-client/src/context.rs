//! Shared client state: identity, auth snapshot, socket ID, local mirror.

use tokio::sync::{RwLock, watch};
use uuid::Uuid;

use huddle_entity::presence::PresenceState;

/// The authenticated identity this client runs as.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    /// User ID.
    pub uid: Uuid,
    /// Username.
    pub username: String,
}

/// Application authentication state, consulted before reconnecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthSnapshot {
    /// Whether the user is currently authenticated.
    pub authenticated: bool,
    /// Whether the user's email address has been verified.
    pub email_verified: bool,
}

impl AuthSnapshot {
    /// Whether an automatic reconnect is permitted.
    pub fn can_reconnect(&self) -> bool {
        self.authenticated && self.email_verified
    }
}

impl Default for AuthSnapshot {
    fn default() -> Self {
        Self {
            authenticated: false,
            email_verified: false,
        }
    }
}

/// State shared between the session manager, socket manager, activity
/// detector, and dispatcher.
#[derive(Debug)]
pub struct ClientContext {
    /// The identity this client runs as.
    identity: ClientIdentity,
    /// Authentication snapshot, updated by the application.
    auth_tx: watch::Sender<AuthSnapshot>,
    /// Rooms joined in this session, sent with the registration handshake.
    rooms: RwLock<Vec<Uuid>>,
    /// Socket ID of the active `users` connection.
    socket_id: RwLock<Option<String>>,
    /// Locally known presence state, mirroring the stickiness invariant.
    local_state: RwLock<PresenceState>,
}

impl ClientContext {
    /// Create a context for the given identity. Starts offline and
    /// unauthenticated.
    pub fn new(identity: ClientIdentity) -> Self {
        Self {
            identity,
            auth_tx: watch::channel(AuthSnapshot::default()).0,
            rooms: RwLock::new(Vec::new()),
            socket_id: RwLock::new(None),
            local_state: RwLock::new(PresenceState::Offline),
        }
    }

    /// The identity this client runs as.
    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    /// Current authentication snapshot.
    pub fn auth(&self) -> AuthSnapshot {
        *self.auth_tx.borrow()
    }

    /// Update the authentication snapshot.
    pub fn set_auth(&self, snapshot: AuthSnapshot) {
        let _ = self.auth_tx.send(snapshot);
    }

    /// Watch authentication changes.
    pub fn watch_auth(&self) -> watch::Receiver<AuthSnapshot> {
        self.auth_tx.subscribe()
    }

    /// Rooms joined in this session.
    pub async fn rooms(&self) -> Vec<Uuid> {
        self.rooms.read().await.clone()
    }

    /// Replace the joined-room set.
    pub async fn set_rooms(&self, rooms: Vec<Uuid>) {
        *self.rooms.write().await = rooms;
    }

    /// Socket ID of the active `users` connection, if connected.
    pub async fn socket_id(&self) -> Option<String> {
        self.socket_id.read().await.clone()
    }

    /// Record the socket ID assigned by the server welcome.
    pub async fn set_socket_id(&self, socket_id: &str) {
        *self.socket_id.write().await = Some(socket_id.to_string());
    }

    /// Clear the socket ID on disconnect.
    pub async fn clear_socket_id(&self) {
        *self.socket_id.write().await = None;
    }

    /// Locally known presence state.
    pub async fn local_state(&self) -> PresenceState {
        *self.local_state.read().await
    }

    /// Update the locally known presence state.
    pub async fn set_local_state(&self, state: PresenceState) {
        *self.local_state.write().await = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ClientContext {
        ClientContext::new(ClientIdentity {
            uid: Uuid::new_v4(),
            username: "alice".to_string(),
        })
    }

    #[tokio::test]
    async fn test_starts_offline_and_unauthenticated() {
        let ctx = context();
        assert_eq!(ctx.local_state().await, PresenceState::Offline);
        assert!(!ctx.auth().can_reconnect());
        assert!(ctx.socket_id().await.is_none());
    }

    #[tokio::test]
    async fn test_reconnect_requires_verified_email() {
        let ctx = context();
        ctx.set_auth(AuthSnapshot {
            authenticated: true,
            email_verified: false,
        });
        assert!(!ctx.auth().can_reconnect());

        ctx.set_auth(AuthSnapshot {
            authenticated: true,
            email_verified: true,
        });
        assert!(ctx.auth().can_reconnect());
    }
}
