//! Broker payload for presence changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PresenceState;

/// A presence change in transit on the status route.
///
/// Ephemeral: exists only between publish and consumption. A hard update
/// is an explicit user action and always wins; a soft update is inferred
/// from activity and is dropped when the persisted state is sticky.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceEvent {
    /// The user whose presence changed.
    pub uid: Uuid,
    /// Username, carried for consumer-side logging and fan-out.
    pub username: String,
    /// Socket ID of the publishing connection (empty when no socket is up).
    pub socket_id: String,
    /// The new presence state.
    pub state: PresenceState,
    /// Publisher wall-clock timestamp.
    pub last_seen: DateTime<Utc>,
    /// Whether this change was explicitly chosen by the user.
    pub is_hard_update: bool,
}

impl PresenceEvent {
    /// Build a soft (activity-derived) event stamped with the current time.
    pub fn soft(uid: Uuid, username: &str, socket_id: &str, state: PresenceState) -> Self {
        Self::stamped(uid, username, socket_id, state, false)
    }

    /// Build a hard (user-chosen) event stamped with the current time.
    pub fn hard(uid: Uuid, username: &str, socket_id: &str, state: PresenceState) -> Self {
        Self::stamped(uid, username, socket_id, state, true)
    }

    fn stamped(
        uid: Uuid,
        username: &str,
        socket_id: &str,
        state: PresenceState,
        is_hard_update: bool,
    ) -> Self {
        Self {
            uid,
            username: username.to_string(),
            socket_id: socket_id.to_string(),
            state,
            last_seen: Utc::now(),
            is_hard_update,
        }
    }
}
