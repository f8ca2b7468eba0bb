//! Persisted user status record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PresenceState;

/// The durable status row for a user.
///
/// One record per user, created at account creation and mutated in place
/// for the lifetime of the account. This subsystem never hard-deletes it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserStatusRecord {
    /// Opaque status-row ID.
    pub id: Uuid,
    /// The user this record belongs to.
    pub uid: Uuid,
    /// Current presence state.
    pub state: PresenceState,
    /// When the user was last seen.
    pub last_seen: DateTime<Utc>,
}
