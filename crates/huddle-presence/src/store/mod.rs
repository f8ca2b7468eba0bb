//! Narrow interfaces to the external Status Store and User Directory.

pub mod memory;

pub use memory::MemoryStatusStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use huddle_core::AppResult;
use huddle_entity::presence::{PresenceState, UserStatusRecord};
use huddle_entity::user::UserProfile;

/// Durable persistence of last-known presence, keyed by user ID.
///
/// The conditional write in [`update_if_not_sticky`] is the only
/// concurrency-control mechanism for the record: concurrent writers race,
/// and the "is sticky" predicate decides who wins. No locking.
///
/// [`update_if_not_sticky`]: StatusStore::update_if_not_sticky
#[async_trait]
pub trait StatusStore: Send + Sync + std::fmt::Debug {
    /// Refresh `last_seen` without touching the state. Creates the record
    /// if the user has none yet.
    async fn upsert_last_seen(
        &self,
        uid: Uuid,
        timestamp: DateTime<Utc>,
    ) -> AppResult<UserStatusRecord>;

    /// Read the current record for a user.
    async fn get_status(&self, uid: Uuid) -> AppResult<Option<UserStatusRecord>>;

    /// Conditionally write state and `last_seen`: applied only when the
    /// persisted state is not sticky. Returns the record either way, so a
    /// dropped write is observable as an unchanged record.
    async fn update_if_not_sticky(
        &self,
        uid: Uuid,
        state: PresenceState,
        timestamp: DateTime<Utc>,
    ) -> AppResult<UserStatusRecord>;

    /// Unconditionally write state and `last_seen`. Creates the record if
    /// the user has none yet.
    async fn force_update(
        &self,
        uid: Uuid,
        state: PresenceState,
        timestamp: DateTime<Utc>,
    ) -> AppResult<UserStatusRecord>;
}

/// Lookup interface to the external user directory.
#[async_trait]
pub trait UserDirectory: Send + Sync + std::fmt::Debug {
    /// Find a user by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserProfile>>;

    /// Find a user by email address.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserProfile>>;

    /// Find a user by username.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<UserProfile>>;

    /// Resolve the avatar URL for a user, if one is set.
    async fn avatar_url(&self, id: Uuid) -> AppResult<Option<String>>;
}
