//! In-memory status store for single-node deployments and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use huddle_core::AppResult;
use huddle_entity::presence::{PresenceState, UserStatusRecord};

use super::StatusStore;

/// DashMap-backed status store.
///
/// Applies the same conditional-write rule as the durable store; each map
/// entry is updated under its shard lock, so the sticky check and the
/// write are atomic per user.
#[derive(Debug, Default)]
pub struct MemoryStatusStore {
    /// User ID → status record.
    records: DashMap<Uuid, UserStatusRecord>,
}

impl MemoryStatusStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn fresh_record(uid: Uuid, state: PresenceState, timestamp: DateTime<Utc>) -> UserStatusRecord {
        UserStatusRecord {
            id: Uuid::new_v4(),
            uid,
            state,
            last_seen: timestamp,
        }
    }
}

#[async_trait]
impl StatusStore for MemoryStatusStore {
    async fn upsert_last_seen(
        &self,
        uid: Uuid,
        timestamp: DateTime<Utc>,
    ) -> AppResult<UserStatusRecord> {
        let mut entry = self
            .records
            .entry(uid)
            .or_insert_with(|| Self::fresh_record(uid, PresenceState::Online, timestamp));
        entry.last_seen = timestamp;
        Ok(entry.clone())
    }

    async fn get_status(&self, uid: Uuid) -> AppResult<Option<UserStatusRecord>> {
        Ok(self.records.get(&uid).map(|r| r.clone()))
    }

    async fn update_if_not_sticky(
        &self,
        uid: Uuid,
        state: PresenceState,
        timestamp: DateTime<Utc>,
    ) -> AppResult<UserStatusRecord> {
        let mut entry = self
            .records
            .entry(uid)
            .or_insert_with(|| Self::fresh_record(uid, state, timestamp));
        if !entry.state.is_sticky() {
            entry.state = state;
            entry.last_seen = timestamp;
        }
        Ok(entry.clone())
    }

    async fn force_update(
        &self,
        uid: Uuid,
        state: PresenceState,
        timestamp: DateTime<Utc>,
    ) -> AppResult<UserStatusRecord> {
        let mut entry = self
            .records
            .entry(uid)
            .or_insert_with(|| Self::fresh_record(uid, state, timestamp));
        entry.state = state;
        entry.last_seen = timestamp;
        Ok(entry.clone())
    }
}
