//! PostgreSQL status store implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use huddle_core::error::{AppError, ErrorKind};
use huddle_core::result::AppResult;
use huddle_entity::presence::{PresenceState, UserStatusRecord};
use huddle_presence::store::StatusStore;

/// Durable status store backed by the `user_statuses` table.
///
/// The sticky check and the write happen in a single conditional UPDATE,
/// so racing consumers are serialized by the database row lock rather
/// than by application-level locking.
#[derive(Debug, Clone)]
pub struct PgStatusStore {
    pool: PgPool,
}

impl PgStatusStore {
    /// Create a new status store over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatusStore for PgStatusStore {
    async fn upsert_last_seen(
        &self,
        uid: Uuid,
        timestamp: DateTime<Utc>,
    ) -> AppResult<UserStatusRecord> {
        sqlx::query_as::<_, UserStatusRecord>(
            "INSERT INTO user_statuses (uid, state, last_seen) VALUES ($1, 'online', $2) \
             ON CONFLICT (uid) DO UPDATE SET last_seen = EXCLUDED.last_seen RETURNING *",
        )
        .bind(uid)
        .bind(timestamp)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Store, "Failed to upsert last_seen", e))
    }

    async fn get_status(&self, uid: Uuid) -> AppResult<Option<UserStatusRecord>> {
        sqlx::query_as::<_, UserStatusRecord>("SELECT * FROM user_statuses WHERE uid = $1")
            .bind(uid)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Store, "Failed to read status", e))
    }

    async fn update_if_not_sticky(
        &self,
        uid: Uuid,
        state: PresenceState,
        timestamp: DateTime<Utc>,
    ) -> AppResult<UserStatusRecord> {
        let updated = sqlx::query_as::<_, UserStatusRecord>(
            "UPDATE user_statuses SET state = $2, last_seen = $3 \
             WHERE uid = $1 AND state NOT IN ('appear_away', 'appear_busy', 'appear_offline') \
             RETURNING *",
        )
        .bind(uid)
        .bind(state)
        .bind(timestamp)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Store, "Failed to conditionally update status", e)
        })?;

        match updated {
            Some(record) => Ok(record),
            // Sticky record: the write was dropped, return the current row.
            None => self
                .get_status(uid)
                .await?
                .ok_or_else(|| AppError::not_found(format!("No status record for user {uid}"))),
        }
    }

    async fn force_update(
        &self,
        uid: Uuid,
        state: PresenceState,
        timestamp: DateTime<Utc>,
    ) -> AppResult<UserStatusRecord> {
        sqlx::query_as::<_, UserStatusRecord>(
            "INSERT INTO user_statuses (uid, state, last_seen) VALUES ($1, $2, $3) \
             ON CONFLICT (uid) DO UPDATE SET state = EXCLUDED.state, \
             last_seen = EXCLUDED.last_seen RETURNING *",
        )
        .bind(uid)
        .bind(state)
        .bind(timestamp)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Store, "Failed to force status update", e))
    }
}
