//! PostgreSQL user directory implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use huddle_core::error::{AppError, ErrorKind};
use huddle_core::result::AppResult;
use huddle_entity::user::UserProfile;
use huddle_presence::store::UserDirectory;

const PROFILE_COLUMNS: &str = "id, username, email, avatar_url, email_verified";

/// User directory backed by the `users` table owned by the user service.
/// This subsystem only reads from it.
#[derive(Debug, Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    /// Create a new directory over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserProfile>> {
        sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Store, "Failed to find user by id", e))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserProfile>> {
        sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Store, "Failed to find user by email", e))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<UserProfile>> {
        sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Store, "Failed to find user by username", e)
        })
    }

    async fn avatar_url(&self, id: Uuid) -> AppResult<Option<String>> {
        let url: Option<Option<String>> =
            sqlx::query_scalar("SELECT avatar_url FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Store, "Failed to resolve avatar", e)
                })?;

        Ok(url.flatten())
    }
}
