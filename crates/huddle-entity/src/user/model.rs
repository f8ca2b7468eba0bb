//! User profile as exposed by the user directory.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user profile resolved through the directory.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProfile {
    /// User ID.
    pub id: Uuid,
    /// Unique username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Resolved avatar URL, if one is set.
    pub avatar_url: Option<String>,
    /// Whether the email address has been verified.
    pub email_verified: bool,
}
