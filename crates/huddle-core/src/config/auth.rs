//! Session and token configuration.

use serde::{Deserialize, Serialize};

/// Session/token configuration shared by the client session manager and
/// the server-side socket authenticator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT validation (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Endpoint the client calls to exchange a refresh token for a new
    /// access token.
    #[serde(default = "default_refresh_endpoint")]
    pub refresh_endpoint: String,
    /// HTTP request timeout in seconds for authenticated calls.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            refresh_endpoint: default_refresh_endpoint(),
            http_timeout_seconds: default_http_timeout(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_refresh_endpoint() -> String {
    "http://localhost:8080/auth/access-token".to_string()
}

fn default_http_timeout() -> u64 {
    30
}
