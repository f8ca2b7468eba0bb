//! Token value types for the client session.

use serde::{Deserialize, Serialize};

/// The access/refresh token pair identifying an authenticated client.
///
/// Owned exclusively by the client session manager, which is the only
/// writer for the lifetime of the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived access token attached to outbound calls.
    pub access_token: String,
    /// Longer-lived refresh token used to obtain new access tokens.
    pub refresh_token: String,
}

impl TokenPair {
    /// Create a token pair from raw token strings.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

/// Response body of the token refresh endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    /// The freshly issued access token.
    pub access_token: String,
}
