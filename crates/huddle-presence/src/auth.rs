//! JWT validation of the socket connection-time credential.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use huddle_core::config::auth::AuthConfig;
use huddle_core::{AppError, AppResult};

/// Claims carried by the access token presented at socket connect time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — the user ID.
    pub sub: Uuid,
    /// Username for convenience.
    pub username: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// Identity a socket is associated with after a successful handshake.
#[derive(Debug, Clone)]
pub struct SocketIdentity {
    /// User ID.
    pub uid: Uuid,
    /// Username.
    pub username: String,
}

/// Validates the connection-time JWT credential.
///
/// The token is carried once at connect time, not re-sent per message.
#[derive(Clone)]
pub struct SocketAuthenticator {
    /// HMAC key for validation.
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for SocketAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketAuthenticator").finish()
    }
}

impl SocketAuthenticator {
    /// Creates an authenticator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        }
    }

    /// Validates a token and yields the identity to associate the socket
    /// with.
    pub fn authenticate(&self, token: &str) -> AppResult<SocketIdentity> {
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::authentication(format!("Invalid socket credential: {e}")))?;

        Ok(SocketIdentity {
            uid: data.claims.sub,
            username: data.claims.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
            ..AuthConfig::default()
        }
    }

    fn token_with_exp(exp_offset_seconds: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            username: "alice".to_string(),
            iat: now,
            exp: now + exp_offset_seconds,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token_yields_identity() {
        let authenticator = SocketAuthenticator::new(&config());
        let identity = authenticator.authenticate(&token_with_exp(3600)).unwrap();
        assert_eq!(identity.username, "alice");
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let authenticator = SocketAuthenticator::new(&config());
        assert!(authenticator.authenticate(&token_with_exp(-3600)).is_err());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let other = AuthConfig {
            jwt_secret: "other-secret".to_string(),
            ..AuthConfig::default()
        };
        let authenticator = SocketAuthenticator::new(&other);
        assert!(authenticator.authenticate(&token_with_exp(3600)).is_err());
    }
}
