//! Session manager — access-token lifecycle with refresh-and-retry.

use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use huddle_core::config::auth::AuthConfig;
use huddle_core::{AppError, AppResult};
use huddle_entity::session::{AccessTokenResponse, TokenPair};

/// Owns the access/refresh token pair and guarantees that every outbound
/// authenticated call carries a valid access token.
///
/// The manager is the only writer of the token pair. Readers fetch the
/// current value at call time and never cache it across await points.
/// Concurrent refresh attempts are deduplicated behind a single in-flight
/// call: N concurrent 401s produce exactly one network refresh.
#[derive(Debug)]
pub struct SessionManager {
    /// Shared HTTP client.
    http: reqwest::Client,
    /// Token refresh endpoint.
    refresh_endpoint: String,
    /// The token pair, present while a session is active.
    tokens: RwLock<Option<TokenPair>>,
    /// Serializes refresh attempts.
    refresh_gate: Mutex<()>,
    /// Bumped after every completed refresh attempt; waiters that observe
    /// a bump reuse its outcome instead of refreshing again.
    refresh_generation: AtomicU64,
}

impl SessionManager {
    /// Create a session manager with no tokens held.
    pub fn new(config: &AuthConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.http_timeout_seconds))
            .build()
            .map_err(|e| AppError::session(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            refresh_endpoint: config.refresh_endpoint.clone(),
            tokens: RwLock::new(None),
            refresh_gate: Mutex::new(()),
            refresh_generation: AtomicU64::new(0),
        })
    }

    /// Create a session manager holding the given tokens.
    pub fn with_tokens(config: &AuthConfig, tokens: TokenPair) -> AppResult<Self> {
        let manager = Self::new(config)?;
        Ok(Self {
            tokens: RwLock::new(Some(tokens)),
            ..manager
        })
    }

    /// The underlying HTTP client, for building requests.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Store a new token pair (e.g. after login).
    pub async fn set_tokens(&self, tokens: TokenPair) {
        *self.tokens.write().await = Some(tokens);
        info!("Session tokens stored");
    }

    /// Current access token, if a session is active.
    pub async fn access_token(&self) -> Option<String> {
        self.tokens
            .read()
            .await
            .as_ref()
            .map(|t| t.access_token.clone())
    }

    /// Current refresh token, if a session is active.
    pub async fn refresh_token(&self) -> Option<String> {
        self.tokens
            .read()
            .await
            .as_ref()
            .map(|t| t.refresh_token.clone())
    }

    /// Clear both tokens. Subsequent [`attach`] calls leave requests bare.
    ///
    /// [`attach`]: SessionManager::attach
    pub async fn logout(&self) {
        *self.tokens.write().await = None;
        info!("Session tokens cleared");
    }

    /// Inject the current access token into a request builder. A builder
    /// passes through unchanged when no session is active.
    pub async fn attach(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.access_token().await {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Execute an authenticated request, recovering transparently from a
    /// single expiry event.
    ///
    /// On 401/403 with a refresh token present and a replayable body, the
    /// manager refreshes once and re-issues the original request with the
    /// new token. If the refresh fails, or the request was already
    /// retried, the original response is surfaced unchanged.
    pub async fn send(&self, request: reqwest::Request) -> AppResult<reqwest::Response> {
        let retry = request.try_clone();

        let mut request = request;
        self.authorize(&mut request).await?;

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| AppError::transport(format!("Request failed: {e}")))?;

        let status = response.status();
        if status != StatusCode::UNAUTHORIZED && status != StatusCode::FORBIDDEN {
            return Ok(response);
        }

        if self.refresh_token().await.is_none() {
            return Ok(response);
        }

        // A streaming body cannot be replayed; surface the error as-is.
        let Some(mut retry_request) = retry else {
            return Ok(response);
        };

        match self.refresh().await {
            Ok(_) => {
                debug!("Re-issuing request after token refresh");
                self.authorize(&mut retry_request).await?;
                self.http
                    .execute(retry_request)
                    .await
                    .map_err(|e| AppError::transport(format!("Retried request failed: {e}")))
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, surfacing original response");
                Ok(response)
            }
        }
    }

    /// Convenience: authenticated GET.
    pub async fn get(&self, url: &str) -> AppResult<reqwest::Response> {
        let request = self
            .http
            .get(url)
            .build()
            .map_err(|e| AppError::session(format!("Failed to build request: {e}")))?;
        self.send(request).await
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Deduplicated: callers that arrive while a refresh is in flight wait
    /// for it and reuse its outcome. A failed refresh clears both tokens
    /// (unauthenticated state).
    pub async fn refresh(&self) -> AppResult<String> {
        let refresh_token = self
            .refresh_token()
            .await
            .ok_or_else(|| AppError::authentication("No refresh token held"))?;

        let observed = self.refresh_generation.load(Ordering::Acquire);
        let _gate = self.refresh_gate.lock().await;

        if self.refresh_generation.load(Ordering::Acquire) != observed {
            // A concurrent caller completed a refresh while we waited.
            return self
                .access_token()
                .await
                .ok_or_else(|| AppError::authentication("Session was cleared during refresh"));
        }

        let outcome = self.request_access_token(&refresh_token).await;
        self.refresh_generation.fetch_add(1, Ordering::AcqRel);

        match outcome {
            Ok(access_token) => {
                let mut tokens = self.tokens.write().await;
                if let Some(pair) = tokens.as_mut() {
                    pair.access_token = access_token.clone();
                }
                debug!("Access token refreshed");
                Ok(access_token)
            }
            Err(e) => {
                warn!(error = %e, "Refresh rejected, clearing session");
                *self.tokens.write().await = None;
                Err(e)
            }
        }
    }

    async fn request_access_token(&self, refresh_token: &str) -> AppResult<String> {
        let response = self
            .http
            .get(&self.refresh_endpoint)
            .bearer_auth(refresh_token)
            .send()
            .await
            .map_err(|e| AppError::session(format!("Refresh request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::authentication(format!(
                "Refresh rejected with status {}",
                response.status()
            )));
        }

        let body: AccessTokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::session(format!("Malformed refresh response: {e}")))?;

        Ok(body.access_token)
    }

    async fn authorize(&self, request: &mut reqwest::Request) -> AppResult<()> {
        if let Some(token) = self.access_token().await {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| AppError::session(format!("Invalid token characters: {e}")))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }
        Ok(())
    }
}
