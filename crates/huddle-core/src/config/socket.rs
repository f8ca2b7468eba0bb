//! Socket namespace lifecycle configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Socket lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketConfig {
    /// Base WebSocket URL; the namespace is appended as a path segment.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Seconds to wait for the server welcome after the transport opens.
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_seconds: u64,
    /// Reconnection policy after a normal close.
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

/// Bounded exponential-backoff reconnection policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Maximum reconnect attempts before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first attempt, in milliseconds.
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,
    /// Upper bound for the backoff delay, in milliseconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl SocketConfig {
    /// The handshake timeout as a [`Duration`].
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_seconds)
    }
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            handshake_timeout_seconds: default_handshake_timeout(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

fn default_base_url() -> String {
    "ws://localhost:8080/socket".to_string()
}

fn default_handshake_timeout() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay() -> u64 {
    500
}

fn default_max_delay() -> u64 {
    30_000
}
