//! Status-event broker configuration.

use serde::{Deserialize, Serialize};

/// Message broker configuration for presence events.
///
/// Delivery is best-effort by design: the status route is non-durable and
/// a transient outage may drop updates. A missed transition self-heals on
/// the next heartbeat or idle transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Broker connection URL (Redis for multi-node deployments).
    #[serde(default = "default_broker_url")]
    pub url: String,
    /// Topic route carrying user status events.
    #[serde(default = "default_status_route")]
    pub status_route: String,
    /// Internal buffer size for subscription channels.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: default_broker_url(),
            status_route: default_status_route(),
            channel_buffer_size: default_channel_buffer(),
        }
    }
}

fn default_broker_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_status_route() -> String {
    "events.user.status".to_string()
}

fn default_channel_buffer() -> usize {
    256
}
