//! Activity detection configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Activity detector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Seconds without a qualifying input event before the user is
    /// classified as idle.
    #[serde(default = "default_idle_threshold")]
    pub idle_threshold_seconds: u64,
    /// Minimum seconds between repeated "still online" events while the
    /// user stays continuously active. Defaults to the idle threshold.
    #[serde(default)]
    pub min_resend_interval_seconds: Option<u64>,
}

impl PresenceConfig {
    /// The idle threshold as a [`Duration`].
    pub fn idle_threshold(&self) -> Duration {
        Duration::from_secs(self.idle_threshold_seconds)
    }

    /// The heartbeat throttle as a [`Duration`].
    pub fn min_resend_interval(&self) -> Duration {
        Duration::from_secs(
            self.min_resend_interval_seconds
                .unwrap_or(self.idle_threshold_seconds),
        )
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            idle_threshold_seconds: default_idle_threshold(),
            min_resend_interval_seconds: None,
        }
    }
}

fn default_idle_threshold() -> u64 {
    300
}
