//! Bounded exponential backoff with jitter for reconnect attempts.

use std::time::Duration;

use huddle_core::config::socket::ReconnectConfig;

/// Delay before the given attempt (1-based).
///
/// Doubles from the base delay, capped at the configured maximum, with
/// up to 50% jitter subtracted so that a fleet of clients does not
/// reconnect in lockstep.
pub fn delay_for(config: &ReconnectConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    let raw = config
        .base_delay_ms
        .saturating_mul(1u64 << exponent)
        .min(config.max_delay_ms);

    let jitter = rand::random::<u64>() % (raw / 2 + 1);
    Duration::from_millis(raw - jitter)
}
