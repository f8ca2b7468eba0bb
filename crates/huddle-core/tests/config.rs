//! Configuration loading behavior without any config files present.

use huddle_core::config::AppConfig;
use huddle_core::telemetry;

#[test]
fn test_load_without_files_yields_defaults() {
    let config = AppConfig::load("test").unwrap();

    assert_eq!(config.presence.idle_threshold_seconds, 300);
    assert_eq!(config.presence.min_resend_interval(), config.presence.idle_threshold());
    assert_eq!(config.broker.status_route, "events.user.status");
    assert_eq!(config.socket.reconnect.max_attempts, 5);
    assert_eq!(config.database.max_connections, 20);
    assert_eq!(config.auth.http_timeout_seconds, 30);
}

#[test]
fn test_tracing_init_is_idempotent() {
    let config = AppConfig::load("test").unwrap();
    telemetry::init_tracing(&config.logging);
    // A second init must not panic the embedding process.
    telemetry::init_tracing(&config.logging);
}
