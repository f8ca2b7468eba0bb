//! # huddle-broker
//!
//! Status-event pub/sub for the Huddle presence subsystem. Provides:
//!
//! - [`StatusPublisher`] / [`StatusSubscriber`] traits over a topic route
//! - An in-memory broker for single-node deployments and tests
//! - A Redis pub/sub broker behind the `redis-pubsub` feature for
//!   multi-node deployments
//!
//! Delivery is best-effort by design: publishes are fire-and-forget and
//! slow subscribers drop messages. Presence favors low latency over
//! guaranteed delivery; a missed update self-heals on the next heartbeat.

pub mod memory;
pub mod redis_pubsub;

pub use memory::MemoryBroker;
pub use redis_pubsub::RedisBroker;

use async_trait::async_trait;
use tokio::sync::mpsc;

use huddle_core::AppResult;
use huddle_entity::presence::PresenceEvent;

/// Topic route carrying user status events.
pub const STATUS_ROUTE: &str = "events.user.status";

/// Publishes presence events onto a topic route.
#[async_trait]
pub trait StatusPublisher: Send + Sync + std::fmt::Debug {
    /// Publish one event. No acknowledgment is awaited; callers treat a
    /// returned error as a logged non-fatal condition.
    async fn publish(&self, route: &str, event: &PresenceEvent) -> AppResult<()>;
}

/// Subscribes to presence events on a topic route.
#[async_trait]
pub trait StatusSubscriber: Send + Sync + std::fmt::Debug {
    /// Open a subscription. The receiver yields events until the broker
    /// shuts down or the subscription lags too far behind and is dropped.
    async fn subscribe(&self, route: &str) -> AppResult<mpsc::Receiver<PresenceEvent>>;
}
