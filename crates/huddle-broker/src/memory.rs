//! In-memory pub/sub for single-node deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::sync::{broadcast, mpsc};
use tracing::warn;

use huddle_core::AppResult;
use huddle_entity::presence::PresenceEvent;

use crate::{StatusPublisher, StatusSubscriber};

/// In-memory broker backed by tokio broadcast channels.
///
/// A publish with no live subscribers is silently discarded, and a
/// subscriber that lags past the buffer loses the overwritten events.
#[derive(Debug)]
pub struct MemoryBroker {
    /// Route → broadcast sender.
    routes: RwLock<HashMap<String, broadcast::Sender<PresenceEvent>>>,
    /// Buffer size for each route channel.
    buffer_size: usize,
}

impl MemoryBroker {
    /// Create a new in-memory broker.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            routes: RwLock::new(HashMap::new()),
            buffer_size,
        }
    }

    async fn sender(&self, route: &str) -> broadcast::Sender<PresenceEvent> {
        let mut routes = self.routes.write().await;
        routes
            .entry(route.to_string())
            .or_insert_with(|| broadcast::channel(self.buffer_size).0)
            .clone()
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl StatusPublisher for MemoryBroker {
    async fn publish(&self, route: &str, event: &PresenceEvent) -> AppResult<()> {
        let routes = self.routes.read().await;
        if let Some(tx) = routes.get(route) {
            // A send error means no live subscribers; best-effort, drop it.
            let _ = tx.send(event.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl StatusSubscriber for MemoryBroker {
    async fn subscribe(&self, route: &str) -> AppResult<mpsc::Receiver<PresenceEvent>> {
        let mut broadcast_rx = self.sender(route).await.subscribe();
        let (tx, rx) = mpsc::channel(self.buffer_size);
        let route = route.to_string();

        tokio::spawn(async move {
            loop {
                match broadcast_rx.recv().await {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(route = %route, skipped, "Subscriber lagged, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use huddle_entity::presence::PresenceState;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let broker = MemoryBroker::new(16);
        let mut rx = broker.subscribe(crate::STATUS_ROUTE).await.unwrap();

        let event = PresenceEvent::soft(Uuid::new_v4(), "alice", "s1", PresenceState::Online);
        broker.publish(crate::STATUS_ROUTE, &event).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.uid, event.uid);
        assert_eq!(received.state, PresenceState::Online);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_dropped() {
        let broker = MemoryBroker::new(16);
        let event = PresenceEvent::soft(Uuid::new_v4(), "alice", "s1", PresenceState::Away);
        // No subscriber on the route; publish must still succeed.
        broker.publish(crate::STATUS_ROUTE, &event).await.unwrap();
    }

    #[tokio::test]
    async fn test_routes_are_isolated() {
        let broker = MemoryBroker::new(16);
        let mut rx = broker.subscribe("events.user.status").await.unwrap();

        let event = PresenceEvent::soft(Uuid::new_v4(), "bob", "s2", PresenceState::Online);
        broker.publish("events.room.activity", &event).await.unwrap();

        // Nothing should arrive on the status route.
        let outcome =
            tokio::time::timeout(std::time::Duration::from_millis(50), rx.recv()).await;
        assert!(outcome.is_err());
    }
}
