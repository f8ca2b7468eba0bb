//! Redis pub/sub broker for multi-node deployments.
//!
//! Redis pub/sub has no persistence and no redelivery, which matches the
//! subsystem's best-effort delivery contract for presence events.

#[cfg(feature = "redis-pubsub")]
pub mod implementation {
    use async_trait::async_trait;
    use futures::StreamExt;
    use tokio::sync::mpsc;
    use tracing::{error, warn};

    use huddle_core::{AppError, AppResult};
    use huddle_entity::presence::PresenceEvent;

    use crate::{StatusPublisher, StatusSubscriber};

    /// Redis pub/sub broker for cross-node presence relay.
    #[derive(Debug, Clone)]
    pub struct RedisBroker {
        /// Redis URL.
        url: String,
        /// Buffer size for subscription channels.
        buffer_size: usize,
    }

    impl RedisBroker {
        /// Creates a new Redis broker.
        pub fn new(url: &str, buffer_size: usize) -> Self {
            Self {
                url: url.to_string(),
                buffer_size,
            }
        }
    }

    #[async_trait]
    impl StatusPublisher for RedisBroker {
        async fn publish(&self, route: &str, event: &PresenceEvent) -> AppResult<()> {
            let payload = serde_json::to_string(event)?;

            let client = redis::Client::open(self.url.as_str())
                .map_err(|e| AppError::broker(format!("Redis connection failed: {e}")))?;

            let mut conn = client
                .get_multiplexed_async_connection()
                .await
                .map_err(|e| AppError::broker(format!("Redis connection failed: {e}")))?;

            redis::cmd("PUBLISH")
                .arg(route)
                .arg(payload)
                .query_async::<i64>(&mut conn)
                .await
                .map_err(|e| AppError::broker(format!("Redis PUBLISH failed: {e}")))?;

            Ok(())
        }
    }

    #[async_trait]
    impl StatusSubscriber for RedisBroker {
        async fn subscribe(&self, route: &str) -> AppResult<mpsc::Receiver<PresenceEvent>> {
            let client = redis::Client::open(self.url.as_str())
                .map_err(|e| AppError::broker(format!("Redis connection failed: {e}")))?;

            let mut pubsub = client
                .get_async_pubsub()
                .await
                .map_err(|e| AppError::broker(format!("Redis pub/sub connection failed: {e}")))?;

            pubsub
                .subscribe(route)
                .await
                .map_err(|e| AppError::broker(format!("Redis SUBSCRIBE failed: {e}")))?;

            let (tx, rx) = mpsc::channel(self.buffer_size);
            let route = route.to_string();

            tokio::spawn(async move {
                let mut stream = pubsub.on_message();
                while let Some(msg) = stream.next().await {
                    let payload: String = match msg.get_payload() {
                        Ok(p) => p,
                        Err(e) => {
                            warn!(route = %route, error = %e, "Unreadable broker payload");
                            continue;
                        }
                    };
                    let event: PresenceEvent = match serde_json::from_str(&payload) {
                        Ok(e) => e,
                        Err(e) => {
                            warn!(route = %route, error = %e, "Malformed presence event dropped");
                            continue;
                        }
                    };
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                error!(route = %route, "Redis subscription stream ended");
            });

            Ok(rx)
        }
    }
}

#[cfg(not(feature = "redis-pubsub"))]
pub mod implementation {
    /// Stub Redis broker when the redis feature is disabled.
    #[derive(Debug, Clone)]
    pub struct RedisBroker;

    impl RedisBroker {
        /// Creates a stub broker.
        pub fn new(_url: &str, _buffer_size: usize) -> Self {
            Self
        }
    }
}

pub use implementation::RedisBroker;
