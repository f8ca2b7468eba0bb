//! Presence update dispatcher — fire-and-forget publication.

use std::sync::Arc;

use tracing::warn;

use huddle_broker::StatusPublisher;
use huddle_core::config::broker::BrokerConfig;
use huddle_entity::presence::{PresenceEvent, PresenceState};

use crate::context::ClientContext;

/// Publishes presence changes onto the status route.
///
/// Stateless: reads the identity and the active socket ID from the
/// context, stamps the event with the current wall-clock time, and
/// publishes. No acknowledgment is awaited; presence is best-effort.
#[derive(Debug)]
pub struct PresenceDispatcher {
    /// Broker publisher.
    publisher: Arc<dyn StatusPublisher>,
    /// Shared client state.
    context: Arc<ClientContext>,
    /// Status route.
    route: String,
}

impl PresenceDispatcher {
    /// Create a dispatcher publishing on the configured status route.
    pub fn new(
        publisher: Arc<dyn StatusPublisher>,
        context: Arc<ClientContext>,
        config: &BrokerConfig,
    ) -> Self {
        Self {
            publisher,
            context,
            route: config.status_route.clone(),
        }
    }

    /// Publish a soft (activity-derived) update.
    pub async fn dispatch_soft(&self, state: PresenceState) {
        self.publish(state, false).await;
    }

    /// Publish a hard (user-chosen) update, e.g. "Appear Busy".
    ///
    /// The local mirror is written first so the activity detector's
    /// suppression stays consistent with what the user chose.
    pub async fn dispatch_hard(&self, state: PresenceState) {
        self.context.set_local_state(state).await;
        self.publish(state, true).await;
    }

    async fn publish(&self, state: PresenceState, is_hard_update: bool) {
        let identity = self.context.identity();
        let socket_id = self.context.socket_id().await.unwrap_or_default();

        let event = if is_hard_update {
            PresenceEvent::hard(identity.uid, &identity.username, &socket_id, state)
        } else {
            PresenceEvent::soft(identity.uid, &identity.username, &socket_id, state)
        };

        if let Err(e) = self.publisher.publish(&self.route, &event).await {
            warn!(
                state = %state,
                is_hard_update,
                error = %e,
                "Presence publish failed, dropping event"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use huddle_broker::{MemoryBroker, STATUS_ROUTE, StatusSubscriber};
    use uuid::Uuid;

    use crate::context::ClientIdentity;

    fn dispatcher_with_broker() -> (PresenceDispatcher, Arc<MemoryBroker>, Arc<ClientContext>) {
        let broker = Arc::new(MemoryBroker::new(16));
        let context = Arc::new(ClientContext::new(ClientIdentity {
            uid: Uuid::new_v4(),
            username: "alice".to_string(),
        }));
        let dispatcher = PresenceDispatcher::new(
            broker.clone(),
            context.clone(),
            &BrokerConfig::default(),
        );
        (dispatcher, broker, context)
    }

    #[tokio::test]
    async fn test_hard_dispatch_sets_local_mirror() {
        let (dispatcher, broker, context) = dispatcher_with_broker();
        let mut rx = broker.subscribe(STATUS_ROUTE).await.unwrap();

        dispatcher.dispatch_hard(PresenceState::AppearAway).await;

        assert_eq!(context.local_state().await, PresenceState::AppearAway);
        let event = rx.recv().await.unwrap();
        assert!(event.is_hard_update);
        assert_eq!(event.state, PresenceState::AppearAway);
    }

    #[tokio::test]
    async fn test_soft_dispatch_carries_socket_id() {
        let (dispatcher, broker, context) = dispatcher_with_broker();
        let mut rx = broker.subscribe(STATUS_ROUTE).await.unwrap();
        context.set_socket_id("sock-42").await;

        dispatcher.dispatch_soft(PresenceState::Online).await;

        let event = rx.recv().await.unwrap();
        assert!(!event.is_hard_update);
        assert_eq!(event.socket_id, "sock-42");
    }
}
