//! Presence consumer — applies broker events to the status store.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use huddle_core::AppResult;
use huddle_entity::presence::{PresenceEvent, UserStatusRecord};

use crate::resolver::{Resolution, resolve};
use crate::store::StatusStore;

/// Consumes presence events from the status route and applies them to the
/// status store under the precedence rules.
///
/// Instances may run concurrently across processes; each invocation of
/// [`apply`] processes one event to completion. The conditional write in
/// the store is the only coordination between racing consumers.
///
/// [`apply`]: PresenceConsumer::apply
#[derive(Debug, Clone)]
pub struct PresenceConsumer {
    /// Durable status persistence.
    store: Arc<dyn StatusStore>,
}

impl PresenceConsumer {
    /// Create a consumer over the given store.
    pub fn new(store: Arc<dyn StatusStore>) -> Self {
        Self { store }
    }

    /// Apply a single event.
    ///
    /// Idempotent: re-delivering the same event is safe. A store write
    /// failure is logged by the caller loop and surfaced to the delivery
    /// layer through the returned error.
    pub async fn apply(&self, event: &PresenceEvent) -> AppResult<UserStatusRecord> {
        match resolve(event) {
            Resolution::Force => {
                let record = self
                    .store
                    .force_update(event.uid, event.state, event.last_seen)
                    .await?;
                debug!(
                    uid = %event.uid,
                    username = %event.username,
                    state = %event.state,
                    "Hard presence update applied"
                );
                Ok(record)
            }
            Resolution::IfNotSticky => {
                let record = self
                    .store
                    .update_if_not_sticky(event.uid, event.state, event.last_seen)
                    .await?;
                if record.state != event.state {
                    debug!(
                        uid = %event.uid,
                        requested = %event.state,
                        persisted = %record.state,
                        "Soft presence update dropped for sticky state"
                    );
                }
                Ok(record)
            }
        }
    }

    /// Consume events until the subscription closes or cancellation fires.
    ///
    /// Store failures are logged at error level and the event is given up;
    /// with the non-durable route configuration redelivery is opportunistic,
    /// not guaranteed.
    pub async fn run(
        &self,
        mut events: mpsc::Receiver<PresenceEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                maybe_event = events.recv() => {
                    let Some(event) = maybe_event else { break };
                    if let Err(e) = self.apply(&event).await {
                        error!(
                            uid = %event.uid,
                            state = %event.state,
                            error = %e,
                            "Failed to persist presence update"
                        );
                    }
                }
            }
        }
        debug!("Presence consumer stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;
    use uuid::Uuid;

    use huddle_entity::presence::PresenceState;

    use crate::store::MemoryStatusStore;

    fn consumer_with_store() -> (PresenceConsumer, Arc<MemoryStatusStore>) {
        let store = Arc::new(MemoryStatusStore::new());
        (PresenceConsumer::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_soft_update_applies_to_non_sticky_state() {
        // An online user going idle: the soft away lands.
        let (consumer, _store) = consumer_with_store();
        let uid = Uuid::new_v4();

        let online = PresenceEvent::soft(uid, "alice", "s1", PresenceState::Online);
        consumer.apply(&online).await.unwrap();

        let away = PresenceEvent::soft(uid, "alice", "s1", PresenceState::Away);
        let record = consumer.apply(&away).await.unwrap();
        assert_eq!(record.state, PresenceState::Away);
    }

    #[tokio::test]
    async fn test_sticky_state_repels_soft_updates() {
        // A user-chosen override repels every soft update.
        let (consumer, store) = consumer_with_store();
        let uid = Uuid::new_v4();

        let appear_busy = PresenceEvent::hard(uid, "alice", "s1", PresenceState::AppearBusy);
        consumer.apply(&appear_busy).await.unwrap();

        for state in [PresenceState::Away, PresenceState::Online, PresenceState::Offline] {
            let soft = PresenceEvent::soft(uid, "alice", "s1", state);
            let record = consumer.apply(&soft).await.unwrap();
            assert_eq!(record.state, PresenceState::AppearBusy);
        }

        let persisted = store.get_status(uid).await.unwrap().unwrap();
        assert_eq!(persisted.state, PresenceState::AppearBusy);
    }

    #[tokio::test]
    async fn test_hard_update_always_overwrites() {
        // Hard updates win regardless of the current state.
        let (consumer, _store) = consumer_with_store();
        let uid = Uuid::new_v4();

        consumer
            .apply(&PresenceEvent::hard(uid, "alice", "s1", PresenceState::AppearOffline))
            .await
            .unwrap();

        let record = consumer
            .apply(&PresenceEvent::hard(uid, "alice", "s1", PresenceState::Online))
            .await
            .unwrap();
        assert_eq!(record.state, PresenceState::Online);
    }

    #[tokio::test]
    async fn test_duplicate_delivery_is_idempotent() {
        // Redelivering the same event must not change the outcome.
        let (consumer, _store) = consumer_with_store();
        let uid = Uuid::new_v4();

        let event = PresenceEvent {
            uid,
            username: "alice".to_string(),
            socket_id: "s1".to_string(),
            state: PresenceState::Away,
            last_seen: Utc::now(),
            is_hard_update: false,
        };

        let first = consumer.apply(&event).await.unwrap();
        let second = consumer.apply(&event).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.state, second.state);
        assert_eq!(first.last_seen, second.last_seen);
    }

    #[tokio::test]
    async fn test_hard_update_leaves_sticky_set() {
        let (consumer, _store) = consumer_with_store();
        let uid = Uuid::new_v4();

        consumer
            .apply(&PresenceEvent::hard(uid, "alice", "s1", PresenceState::AppearAway))
            .await
            .unwrap();
        consumer
            .apply(&PresenceEvent::hard(uid, "alice", "s1", PresenceState::Online))
            .await
            .unwrap();

        // Soft updates flow again once the override is lifted.
        let record = consumer
            .apply(&PresenceEvent::soft(uid, "alice", "s1", PresenceState::Away))
            .await
            .unwrap();
        assert_eq!(record.state, PresenceState::Away);
    }
}
