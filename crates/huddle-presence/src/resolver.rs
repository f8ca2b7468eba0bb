//! Precedence rules for incoming presence events.

use huddle_entity::presence::PresenceEvent;

/// How an incoming event must be applied to the status store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Write unconditionally; hard updates always win, including
    /// transitions into and out of the sticky set.
    Force,
    /// Write only if the persisted state is not sticky. A dropped write
    /// is expected, not exceptional.
    IfNotSticky,
}

/// Resolve the write mode for an event.
///
/// The resolver deliberately does not compare the event timestamp against
/// the persisted `last_seen`; ordering across independent publishers is
/// best-effort and a stale soft update self-heals on the next heartbeat.
pub fn resolve(event: &PresenceEvent) -> Resolution {
    if event.is_hard_update {
        Resolution::Force
    } else {
        Resolution::IfNotSticky
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use huddle_entity::presence::PresenceState;
    use uuid::Uuid;

    #[test]
    fn test_hard_update_forces() {
        let event = PresenceEvent::hard(Uuid::new_v4(), "alice", "s1", PresenceState::AppearAway);
        assert_eq!(resolve(&event), Resolution::Force);
    }

    #[test]
    fn test_soft_update_is_conditional() {
        let event = PresenceEvent::soft(Uuid::new_v4(), "alice", "s1", PresenceState::Away);
        assert_eq!(resolve(&event), Resolution::IfNotSticky);
    }

    #[test]
    fn test_hard_update_out_of_sticky_forces() {
        // Leaving the sticky set is still an explicit user action.
        let event = PresenceEvent::hard(Uuid::new_v4(), "alice", "s1", PresenceState::Online);
        assert_eq!(resolve(&event), Resolution::Force);
    }
}
