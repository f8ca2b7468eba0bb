//! Presence domain entities.

pub mod event;
pub mod model;

pub use event::PresenceEvent;
pub use model::UserStatusRecord;

use serde::{Deserialize, Serialize};

/// Presence state for a user.
///
/// `Online`, `Away`, `Busy`, and `Offline` are derived automatically from
/// activity; the `Appear*` variants are user-chosen overrides ("sticky")
/// and are immune to soft overwrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "presence_state", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PresenceState {
    /// User is actively interacting.
    Online,
    /// User is logged in but idle.
    Away,
    /// User is busy (derived, e.g. in a call).
    Busy,
    /// User is not connected.
    Offline,
    /// User chose to appear away.
    AppearAway,
    /// User chose to appear busy.
    AppearBusy,
    /// User chose to appear offline.
    AppearOffline,
}

impl PresenceState {
    /// Whether this state is a user-chosen override that soft updates may
    /// never displace.
    pub fn is_sticky(&self) -> bool {
        matches!(self, Self::AppearAway | Self::AppearBusy | Self::AppearOffline)
    }

    /// Whether the user is considered reachable.
    pub fn is_online(&self) -> bool {
        !matches!(self, Self::Offline | Self::AppearOffline)
    }

    /// Return the state as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Away => "away",
            Self::Busy => "busy",
            Self::Offline => "offline",
            Self::AppearAway => "appear_away",
            Self::AppearBusy => "appear_busy",
            Self::AppearOffline => "appear_offline",
        }
    }
}

impl std::fmt::Display for PresenceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresenceState {
    type Err = huddle_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "online" => Ok(Self::Online),
            "away" => Ok(Self::Away),
            "busy" => Ok(Self::Busy),
            "offline" => Ok(Self::Offline),
            "appear_away" => Ok(Self::AppearAway),
            "appear_busy" => Ok(Self::AppearBusy),
            "appear_offline" => Ok(Self::AppearOffline),
            _ => Err(huddle_core::AppError::validation(format!(
                "Invalid presence state: '{s}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sticky_set() {
        assert!(PresenceState::AppearAway.is_sticky());
        assert!(PresenceState::AppearBusy.is_sticky());
        assert!(PresenceState::AppearOffline.is_sticky());
        assert!(!PresenceState::Online.is_sticky());
        assert!(!PresenceState::Away.is_sticky());
        assert!(!PresenceState::Offline.is_sticky());
    }

    #[test]
    fn test_from_str_round_trip() {
        for state in [
            PresenceState::Online,
            PresenceState::AppearOffline,
            PresenceState::Busy,
        ] {
            assert_eq!(state.as_str().parse::<PresenceState>().unwrap(), state);
        }
        assert!("invisible".parse::<PresenceState>().is_err());
    }

    #[test]
    fn test_appear_offline_is_not_online() {
        assert!(!PresenceState::AppearOffline.is_online());
        assert!(PresenceState::AppearBusy.is_online());
    }
}
