//! Socket namespace lifecycle: state machine and disconnect taxonomy.

pub mod backoff;
pub mod manager;

use std::fmt;

/// A logically separate real-time channel multiplexed over the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// User presence and identity registration.
    Users,
    /// Chat rooms.
    Rooms,
    /// Direct messages.
    Dms,
}

impl Namespace {
    /// Path segment for this namespace.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Rooms => "rooms",
            Self::Dms => "dms",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Observable per-namespace connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection and none in progress.
    Disconnected,
    /// Dial and handshake in progress.
    Connecting,
    /// Connection established and registered.
    Connected,
    /// Normal close seen; refresh-then-reconnect cycle running.
    Reconnecting,
    /// Degraded: reconnection was not attempted or gave up. The
    /// application surfaces this as a "could not reach server" notice;
    /// user action is required.
    NeedsRefresh,
}

/// Classified reason a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The server closed the connection cleanly.
    ServerDisconnect,
    /// Local code closed the connection cleanly.
    ClientDisconnect,
    /// The transport dropped without a close handshake (network blip,
    /// server crash).
    TransportClose(String),
}

impl DisconnectReason {
    /// Whether this close is a normal, non-error termination that
    /// permits an automatic refresh-then-reconnect cycle.
    pub fn is_normal(&self) -> bool {
        matches!(self, Self::ServerDisconnect | Self::ClientDisconnect)
    }
}
