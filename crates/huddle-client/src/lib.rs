//! # huddle-client
//!
//! Client side of the Huddle presence subsystem. Provides:
//!
//! - [`SessionManager`] — access-token lifecycle with transparent
//!   refresh-and-retry on expiry
//! - [`SocketManager`] — one persistent connection per namespace with
//!   disconnect classification and bounded reconnection
//! - [`ActivityDetector`] — active/idle classification from the input
//!   event stream
//! - [`PresenceDispatcher`] — fire-and-forget publication of presence
//!   events onto the status route
//!
//! All components share a [`ClientContext`] holding the identity, the
//! current socket ID, the local presence mirror, and the authentication
//! snapshot.

pub mod activity;
pub mod context;
pub mod dispatcher;
pub mod session;
pub mod socket;

pub use activity::{ActivityDetector, ActivitySignal};
pub use context::{AuthSnapshot, ClientContext, ClientIdentity};
pub use dispatcher::PresenceDispatcher;
pub use session::SessionManager;
pub use socket::manager::SocketManager;
pub use socket::{ConnectionState, DisconnectReason, Namespace};
