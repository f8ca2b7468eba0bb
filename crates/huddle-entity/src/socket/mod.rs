//! Socket wire message definitions shared by client and server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent by the client over a namespace connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Registration handshake after connect. Associates the socket with
    /// the authenticated identity and the rooms joined in this session.
    Register {
        /// User ID.
        uid: Uuid,
        /// Username.
        username: String,
        /// Socket ID assigned by the server welcome.
        socket_id: String,
        /// Rooms joined in this session.
        rooms: Vec<Uuid>,
    },
    /// Logout notice emitted before an intentional close, so the server
    /// can eagerly mark the user offline instead of waiting for a
    /// connection-drop timeout.
    Logout {
        /// User ID.
        uid: Uuid,
        /// Username.
        username: String,
        /// Socket ID of the closing connection.
        socket_id: String,
    },
    /// Pong response to a server ping.
    Pong {
        /// Echoed timestamp.
        timestamp: i64,
    },
}

/// Messages sent by the server over a namespace connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// First message after the transport opens; assigns the socket ID.
    Welcome {
        /// Server-assigned socket ID for this connection.
        socket_id: String,
    },
    /// Keepalive ping.
    Ping {
        /// Server timestamp.
        timestamp: i64,
    },
    /// Presence change fan-out for another user.
    PresenceChange {
        /// User ID.
        uid: Uuid,
        /// Username.
        username: String,
        /// New state as a lowercase string.
        state: String,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_wire_format() {
        let msg = ClientMessage::Register {
            uid: Uuid::new_v4(),
            username: "alice".to_string(),
            socket_id: "sock-7".to_string(),
            rooms: vec![],
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"register\""));
        let back: ClientMessage = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, ClientMessage::Register { .. }));
    }

    #[test]
    fn test_welcome_wire_format() {
        let json = r#"{"type":"welcome","socket_id":"sock-9"}"#;
        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        match msg {
            ServerMessage::Welcome { socket_id } => assert_eq!(socket_id, "sock-9"),
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
