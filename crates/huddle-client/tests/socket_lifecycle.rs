//! Integration tests for the socket namespace lifecycle against a
//! loopback WebSocket listener.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};
use uuid::Uuid;

use huddle_client::{
    AuthSnapshot, ClientContext, ClientIdentity, ConnectionState, Namespace, SessionManager,
    SocketManager,
};
use huddle_core::config::auth::AuthConfig;
use huddle_core::config::socket::{ReconnectConfig, SocketConfig};
use huddle_entity::session::TokenPair;

type ServerWs = WebSocketStream<TcpStream>;

async fn accept_and_welcome(listener: &TcpListener, socket_id: &str) -> ServerWs {
    let (tcp, _) = listener.accept().await.unwrap();
    let mut ws = accept_async(tcp).await.unwrap();
    ws.send(Message::text(format!(
        r#"{{"type":"welcome","socket_id":"{socket_id}"}}"#
    )))
    .await
    .unwrap();
    ws
}

async fn read_json(ws: &mut ServerWs) -> Value {
    while let Some(frame) = ws.next().await {
        if let Message::Text(text) = frame.unwrap() {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
    panic!("connection ended before a text frame arrived");
}

/// Minimal refresh endpoint so the reconnect path can renew the session.
async fn spawn_refresh_endpoint() -> SocketAddr {
    let app = Router::new().route(
        "/auth/access-token",
        get(|| async { Json(json!({ "access_token": "renewed-token" })) }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client_parts(
    ws_addr: SocketAddr,
    refresh_addr: SocketAddr,
) -> (SocketManager, Arc<ClientContext>) {
    let auth_config = AuthConfig {
        refresh_endpoint: format!("http://{refresh_addr}/auth/access-token"),
        ..AuthConfig::default()
    };
    let session = Arc::new(
        SessionManager::with_tokens(
            &auth_config,
            TokenPair::new("socket-token", "refresh-token"),
        )
        .unwrap(),
    );

    let context = Arc::new(ClientContext::new(ClientIdentity {
        uid: Uuid::new_v4(),
        username: "alice".to_string(),
    }));
    context.set_auth(AuthSnapshot {
        authenticated: true,
        email_verified: true,
    });

    let socket_config = SocketConfig {
        base_url: format!("ws://{ws_addr}"),
        handshake_timeout_seconds: 5,
        reconnect: ReconnectConfig {
            max_attempts: 3,
            base_delay_ms: 10,
            max_delay_ms: 50,
        },
    };

    let manager = SocketManager::new(socket_config, session, context.clone());
    (manager, context)
}

async fn wait_for_socket_id(context: &ClientContext, expected: &str) -> bool {
    for _ in 0..100 {
        if context.socket_id().await.as_deref() == Some(expected) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn test_connect_welcomes_and_registers() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let ws_addr = listener.local_addr().unwrap();
    let refresh_addr = spawn_refresh_endpoint().await;

    let (hold_tx, hold_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let mut ws = accept_and_welcome(&listener, "srv-1").await;
        let register = read_json(&mut ws).await;
        let _ = hold_rx.await;
        register
    });

    let (manager, context) = client_parts(ws_addr, refresh_addr);
    manager.connect(Namespace::Users).await.unwrap();

    assert_eq!(manager.state(Namespace::Users), ConnectionState::Connected);
    assert_eq!(context.socket_id().await.as_deref(), Some("srv-1"));

    let _ = hold_tx.send(());
    let register = server.await.unwrap();
    assert_eq!(register["type"], "register");
    assert_eq!(register["username"], "alice");
    assert_eq!(register["socket_id"], "srv-1");
}

#[tokio::test]
async fn test_server_close_refreshes_and_reconnects() {
    // A clean server close while authenticated and verified leads to
    // refresh + reconnect, and the new socket ID is dispatched.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let ws_addr = listener.local_addr().unwrap();
    let refresh_addr = spawn_refresh_endpoint().await;

    let (hold_tx, hold_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let mut first = accept_and_welcome(&listener, "srv-1").await;
        let _register = read_json(&mut first).await;
        first.close(None).await.unwrap();
        // Drain until the close handshake completes.
        while first.next().await.is_some() {}

        let mut second = accept_and_welcome(&listener, "srv-2").await;
        let register = read_json(&mut second).await;
        let _ = hold_rx.await;
        register
    });

    let (manager, context) = client_parts(ws_addr, refresh_addr);
    manager.connect(Namespace::Users).await.unwrap();

    assert!(wait_for_socket_id(&context, "srv-2").await);
    assert_eq!(manager.state(Namespace::Users), ConnectionState::Connected);

    let _ = hold_tx.send(());
    let register = server.await.unwrap();
    assert_eq!(register["socket_id"], "srv-2");
}

#[tokio::test]
async fn test_transport_drop_degrades_without_reconnect() {
    // An abnormal drop flips to NeedsRefresh with no automatic retry.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let ws_addr = listener.local_addr().unwrap();
    let refresh_addr = spawn_refresh_endpoint().await;

    let server = tokio::spawn(async move {
        let mut ws = accept_and_welcome(&listener, "srv-1").await;
        let _register = read_json(&mut ws).await;
        // Drop the TCP stream with no close handshake.
        drop(ws);
        listener
    });

    let (manager, context) = client_parts(ws_addr, refresh_addr);
    manager.connect(Namespace::Users).await.unwrap();

    let mut state_rx = manager.watch_state(Namespace::Users);
    let degraded = tokio::time::timeout(
        Duration::from_secs(2),
        state_rx.wait_for(|s| *s == ConnectionState::NeedsRefresh),
    )
    .await;
    assert!(degraded.is_ok(), "expected NeedsRefresh after transport drop");
    assert!(context.socket_id().await.is_none());

    // No reconnect attempt should reach the listener.
    let listener = server.await.unwrap();
    let second = tokio::time::timeout(Duration::from_millis(200), listener.accept()).await;
    assert!(second.is_err(), "unexpected reconnect after abnormal drop");
}

#[tokio::test]
async fn test_disconnect_emits_logout_notice() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let ws_addr = listener.local_addr().unwrap();
    let refresh_addr = spawn_refresh_endpoint().await;

    let server = tokio::spawn(async move {
        let mut ws = accept_and_welcome(&listener, "srv-1").await;
        let _register = read_json(&mut ws).await;
        let logout = read_json(&mut ws).await;
        while ws.next().await.is_some() {}
        logout
    });

    let (manager, context) = client_parts(ws_addr, refresh_addr);
    manager.connect(Namespace::Users).await.unwrap();
    assert!(wait_for_socket_id(&context, "srv-1").await);

    manager.disconnect(Namespace::Users).await;

    let logout = server.await.unwrap();
    assert_eq!(logout["type"], "logout");
    assert_eq!(logout["socket_id"], "srv-1");

    let mut state_rx = manager.watch_state(Namespace::Users);
    let disconnected = tokio::time::timeout(
        Duration::from_secs(2),
        state_rx.wait_for(|s| *s == ConnectionState::Disconnected),
    )
    .await;
    assert!(disconnected.is_ok(), "expected Disconnected after logout");
    assert!(context.socket_id().await.is_none());
}
