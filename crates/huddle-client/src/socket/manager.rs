//! Socket manager — owns one persistent connection per namespace.

use std::sync::Arc;

use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use huddle_core::config::socket::SocketConfig;
use huddle_core::{AppError, AppResult};
use huddle_entity::socket::{ClientMessage, ServerMessage};

use crate::context::ClientContext;
use crate::session::SessionManager;

use super::backoff;
use super::{ConnectionState, DisconnectReason, Namespace};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Handle to the live connection of one namespace.
#[derive(Debug, Clone)]
struct ActiveConnection {
    /// Queue of messages for the writer half.
    outbound_tx: mpsc::Sender<ClientMessage>,
    /// Cancels the connection task and any pending reconnect.
    cancel: CancellationToken,
}

/// Shared state behind the cheaply clonable [`SocketManager`] handle.
#[derive(Debug)]
struct SocketShared {
    /// Socket configuration.
    config: SocketConfig,
    /// Token owner.
    session: Arc<SessionManager>,
    /// Shared client state.
    context: Arc<ClientContext>,
    /// Namespace → observable connection state.
    states: DashMap<Namespace, watch::Sender<ConnectionState>>,
    /// Namespace → live connection handle.
    active: DashMap<Namespace, ActiveConnection>,
}

/// Owns the connect, handshake, disconnect-classification, and
/// reconnection lifecycle for every namespace.
///
/// The access token is read from the session manager at dial time, never
/// cached. A normal close triggers a refresh-then-reconnect cycle through
/// a bounded backoff loop; an abnormal close degrades the namespace to
/// [`ConnectionState::NeedsRefresh`] without retrying.
#[derive(Debug, Clone)]
pub struct SocketManager {
    inner: Arc<SocketShared>,
}

impl SocketManager {
    /// Create a manager over the given session and context.
    pub fn new(
        config: SocketConfig,
        session: Arc<SessionManager>,
        context: Arc<ClientContext>,
    ) -> Self {
        Self {
            inner: Arc::new(SocketShared {
                config,
                session,
                context,
                states: DashMap::new(),
                active: DashMap::new(),
            }),
        }
    }

    /// Watch the connection state of a namespace.
    pub fn watch_state(&self, namespace: Namespace) -> watch::Receiver<ConnectionState> {
        self.inner
            .states
            .entry(namespace)
            .or_insert_with(|| watch::channel(ConnectionState::Disconnected).0)
            .subscribe()
    }

    /// Current connection state of a namespace.
    pub fn state(&self, namespace: Namespace) -> ConnectionState {
        *self
            .inner
            .states
            .entry(namespace)
            .or_insert_with(|| watch::channel(ConnectionState::Disconnected).0)
            .borrow()
    }

    /// Open the namespace connection: dial, await the welcome, register,
    /// and start the connection task.
    ///
    /// An initial connect failure leaves the namespace `Disconnected` and
    /// returns the error; automatic retries only run on the reconnect
    /// path after an established connection closes normally.
    pub async fn connect(&self, namespace: Namespace) -> AppResult<()> {
        self.set_state(namespace, ConnectionState::Connecting);

        match self.establish(namespace).await {
            Ok(stream) => {
                self.install(namespace, stream);
                Ok(())
            }
            Err(e) => {
                self.set_state(namespace, ConnectionState::Disconnected);
                Err(e)
            }
        }
    }

    /// Close the namespace connection intentionally.
    ///
    /// On the `users` namespace a logout notice is queued first, so the
    /// server can eagerly mark the user offline. Cancels any in-flight
    /// reconnect sequence: an explicit disconnect always wins.
    pub async fn disconnect(&self, namespace: Namespace) {
        let Some(handle) = self.inner.active.get(&namespace).map(|h| h.clone()) else {
            self.set_state(namespace, ConnectionState::Disconnected);
            return;
        };

        if namespace == Namespace::Users {
            if let Some(socket_id) = self.inner.context.socket_id().await {
                let identity = self.inner.context.identity();
                let notice = ClientMessage::Logout {
                    uid: identity.uid,
                    username: identity.username.clone(),
                    socket_id,
                };
                // Queued ahead of the cancel so the writer drains it first.
                let _ = handle.outbound_tx.send(notice).await;
            }
        }

        handle.cancel.cancel();
        self.inner.active.remove(&namespace);
    }

    /// Queue a message on the namespace connection.
    pub async fn send(&self, namespace: Namespace, message: ClientMessage) -> AppResult<()> {
        let handle = self
            .inner
            .active
            .get(&namespace)
            .map(|h| h.clone())
            .ok_or_else(|| AppError::transport(format!("Namespace {namespace} not connected")))?;

        handle
            .outbound_tx
            .send(message)
            .await
            .map_err(|_| AppError::transport(format!("Namespace {namespace} writer closed")))
    }

    fn set_state(&self, namespace: Namespace, state: ConnectionState) {
        debug!(namespace = %namespace, state = ?state, "Socket state change");
        let sender = self
            .inner
            .states
            .entry(namespace)
            .or_insert_with(|| watch::channel(ConnectionState::Disconnected).0);
        let _ = sender.send(state);
    }

    /// Dial the namespace URL and run the handshake.
    async fn establish(&self, namespace: Namespace) -> AppResult<WsStream> {
        // Read the token at dial time; never reuse a value captured
        // before an await point.
        let token = self
            .inner
            .session
            .access_token()
            .await
            .ok_or_else(|| AppError::authentication("No access token for socket connect"))?;

        let url = format!(
            "{}/{}?token={}",
            self.inner.config.base_url, namespace, token
        );
        let handshake_timeout = self.inner.config.handshake_timeout();

        let (mut stream, _response) =
            tokio::time::timeout(handshake_timeout, connect_async(url.as_str()))
                .await
                .map_err(|_| AppError::transport("Socket connect timed out"))?
                .map_err(|e| AppError::transport(format!("Socket connect failed: {e}")))?;

        let socket_id = tokio::time::timeout(handshake_timeout, await_welcome(&mut stream))
            .await
            .map_err(|_| AppError::transport("Welcome handshake timed out"))??;

        if namespace == Namespace::Users {
            self.inner.context.set_socket_id(&socket_id).await;

            let identity = self.inner.context.identity();
            let register = ClientMessage::Register {
                uid: identity.uid,
                username: identity.username.clone(),
                socket_id: socket_id.clone(),
                rooms: self.inner.context.rooms().await,
            };
            let text = serde_json::to_string(&register)?;
            stream
                .send(Message::text(text))
                .await
                .map_err(|e| AppError::transport(format!("Registration send failed: {e}")))?;
        }

        info!(
            namespace = %namespace,
            socket_id = %socket_id,
            "Socket connected"
        );
        Ok(stream)
    }

    /// Hand an established stream to a fresh connection task.
    fn install(&self, namespace: Namespace, stream: WsStream) {
        let (outbound_tx, outbound_rx) = mpsc::channel(32);
        let cancel = CancellationToken::new();

        self.inner.active.insert(
            namespace,
            ActiveConnection {
                outbound_tx,
                cancel: cancel.clone(),
            },
        );
        self.set_state(namespace, ConnectionState::Connected);

        let manager = self.clone();
        tokio::spawn(async move {
            manager
                .run_connection(namespace, stream, outbound_rx, cancel)
                .await;
        });
    }

    /// Pump the connection until it ends, then classify and react.
    async fn run_connection(
        &self,
        namespace: Namespace,
        mut stream: WsStream,
        mut outbound_rx: mpsc::Receiver<ClientMessage>,
        cancel: CancellationToken,
    ) {
        let reason = loop {
            tokio::select! {
                // Drain queued messages (logout notices in particular)
                // before honoring cancellation.
                biased;

                queued = outbound_rx.recv() => {
                    let Some(message) = queued else {
                        break DisconnectReason::ClientDisconnect;
                    };
                    let text = match serde_json::to_string(&message) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(namespace = %namespace, error = %e, "Unserializable outbound message dropped");
                            continue;
                        }
                    };
                    if let Err(e) = stream.send(Message::text(text)).await {
                        break DisconnectReason::TransportClose(e.to_string());
                    }
                }

                _ = cancel.cancelled() => {
                    let _ = stream.close(None).await;
                    break DisconnectReason::ClientDisconnect;
                }

                frame = stream.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_frame(namespace, text.as_str(), &mut stream).await;
                        }
                        Some(Ok(Message::Close(_))) => break DisconnectReason::ServerDisconnect,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => break DisconnectReason::TransportClose(e.to_string()),
                        None => break DisconnectReason::TransportClose("transport close".to_string()),
                    }
                }
            }
        };

        debug!(namespace = %namespace, reason = ?reason, "Socket connection ended");
        self.handle_disconnect(namespace, reason, cancel).await;
    }

    async fn handle_frame(&self, namespace: Namespace, text: &str, stream: &mut WsStream) {
        match serde_json::from_str::<ServerMessage>(text) {
            Ok(ServerMessage::Ping { timestamp }) => {
                let pong = ClientMessage::Pong { timestamp };
                if let Ok(text) = serde_json::to_string(&pong) {
                    let _ = stream.send(Message::text(text)).await;
                }
            }
            Ok(ServerMessage::Welcome { .. }) => {
                // Already consumed during the handshake; a repeat is noise.
                debug!(namespace = %namespace, "Unexpected duplicate welcome");
            }
            Ok(ServerMessage::PresenceChange { uid, state, .. }) => {
                debug!(namespace = %namespace, uid = %uid, state = %state, "Peer presence change");
            }
            Err(e) => {
                debug!(namespace = %namespace, error = %e, "Unparseable server frame dropped");
            }
        }
    }

    /// Classify the ended connection and drive the recovery policy.
    async fn handle_disconnect(
        &self,
        namespace: Namespace,
        reason: DisconnectReason,
        cancel: CancellationToken,
    ) {
        if namespace == Namespace::Users {
            self.inner.context.clear_socket_id().await;
        }

        if cancel.is_cancelled() {
            // Explicit disconnect; the logout notice already went out.
            self.set_state(namespace, ConnectionState::Disconnected);
            return;
        }

        if !reason.is_normal() {
            warn!(
                namespace = %namespace,
                reason = ?reason,
                "Abnormal socket disconnect, connectivity degraded"
            );
            self.inner.active.remove(&namespace);
            self.set_state(namespace, ConnectionState::NeedsRefresh);
            return;
        }

        if !self.inner.context.auth().can_reconnect() {
            info!(namespace = %namespace, "Not reconnecting: session is no longer authenticated");
            self.inner.active.remove(&namespace);
            self.set_state(namespace, ConnectionState::Disconnected);
            return;
        }

        self.set_state(namespace, ConnectionState::Reconnecting);
        self.reconnect_with_backoff(namespace, cancel).await;
    }

    /// Refresh-then-reconnect under a bounded backoff schedule.
    async fn reconnect_with_backoff(&self, namespace: Namespace, cancel: CancellationToken) {
        let policy = &self.inner.config.reconnect;

        for attempt in 1..=policy.max_attempts {
            let delay = backoff::delay_for(policy, attempt);
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(namespace = %namespace, "Reconnect abandoned: explicit disconnect");
                    self.set_state(namespace, ConnectionState::Disconnected);
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            if !self.inner.context.auth().can_reconnect() {
                info!(namespace = %namespace, "Reconnect abandoned: logged out mid-sequence");
                self.set_state(namespace, ConnectionState::Disconnected);
                return;
            }

            if let Err(e) = self.inner.session.refresh().await {
                warn!(
                    namespace = %namespace,
                    attempt,
                    error = %e,
                    "Session refresh failed during reconnect"
                );
                continue;
            }

            match self.establish(namespace).await {
                Ok(stream) => {
                    info!(namespace = %namespace, attempt, "Reconnected");
                    self.install(namespace, stream);
                    return;
                }
                Err(e) => {
                    warn!(
                        namespace = %namespace,
                        attempt,
                        error = %e,
                        "Reconnect attempt failed"
                    );
                }
            }
        }

        warn!(
            namespace = %namespace,
            attempts = policy.max_attempts,
            "Reconnect attempts exhausted, connectivity degraded"
        );
        self.inner.active.remove(&namespace);
        self.set_state(namespace, ConnectionState::NeedsRefresh);
    }
}

/// Read frames until the server welcome arrives.
async fn await_welcome(stream: &mut WsStream) -> AppResult<String> {
    while let Some(frame) = stream.next().await {
        let frame =
            frame.map_err(|e| AppError::transport(format!("Handshake read failed: {e}")))?;
        if let Message::Text(text) = frame {
            if let ServerMessage::Welcome { socket_id } = serde_json::from_str(text.as_str())? {
                return Ok(socket_id);
            }
        }
    }
    Err(AppError::transport("Socket closed during handshake"))
}
