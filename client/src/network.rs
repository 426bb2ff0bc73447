//! Websocket connection lifecycle with categorized reconnection
//!
//! Socket I/O runs on a background tokio runtime, but every state change
//! happens on the caller's thread inside [`ConnectionManager::poll`]. The
//! reconnect timer is a deadline checked there too, so clearing it is all it
//! takes to cancel a pending reconnect.

use crate::config::ConnectionConfig;
use crate::input::IntentSink;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{
    ClientMessage, ProtocolError, Snapshot, CLOSE_SESSION_EXPIRED, CLOSE_TARGET_NOT_FOUND,
};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio_tungstenite::tungstenite::Message;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("invalid server endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("failed to start network runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
}

/// Room and session identity handed over by the login/room flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectTarget {
    pub target_id: String,
    pub session_token: String,
}

impl ConnectTarget {
    pub fn new(target_id: impl Into<String>, session_token: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            session_token: session_token.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    pub code: Option<u16>,
    pub reason: String,
}

impl CloseInfo {
    pub fn abnormal(reason: impl Into<String>) -> Self {
        Self {
            code: None,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Opened,
    Text(String),
    Closed(CloseInfo),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Close,
}

/// The manager's end of one socket
#[derive(Debug)]
pub struct SocketHandle {
    outbound: mpsc::UnboundedSender<Outbound>,
    inbound: mpsc::UnboundedReceiver<SocketEvent>,
}

/// The transport's end of one socket
#[derive(Debug)]
pub struct SocketPeer {
    events: mpsc::UnboundedSender<SocketEvent>,
    outbound: mpsc::UnboundedReceiver<Outbound>,
}

impl SocketHandle {
    pub fn channel() -> (SocketHandle, SocketPeer) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        (
            SocketHandle {
                outbound: outbound_tx,
                inbound: events_rx,
            },
            SocketPeer {
                events: events_tx,
                outbound: outbound_rx,
            },
        )
    }

    fn send(&self, message: Outbound) -> bool {
        self.outbound.send(message).is_ok()
    }

    fn try_next(&mut self) -> Option<SocketEvent> {
        match self.inbound.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(SocketEvent::Closed(CloseInfo::abnormal(
                "socket task ended",
            ))),
        }
    }
}

impl SocketPeer {
    /// Returns false once the manager has dropped its handle
    pub fn emit(&self, event: SocketEvent) -> bool {
        self.events.send(event).is_ok()
    }

    pub async fn recv_outbound(&mut self) -> Option<Outbound> {
        self.outbound.recv().await
    }

    pub fn try_outbound(&mut self) -> Option<Outbound> {
        self.outbound.try_recv().ok()
    }
}

/// Opens sockets; the seam between connection policy and transport
pub trait Connector {
    fn open(&mut self, endpoint: &Url) -> SocketHandle;
}

/// Real websocket transport, one task per socket on a private runtime
pub struct WsConnector {
    runtime: tokio::runtime::Runtime,
}

impl WsConnector {
    pub fn new() -> Result<Self, ConnectionError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("arena-net")
            .enable_all()
            .build()?;
        Ok(Self { runtime })
    }
}

impl Connector for WsConnector {
    fn open(&mut self, endpoint: &Url) -> SocketHandle {
        let (handle, peer) = SocketHandle::channel();
        self.runtime.spawn(run_socket(endpoint.to_string(), peer));
        handle
    }
}

async fn run_socket(endpoint: String, mut peer: SocketPeer) {
    let stream = match tokio_tungstenite::connect_async(endpoint.as_str()).await {
        Ok((stream, _)) => stream,
        Err(e) => {
            warn!("Failed to connect to {}: {}", endpoint, e);
            peer.emit(SocketEvent::Closed(CloseInfo::abnormal(e.to_string())));
            return;
        }
    };
    if !peer.emit(SocketEvent::Opened) {
        return;
    }

    let (mut sink, mut stream) = stream.split();

    let close = loop {
        tokio::select! {
            outbound = peer.recv_outbound() => match outbound {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        break CloseInfo::abnormal(e.to_string());
                    }
                }
                Some(Outbound::Close) | None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break CloseInfo {
                        code: Some(1000),
                        reason: "closed by client".to_string(),
                    };
                }
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    peer.emit(SocketEvent::Text(text));
                }
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => {
                        peer.emit(SocketEvent::Text(text));
                    }
                    Err(_) => debug!("Ignoring non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    break match frame {
                        Some(frame) => CloseInfo {
                            code: Some(u16::from(frame.code)),
                            reason: frame.reason.to_string(),
                        },
                        None => CloseInfo::abnormal("closed without status"),
                    };
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => break CloseInfo::abnormal(e.to_string()),
                None => break CloseInfo::abnormal("stream ended"),
            },
        }
    };

    peer.emit(SocketEvent::Closed(close));
}

/// `ws://{server}/ws/{target_id}?session_token={token}`
pub fn endpoint_for(server: &str, target: &ConnectTarget) -> Result<Url, ConnectionError> {
    let base = if server.contains("://") {
        server.to_string()
    } else {
        format!("ws://{}", server)
    };
    let invalid = |reason: String| ConnectionError::InvalidEndpoint {
        endpoint: server.to_string(),
        reason,
    };

    let mut url = Url::parse(&base).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    url.path_segments_mut()
        .map_err(|_| invalid("cannot carry a path".to_string()))?
        .pop_if_empty()
        .push("ws")
        .push(&target.target_id);
    url.query_pairs_mut()
        .clear()
        .append_pair("session_token", &target.session_token);
    Ok(url)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    SessionExpired,
    TargetNotFound,
    Reconnect,
    GiveUp,
}

/// What to do after a close, given how many reconnects were already scheduled
pub fn close_decision(code: Option<u16>, attempts: u32, max_attempts: u32) -> CloseDecision {
    match code {
        Some(CLOSE_SESSION_EXPIRED) => CloseDecision::SessionExpired,
        Some(CLOSE_TARGET_NOT_FOUND) => CloseDecision::TargetNotFound,
        _ if attempts < max_attempts => CloseDecision::Reconnect,
        _ => CloseDecision::GiveUp,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    Opened,
    Snapshot(Snapshot),
    ReconnectScheduled { attempt: u32, delay: Duration },
    SessionExpired,
    TargetNotFound,
    ReconnectsExhausted,
}

#[derive(Debug, Clone)]
struct ActiveTarget {
    target: ConnectTarget,
    endpoint: Url,
}

pub struct ConnectionManager<C: Connector> {
    connector: C,
    config: ConnectionConfig,
    state: ConnectionState,
    reconnect_attempts: u32,
    active: Option<ActiveTarget>,
    socket: Option<SocketHandle>,
    reconnect_at: Option<Instant>,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C, config: ConnectionConfig) -> Self {
        Self {
            connector,
            config,
            state: ConnectionState::Disconnected,
            reconnect_attempts: 0,
            active: None,
            socket: None,
            reconnect_at: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts
    }

    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_at.is_some()
    }

    pub fn target(&self) -> Option<&ConnectTarget> {
        self.active.as_ref().map(|active| &active.target)
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_reconnect_attempts
    }

    /// Replaces any existing socket with a fresh one to `target`
    pub fn connect(&mut self, target: ConnectTarget) -> Result<(), ConnectionError> {
        let endpoint = endpoint_for(&self.config.server, &target)?;
        self.close_socket();
        self.reconnect_at = None;
        self.active = Some(ActiveTarget { target, endpoint });
        self.open_socket();
        Ok(())
    }

    /// Safe to call repeatedly; cancels any pending reconnect
    pub fn disconnect(&mut self) {
        self.reconnect_at = None;
        self.close_socket();
        self.active = None;
        self.reconnect_attempts = 0;
        self.state = ConnectionState::Disconnected;
    }

    /// Drains socket events and fires a due reconnect
    pub fn poll(&mut self, now: Instant) -> Vec<ConnectionEvent> {
        let mut events = Vec::new();

        while let Some(event) = self.socket.as_mut().and_then(SocketHandle::try_next) {
            if let Some(event) = self.handle_socket_event(event, now) {
                events.push(event);
            }
        }

        if self.reconnect_at.is_some_and(|due| now >= due) {
            self.reconnect_at = None;
            self.open_socket();
        }

        events
    }

    fn handle_socket_event(&mut self, event: SocketEvent, now: Instant) -> Option<ConnectionEvent> {
        match event {
            SocketEvent::Opened => {
                info!("Connected to {}", self.describe_target());
                self.state = ConnectionState::Open;
                self.reconnect_attempts = 0;
                Some(ConnectionEvent::Opened)
            }
            SocketEvent::Text(payload) => match Snapshot::from_json(&payload) {
                Ok(snapshot) => Some(ConnectionEvent::Snapshot(snapshot)),
                Err(e) => {
                    warn!("Dropping malformed snapshot: {}", e);
                    None
                }
            },
            SocketEvent::Closed(close) => {
                self.socket = None;
                self.state = ConnectionState::Disconnected;
                Some(self.handle_close(close, now))
            }
        }
    }

    fn handle_close(&mut self, close: CloseInfo, now: Instant) -> ConnectionEvent {
        info!(
            "Connection closed (code {:?}): {}",
            close.code, close.reason
        );

        match close_decision(
            close.code,
            self.reconnect_attempts,
            self.config.max_reconnect_attempts,
        ) {
            CloseDecision::SessionExpired => {
                warn!("Session expired, re-authentication required");
                self.active = None;
                ConnectionEvent::SessionExpired
            }
            CloseDecision::TargetNotFound => {
                warn!("Room {} no longer exists", self.describe_target());
                self.active = None;
                ConnectionEvent::TargetNotFound
            }
            CloseDecision::Reconnect => {
                self.reconnect_attempts += 1;
                let delay = self.config.reconnect_delay;
                self.reconnect_at = Some(now + delay);
                info!(
                    "Reconnecting in {:?} (attempt {}/{})",
                    delay, self.reconnect_attempts, self.config.max_reconnect_attempts
                );
                ConnectionEvent::ReconnectScheduled {
                    attempt: self.reconnect_attempts,
                    delay,
                }
            }
            CloseDecision::GiveUp => {
                error!(
                    "Giving up after {} reconnection attempts",
                    self.reconnect_attempts
                );
                self.active = None;
                ConnectionEvent::ReconnectsExhausted
            }
        }
    }

    fn open_socket(&mut self) {
        let Some(active) = &self.active else {
            return;
        };
        info!("Connecting to {}", active.target.target_id);
        debug!("Endpoint {}", active.endpoint);
        self.socket = Some(self.connector.open(&active.endpoint));
        self.state = ConnectionState::Connecting;
    }

    /// The close request is handed to the socket task and the handle dropped,
    /// so the manager is disconnected as soon as this returns
    fn close_socket(&mut self) {
        if let Some(socket) = self.socket.take() {
            socket.send(Outbound::Close);
        }
        self.state = ConnectionState::Disconnected;
    }

    fn describe_target(&self) -> &str {
        self.active
            .as_ref()
            .map(|active| active.target.target_id.as_str())
            .unwrap_or("<none>")
    }
}

impl<C: Connector> IntentSink for ConnectionManager<C> {
    fn send_intent(&mut self, message: &ClientMessage) -> bool {
        if self.state != ConnectionState::Open {
            debug!("Not sending {:?}, connection is {:?}", message, self.state);
            return false;
        }
        let Some(socket) = &self.socket else {
            return false;
        };
        match message.to_json() {
            Ok(json) => socket.send(Outbound::Text(json)),
            Err(e) => {
                error!("{}", e);
                false
            }
        }
    }
}
