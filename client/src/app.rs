//! Per-frame composition of connection, input, state and rendering

use crate::config::{ConnectionConfig, GameConfig};
use crate::game::ClientGameState;
use crate::input::{ControlRequest, InputCapture, InputContext, InputController, InputEvent};
use crate::network::{ConnectTarget, ConnectionError, ConnectionEvent, ConnectionManager, Connector};
use crate::rendering::{self, Frame, FrameInput, Renderer};
use log::{info, warn};
use macroquad::prelude::{is_key_pressed, next_frame, KeyCode};
use shared::coords::Size;
use std::time::{Duration, Instant};

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    Left,
    SessionExpired,
    TargetNotFound,
    ConnectionLost,
}

impl SessionExit {
    pub fn message(&self) -> &'static str {
        match self {
            SessionExit::Left => "Left the room",
            SessionExit::SessionExpired => "Session expired, please log in again",
            SessionExit::TargetNotFound => "Room not found",
            SessionExit::ConnectionLost => "Connection lost",
        }
    }
}

pub struct GameSession<C: Connector> {
    connection: ConnectionManager<C>,
    input: InputController,
    game: ClientGameState,
    capture: InputCapture,
    renderer: Renderer,
    config: GameConfig,
    notice: Option<String>,
}

impl<C: Connector> GameSession<C> {
    pub fn new(
        connector: C,
        game_config: GameConfig,
        connection_config: ConnectionConfig,
        local_player_id: impl Into<String>,
    ) -> Self {
        Self {
            connection: ConnectionManager::new(connector, connection_config),
            input: InputController::new(game_config.clone()),
            game: ClientGameState::new(local_player_id),
            capture: InputCapture::new(),
            renderer: Renderer::new(),
            config: game_config,
            notice: None,
        }
    }

    pub fn connection(&self) -> &ConnectionManager<C> {
        &self.connection
    }

    pub fn game(&self) -> &ClientGameState {
        &self.game
    }

    pub fn input(&self) -> &InputController {
        &self.input
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn start(&mut self, target: ConnectTarget) -> Result<(), ConnectionError> {
        info!(
            "Joining room {} as {}",
            target.target_id,
            self.game.local_player_id()
        );
        self.connection.connect(target)?;
        self.notice = Some("Connecting...".to_string());
        Ok(())
    }

    /// One frame of work: network first, then input, then the cooldown timer.
    ///
    /// Returns the exit reason once the session is over; teardown has already
    /// run by then.
    pub fn step(
        &mut self,
        now: Instant,
        elapsed: Duration,
        events: &[InputEvent],
        render_size: Size,
    ) -> Option<SessionExit> {
        for event in self.connection.poll(now) {
            if let Some(exit) = self.apply_connection_event(event) {
                self.teardown();
                return Some(exit);
            }
        }

        for event in events {
            let context = InputContext {
                local_player: self.game.local_player(),
                render_size,
            };
            if let Some(ControlRequest::LeaveSession) =
                self.input.handle_event(*event, &context, &mut self.connection)
            {
                info!("Leaving room");
                self.teardown();
                return Some(SessionExit::Left);
            }
        }

        self.input.advance(elapsed);
        None
    }

    fn apply_connection_event(&mut self, event: ConnectionEvent) -> Option<SessionExit> {
        match event {
            ConnectionEvent::Opened => self.notice = None,
            ConnectionEvent::Snapshot(snapshot) => self.game.apply_snapshot(snapshot),
            ConnectionEvent::ReconnectScheduled { attempt, .. } => {
                self.notice = Some(format!(
                    "Connection lost, reconnecting ({}/{})...",
                    attempt,
                    self.connection.max_attempts()
                ));
            }
            ConnectionEvent::SessionExpired => return Some(SessionExit::SessionExpired),
            ConnectionEvent::TargetNotFound => return Some(SessionExit::TargetNotFound),
            ConnectionEvent::ReconnectsExhausted => return Some(SessionExit::ConnectionLost),
        }
        None
    }

    pub fn frame(&self, render_size: Size) -> Frame {
        let input = FrameInput {
            snapshot: self.game.snapshot(),
            local_player_id: self.game.local_player_id(),
            ui: self.input.ui_state(),
            render_size,
            notice: self.notice.as_deref(),
        };
        rendering::build_frame(&input, &self.config)
    }

    /// Safe to call more than once
    pub fn teardown(&mut self) {
        self.connection.disconnect();
        self.input.reset();
        self.game.clear();
        self.notice = None;
    }

    pub async fn run(mut self, target: ConnectTarget) -> Result<SessionExit, Box<dyn std::error::Error>> {
        self.start(target)?;

        let mut last_frame = Instant::now();
        let exit = loop {
            let now = Instant::now();
            let elapsed = now.duration_since(last_frame);
            last_frame = now;

            let render_size = self.renderer.surface_size();
            let events = self.capture.capture();
            if let Some(exit) = self.step(now, elapsed, &events, render_size) {
                break exit;
            }

            self.renderer.present(&self.frame(render_size));
            next_frame().await;
        };

        if exit != SessionExit::Left {
            warn!("Session ended: {}", exit.message());
            self.show_exit_notice(exit).await;
        }
        Ok(exit)
    }

    async fn show_exit_notice(&self, exit: SessionExit) {
        // Let the frame that ended the session flush its key presses first
        next_frame().await;
        loop {
            if is_key_pressed(KeyCode::Enter) || is_key_pressed(KeyCode::Escape) {
                break;
            }
            let frame = rendering::build_exit_frame(exit.message(), self.renderer.surface_size());
            self.renderer.present(&frame);
            next_frame().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Direction, Key};
    use crate::network::{CloseInfo, ConnectionState, Outbound, SocketEvent, SocketHandle, SocketPeer};
    use shared::coords::Vec2;
    use std::cell::RefCell;
    use std::rc::Rc;
    use url::Url;

    #[derive(Clone, Default)]
    struct FakeConnector {
        peers: Rc<RefCell<Vec<SocketPeer>>>,
    }

    impl Connector for FakeConnector {
        fn open(&mut self, _endpoint: &Url) -> SocketHandle {
            let (handle, peer) = SocketHandle::channel();
            self.peers.borrow_mut().push(peer);
            handle
        }
    }

    const SNAPSHOT: &str = r#"{
        "players": {
            "alice": {"x": 960.0, "y": 540.0, "hp": 1000, "status": "alive"},
            "bob": {"x": 100.0, "y": 100.0, "hp": 0, "status": "dead"}
        },
        "bullets": [],
        "room_info": {"name": "arena", "players_count": 2, "max_players": 8}
    }"#;

    fn render_size() -> Size {
        Size::new(1920.0, 1080.0)
    }

    fn session(player: &str) -> (GameSession<FakeConnector>, FakeConnector) {
        let connector = FakeConnector::default();
        let mut session = GameSession::new(
            connector.clone(),
            GameConfig::default(),
            ConnectionConfig {
                server: "127.0.0.1:3000".to_string(),
                max_reconnect_attempts: 1,
                reconnect_delay: Duration::from_millis(10),
            },
            player,
        );
        session.start(ConnectTarget::new("arena", "tok")).unwrap();
        (session, connector)
    }

    fn emit(connector: &FakeConnector, event: SocketEvent) {
        let peers = connector.peers.borrow();
        assert!(peers.last().unwrap().emit(event));
    }

    fn outbound(connector: &FakeConnector) -> Vec<String> {
        let mut peers = connector.peers.borrow_mut();
        let peer = peers.last_mut().unwrap();
        let mut sent = Vec::new();
        while let Some(Outbound::Text(text)) = peer.try_outbound() {
            sent.push(text);
        }
        sent
    }

    fn step(
        session: &mut GameSession<FakeConnector>,
        now: Instant,
        events: &[InputEvent],
    ) -> Option<SessionExit> {
        session.step(now, Duration::from_millis(16), events, render_size())
    }

    fn joined(player: &str) -> (GameSession<FakeConnector>, FakeConnector, Instant) {
        let (mut session, connector) = session(player);
        let now = Instant::now();
        emit(&connector, SocketEvent::Opened);
        emit(&connector, SocketEvent::Text(SNAPSHOT.to_string()));
        assert_eq!(step(&mut session, now, &[]), None);
        (session, connector, now)
    }

    #[test]
    fn test_snapshot_applied_and_notice_cleared() {
        let (session, _connector, _) = joined("alice");
        assert!(session.notice().is_none());
        assert_eq!(session.game().room_info().unwrap().name, "arena");
        assert!(session.game().local_player().unwrap().is_alive());

        let frame = session.frame(render_size());
        assert!(frame.texts().any(|t| t == "Room: arena  Players: 2/8"));
    }

    #[test]
    fn test_waiting_frame_before_first_snapshot() {
        let (session, _connector) = session("alice");
        let frame = session.frame(render_size());
        let texts: Vec<&str> = frame.texts().collect();
        assert!(texts.contains(&rendering::WAITING_TEXT));
        assert!(texts.contains(&"Connecting..."));
    }

    #[test]
    fn test_input_reaches_socket() {
        let (mut session, connector, now) = joined("alice");
        let events = [
            InputEvent::KeyDown(Key::Move(Direction::Right)),
            InputEvent::PointerDown(Vec2::new(960.0, 540.0)),
            InputEvent::PointerUp(Vec2::new(1160.0, 540.0)),
        ];
        assert_eq!(step(&mut session, now, &events), None);

        let sent = outbound(&connector);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], r#"{"type":"move","dx":5.0,"dy":0.0}"#);
        assert!(sent[1].starts_with(r#"{"type":"shoot","dx":20.0,"dy":0.0"#));
        assert!(session.input().cooldown().is_active());
    }

    #[test]
    fn test_respawn_only_when_dead() {
        let (mut alice, alice_connector, now) = joined("alice");
        step(&mut alice, now, &[InputEvent::KeyDown(Key::Respawn)]);
        assert!(outbound(&alice_connector).is_empty());

        let (mut bob, bob_connector, now) = joined("bob");
        step(&mut bob, now, &[InputEvent::KeyDown(Key::Respawn)]);
        assert_eq!(outbound(&bob_connector), vec![r#"{"type":"respawn"}"#.to_string()]);
    }

    #[test]
    fn test_leave_tears_down() {
        let (mut session, connector, now) = joined("alice");
        step(&mut session, now, &[InputEvent::PointerDown(Vec2::new(10.0, 10.0))]);

        let exit = step(&mut session, now, &[InputEvent::KeyDown(Key::Leave)]);
        assert_eq!(exit, Some(SessionExit::Left));
        assert_eq!(session.connection().state(), ConnectionState::Disconnected);
        assert!(session.game().snapshot().is_none());
        assert!(session.input().ui_state().drag.is_none());

        let mut peers = connector.peers.borrow_mut();
        assert_eq!(peers[0].try_outbound(), Some(Outbound::Close));
    }

    #[test]
    fn test_session_expired_exit() {
        let (mut session, connector, now) = joined("alice");
        emit(
            &connector,
            SocketEvent::Closed(CloseInfo {
                code: Some(shared::CLOSE_SESSION_EXPIRED),
                reason: "expired".to_string(),
            }),
        );
        assert_eq!(step(&mut session, now, &[]), Some(SessionExit::SessionExpired));
        assert!(!session.connection().reconnect_pending());
        assert_eq!(connector.peers.borrow().len(), 1);
    }

    #[test]
    fn test_target_not_found_exit() {
        let (mut session, connector, now) = joined("alice");
        emit(
            &connector,
            SocketEvent::Closed(CloseInfo {
                code: Some(shared::CLOSE_TARGET_NOT_FOUND),
                reason: String::new(),
            }),
        );
        assert_eq!(step(&mut session, now, &[]), Some(SessionExit::TargetNotFound));
    }

    #[test]
    fn test_reconnect_then_connection_lost() {
        let (mut session, connector, now) = joined("alice");

        emit(&connector, SocketEvent::Closed(CloseInfo::abnormal("reset")));
        assert_eq!(step(&mut session, now, &[]), None);
        assert_eq!(session.notice(), Some("Connection lost, reconnecting (1/1)..."));
        assert!(session.game().snapshot().is_some());

        let later = now + Duration::from_millis(20);
        assert_eq!(step(&mut session, later, &[]), None);
        assert_eq!(connector.peers.borrow().len(), 2);

        emit(&connector, SocketEvent::Closed(CloseInfo::abnormal("refused")));
        assert_eq!(step(&mut session, later, &[]), Some(SessionExit::ConnectionLost));
        assert!(session.game().snapshot().is_none());
    }

    #[test]
    fn test_exit_messages() {
        assert_eq!(SessionExit::TargetNotFound.message(), "Room not found");
        assert_ne!(
            SessionExit::SessionExpired.message(),
            SessionExit::ConnectionLost.message()
        );
    }
}
