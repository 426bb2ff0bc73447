//! Player input normalization into movement, shot, and respawn intents

use crate::config::GameConfig;
use log::debug;
use macroquad::prelude::{
    get_keys_pressed, get_keys_released, is_mouse_button_down, is_mouse_button_pressed,
    is_mouse_button_released, mouse_position, KeyCode, MouseButton,
};
use shared::coords::{self, Size, Vec2};
use shared::{ClientMessage, PlayerState};
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Keys the client reacts to, normalized at the window boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Move(Direction),
    Respawn,
    Leave,
}

impl Key {
    pub fn from_keycode(code: KeyCode) -> Option<Key> {
        match code {
            KeyCode::W | KeyCode::Up => Some(Key::Move(Direction::Up)),
            KeyCode::S | KeyCode::Down => Some(Key::Move(Direction::Down)),
            KeyCode::A | KeyCode::Left => Some(Key::Move(Direction::Left)),
            KeyCode::D | KeyCode::Right => Some(Key::Move(Direction::Right)),
            KeyCode::R => Some(Key::Respawn),
            KeyCode::Escape => Some(Key::Leave),
            _ => None,
        }
    }
}

/// Pointer positions are in render space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    PointerDown(Vec2),
    PointerMove(Vec2),
    PointerUp(Vec2),
}

/// Requests the controller hands back to whoever owns the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    LeaveSession,
}

/// Outbound channel for intents; returns whether the message actually went out
pub trait IntentSink {
    fn send_intent(&mut self, message: &ClientMessage) -> bool;
}

/// World facts the controller needs at event time
#[derive(Debug, Clone, Copy)]
pub struct InputContext<'a> {
    pub local_player: Option<&'a PlayerState>,
    pub render_size: Size,
}

/// Local shot cooldown, floored at zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cooldown {
    remaining: Duration,
}

impl Cooldown {
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn is_active(&self) -> bool {
        !self.remaining.is_zero()
    }

    pub fn start(&mut self, full: Duration) {
        self.remaining = full;
    }

    pub fn tick(&mut self, period: Duration) {
        self.remaining = self.remaining.saturating_sub(period);
    }

    pub fn clear(&mut self) {
        self.remaining = Duration::ZERO;
    }
}

/// Converts variable frame time into whole fixed-period ticks
#[derive(Debug, Clone)]
pub struct FixedTicker {
    period: Duration,
    accumulated: Duration,
}

impl FixedTicker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            accumulated: Duration::ZERO,
        }
    }

    /// Returns how many full periods elapsed, carrying the remainder
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        if self.period.is_zero() {
            return 0;
        }
        self.accumulated += elapsed;
        let mut ticks = 0;
        while self.accumulated >= self.period {
            self.accumulated -= self.period;
            ticks += 1;
        }
        ticks
    }

    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
    }
}

/// Movement vector for the held directions; diagonals keep axial speed
pub fn movement_vector(pressed: &HashSet<Direction>, speed: f32) -> Vec2 {
    let mut dx = 0.0;
    let mut dy = 0.0;
    if pressed.contains(&Direction::Up) {
        dy -= speed;
    }
    if pressed.contains(&Direction::Down) {
        dy += speed;
    }
    if pressed.contains(&Direction::Left) {
        dx -= speed;
    }
    if pressed.contains(&Direction::Right) {
        dx += speed;
    }

    if dx != 0.0 && dy != 0.0 {
        dx /= std::f32::consts::SQRT_2;
        dy /= std::f32::consts::SQRT_2;
    }

    Vec2::new(dx, dy)
}

/// Projectile velocity from `from` toward `target`.
///
/// The raw vector is clamped to `max_distance` and then renormalized to
/// `speed`, so the result always has magnitude `speed`. `None` when the two
/// points coincide.
pub fn shot_vector(from: Vec2, target: Vec2, max_distance: f32, speed: f32) -> Option<Vec2> {
    (target - from).clamp_length(max_distance).with_length(speed)
}

/// Transient state the renderer overlays on top of the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocalUiState {
    pub drag: Option<Vec2>,
    pub cooldown_remaining: Duration,
}

/// Owns held keys, the aim drag, and the shot cooldown.
///
/// Every window event goes through [`InputController::handle_event`]; the
/// fixed-rate cooldown timer is driven by [`InputController::advance`].
pub struct InputController {
    config: GameConfig,
    pressed: HashSet<Direction>,
    drag: Option<Vec2>,
    cooldown: Cooldown,
    ticker: FixedTicker,
}

impl InputController {
    pub fn new(config: GameConfig) -> Self {
        let ticker = FixedTicker::new(config.cooldown_tick);
        Self {
            config,
            pressed: HashSet::new(),
            drag: None,
            cooldown: Cooldown::default(),
            ticker,
        }
    }

    pub fn handle_event<S: IntentSink>(
        &mut self,
        event: InputEvent,
        context: &InputContext<'_>,
        sink: &mut S,
    ) -> Option<ControlRequest> {
        match event {
            InputEvent::KeyDown(Key::Move(direction)) => {
                if self.pressed.insert(direction) {
                    self.send_movement(sink);
                }
            }
            InputEvent::KeyUp(Key::Move(direction)) => {
                if self.pressed.remove(&direction) {
                    self.send_movement(sink);
                }
            }
            InputEvent::KeyDown(Key::Respawn) => {
                if context.local_player.is_some_and(|player| !player.is_alive()) {
                    sink.send_intent(&ClientMessage::Respawn);
                }
            }
            InputEvent::KeyDown(Key::Leave) => return Some(ControlRequest::LeaveSession),
            InputEvent::KeyUp(_) => {}
            InputEvent::PointerDown(position) => self.drag = Some(position),
            InputEvent::PointerMove(position) => {
                if self.drag.is_some() {
                    self.drag = Some(position);
                }
            }
            InputEvent::PointerUp(position) => {
                if self.drag.take().is_some() {
                    self.release_shot(position, context, sink);
                }
            }
        }
        None
    }

    /// Runs the fixed-period cooldown timer for `elapsed` wall time
    pub fn advance(&mut self, elapsed: Duration) {
        let ticks = self.ticker.advance(elapsed);
        for _ in 0..ticks {
            self.cooldown.tick(self.config.cooldown_tick);
        }
    }

    pub fn ui_state(&self) -> LocalUiState {
        LocalUiState {
            drag: self.drag,
            cooldown_remaining: self.cooldown.remaining(),
        }
    }

    pub fn cooldown(&self) -> Cooldown {
        self.cooldown
    }

    pub fn reset(&mut self) {
        self.pressed.clear();
        self.drag = None;
        self.cooldown.clear();
        self.ticker.reset();
    }

    fn send_movement<S: IntentSink>(&self, sink: &mut S) {
        let velocity = movement_vector(&self.pressed, self.config.player_speed);
        sink.send_intent(&ClientMessage::Move {
            dx: velocity.x,
            dy: velocity.y,
        });
    }

    fn release_shot<S: IntentSink>(
        &mut self,
        pointer: Vec2,
        context: &InputContext<'_>,
        sink: &mut S,
    ) {
        if self.cooldown.is_active() {
            debug!("Shot discarded, cooldown {:?} left", self.cooldown.remaining());
            return;
        }
        let Some(me) = context.local_player.filter(|player| player.is_alive()) else {
            return;
        };
        if context.render_size.is_degenerate() {
            return;
        }

        let target = coords::to_world(pointer, context.render_size, self.config.world);
        let Some(velocity) = shot_vector(
            Vec2::new(me.x, me.y),
            target,
            self.config.max_shoot_distance,
            self.config.bullet_speed,
        ) else {
            return;
        };

        let message = ClientMessage::Shoot {
            dx: velocity.x,
            dy: velocity.y,
            max_dist: self.config.max_shoot_distance,
        };
        if sink.send_intent(&message) {
            self.cooldown.start(self.config.shoot_cooldown);
        }
    }
}

/// Polls macroquad once per frame and turns raw state into [`InputEvent`]s
#[derive(Debug, Default)]
pub struct InputCapture {
    last_pointer: Option<(f32, f32)>,
}

impl InputCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capture(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();

        for code in get_keys_pressed() {
            if let Some(key) = Key::from_keycode(code) {
                events.push(InputEvent::KeyDown(key));
            }
        }
        for code in get_keys_released() {
            if let Some(key) = Key::from_keycode(code) {
                events.push(InputEvent::KeyUp(key));
            }
        }

        let (x, y) = mouse_position();
        let pointer = Vec2::new(x, y);
        if is_mouse_button_pressed(MouseButton::Left) {
            events.push(InputEvent::PointerDown(pointer));
        } else if is_mouse_button_down(MouseButton::Left) && self.last_pointer != Some((x, y)) {
            events.push(InputEvent::PointerMove(pointer));
        }
        if is_mouse_button_released(MouseButton::Left) {
            events.push(InputEvent::PointerUp(pointer));
        }
        self.last_pointer = Some((x, y));

        events
    }
}
