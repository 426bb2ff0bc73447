//! Wire protocol and world constants shared by the arena client crates
//!
//! The server pushes one JSON [`Snapshot`] per tick and the client answers with
//! [`ClientMessage`] intents. Everything here is plain data; the [`coords`]
//! module holds the pure mapping between world space and render space.

pub mod coords;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const WORLD_WIDTH: f32 = 1920.0;
pub const WORLD_HEIGHT: f32 = 1080.0;
pub const MAX_SHOOT_DISTANCE: f32 = 800.0;
pub const BULLET_SPEED: f32 = 20.0;
pub const PLAYER_SPEED: f32 = 5.0;
pub const PLAYER_RADIUS: f32 = 30.0;
pub const BULLET_RADIUS: f32 = 8.0;
pub const MAX_HP: u32 = 1000;
pub const AIM_LINE_WIDTH: f32 = 30.0;

pub const SHOOT_COOLDOWN_MS: u64 = 1000;
pub const COOLDOWN_TICK_MS: u64 = 100;
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
pub const RECONNECT_DELAY_MS: u64 = 3000;

/// Close code the server uses when the session token is expired or invalid
pub const CLOSE_SESSION_EXPIRED: u16 = 4001;
/// Close code the server uses when the requested room does not exist
pub const CLOSE_TARGET_NOT_FOUND: u16 = 4004;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("failed to encode client message: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode snapshot: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Intents sent from the client to the server, one JSON object per message
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Move { dx: f32, dy: f32 },
    Shoot { dx: f32, dy: f32, max_dist: f32 },
    Respawn,
}

impl ClientMessage {
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    #[default]
    Alive,
    Dead,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerState {
    pub x: f32,
    pub y: f32,
    pub hp: i32,
    #[serde(default)]
    pub status: PlayerStatus,
    #[serde(default)]
    pub kills: u32,
}

impl PlayerState {
    pub fn is_alive(&self) -> bool {
        self.status == PlayerStatus::Alive
    }

    /// Health as a fraction of `max_hp`, clamped into `[0, 1]`
    pub fn health_ratio(&self, max_hp: u32) -> f32 {
        if max_hp == 0 {
            return 0.0;
        }
        (self.hp as f32 / max_hp as f32).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BulletState {
    pub x: f32,
    pub y: f32,
    pub owner: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RoomInfo {
    pub name: String,
    pub players_count: u32,
    pub max_players: u32,
}

/// One authoritative description of the arena, replaced wholesale on every message
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Snapshot {
    #[serde(default)]
    pub players: HashMap<String, PlayerState>,
    #[serde(default)]
    pub bullets: Vec<BulletState>,
    #[serde(default)]
    pub room_info: Option<RoomInfo>,
}

impl Snapshot {
    pub fn from_json(payload: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(payload).map_err(ProtocolError::Decode)
    }

    pub fn player(&self, id: &str) -> Option<&PlayerState> {
        self.players.get(id)
    }
}
