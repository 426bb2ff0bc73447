//! Process-start configuration for the arena client
//!
//! Every tunable the client depends on is parsed once from the command line,
//! validated, and then handed to components by value. Nothing here changes at
//! runtime.

use clap::Parser;
use shared::coords::Size;
use std::time::Duration;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Gameplay and drawing constants shared by input handling and rendering
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub world: Size,
    pub max_shoot_distance: f32,
    pub bullet_speed: f32,
    pub shoot_cooldown: Duration,
    pub cooldown_tick: Duration,
    pub player_speed: f32,
    pub player_radius: f32,
    pub bullet_radius: f32,
    pub max_hp: u32,
    pub aim_line_width: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            world: Size::new(shared::WORLD_WIDTH, shared::WORLD_HEIGHT),
            max_shoot_distance: shared::MAX_SHOOT_DISTANCE,
            bullet_speed: shared::BULLET_SPEED,
            shoot_cooldown: Duration::from_millis(shared::SHOOT_COOLDOWN_MS),
            cooldown_tick: Duration::from_millis(shared::COOLDOWN_TICK_MS),
            player_speed: shared::PLAYER_SPEED,
            player_radius: shared::PLAYER_RADIUS,
            bullet_radius: shared::BULLET_RADIUS,
            max_hp: shared::MAX_HP,
            aim_line_width: shared::AIM_LINE_WIDTH,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("world width", self.world.width),
            ("world height", self.world.height),
            ("max shoot distance", self.max_shoot_distance),
            ("bullet speed", self.bullet_speed),
            ("player speed", self.player_speed),
            ("player radius", self.player_radius),
            ("bullet radius", self.bullet_radius),
            ("max hp", self.max_hp as f32),
            ("cooldown tick", self.cooldown_tick.as_secs_f32()),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive { name, value });
            }
        }
        Ok(())
    }
}

/// Socket endpoint and reconnection policy
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionConfig {
    pub server: String,
    pub max_reconnect_attempts: u32,
    pub reconnect_delay: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            server: "127.0.0.1:3000".to_string(),
            max_reconnect_attempts: shared::MAX_RECONNECT_ATTEMPTS,
            reconnect_delay: Duration::from_millis(shared::RECONNECT_DELAY_MS),
        }
    }
}

impl ConnectionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.trim().is_empty() {
            return Err(ConfigError::Empty("server address"));
        }
        Ok(())
    }
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct ClientArgs {
    /// Game server address (host:port or a full ws:// URL)
    #[arg(short = 's', long, default_value = "127.0.0.1:3000")]
    pub server: String,

    /// Room to join
    #[arg(short = 'r', long)]
    pub room: String,

    /// Session token issued at login
    #[arg(short = 't', long)]
    pub token: String,

    /// Local player identifier as it appears in snapshots
    #[arg(short = 'p', long)]
    pub player: String,

    /// Window width
    #[arg(short = 'w', long, default_value = "1280")]
    pub width: i32,

    /// Window height (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "720")]
    pub height: i32,

    #[arg(long, default_value_t = shared::WORLD_WIDTH)]
    pub world_width: f32,

    #[arg(long, default_value_t = shared::WORLD_HEIGHT)]
    pub world_height: f32,

    /// Longest distance a shot may travel, in world units
    #[arg(long, default_value_t = shared::MAX_SHOOT_DISTANCE)]
    pub max_shoot_distance: f32,

    #[arg(long, default_value_t = shared::BULLET_SPEED)]
    pub bullet_speed: f32,

    #[arg(long, default_value_t = shared::SHOOT_COOLDOWN_MS)]
    pub shoot_cooldown_ms: u64,

    #[arg(long, default_value_t = shared::COOLDOWN_TICK_MS)]
    pub cooldown_tick_ms: u64,

    #[arg(long, default_value_t = shared::PLAYER_SPEED)]
    pub player_speed: f32,

    #[arg(long, default_value_t = shared::PLAYER_RADIUS)]
    pub player_radius: f32,

    #[arg(long, default_value_t = shared::BULLET_RADIUS)]
    pub bullet_radius: f32,

    #[arg(long, default_value_t = shared::MAX_HP)]
    pub max_hp: u32,

    #[arg(long, default_value_t = shared::MAX_RECONNECT_ATTEMPTS)]
    pub max_reconnect_attempts: u32,

    #[arg(long, default_value_t = shared::RECONNECT_DELAY_MS)]
    pub reconnect_delay_ms: u64,
}

impl ClientArgs {
    pub fn game_config(&self) -> Result<GameConfig, ConfigError> {
        let config = GameConfig {
            world: Size::new(self.world_width, self.world_height),
            max_shoot_distance: self.max_shoot_distance,
            bullet_speed: self.bullet_speed,
            shoot_cooldown: Duration::from_millis(self.shoot_cooldown_ms),
            cooldown_tick: Duration::from_millis(self.cooldown_tick_ms),
            player_speed: self.player_speed,
            player_radius: self.player_radius,
            bullet_radius: self.bullet_radius,
            max_hp: self.max_hp,
            ..GameConfig::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn connection_config(&self) -> Result<ConnectionConfig, ConfigError> {
        let config = ConnectionConfig {
            server: self.server.clone(),
            max_reconnect_attempts: self.max_reconnect_attempts,
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> ClientArgs {
        let mut argv = vec![
            "arena-client",
            "--room",
            "r1",
            "--token",
            "tok",
            "--player",
            "alice",
        ];
        argv.extend_from_slice(extra);
        ClientArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_match_shared_constants() {
        let args = parse(&[]);
        let game = args.game_config().unwrap();
        assert_eq!(game, GameConfig::default());

        let connection = args.connection_config().unwrap();
        assert_eq!(connection.max_reconnect_attempts, 5);
        assert_eq!(connection.reconnect_delay, Duration::from_secs(3));
    }

    #[test]
    fn test_overrides() {
        let args = parse(&["--shoot-cooldown-ms", "250", "--max-reconnect-attempts", "2"]);
        assert_eq!(
            args.game_config().unwrap().shoot_cooldown,
            Duration::from_millis(250)
        );
        assert_eq!(args.connection_config().unwrap().max_reconnect_attempts, 2);
    }

    #[test]
    fn test_session_identity_required() {
        assert!(ClientArgs::try_parse_from(["arena-client", "--room", "r1"]).is_err());
    }

    #[test]
    fn test_rejects_non_positive_values() {
        let args = parse(&["--bullet-speed", "0"]);
        assert_eq!(
            args.game_config(),
            Err(ConfigError::NotPositive {
                name: "bullet speed",
                value: 0.0
            })
        );

        let args = parse(&["--cooldown-tick-ms", "0"]);
        assert!(args.game_config().is_err());
    }

    #[test]
    fn test_rejects_empty_server() {
        let args = parse(&["--server", " "]);
        assert_eq!(
            args.connection_config(),
            Err(ConfigError::Empty("server address"))
        );
    }
}
