//! # Arena Client Library
//!
//! This library provides the client half of a real-time multiplayer arena
//! shooter. The server is authoritative: it simulates movement, bullets, hits
//! and deaths, and streams whole-world snapshots. The client connects, turns
//! player input into intents, and draws whatever the latest snapshot says.
//!
//! ## Architecture Overview
//!
//! Everything runs inside a single macroquad frame loop. Socket I/O lives on a
//! small background tokio runtime, but its results are only ever observed from
//! the frame loop, so none of the client state needs locking.
//!
//! ### No Prediction
//! The client never moves anything locally. Snapshots replace the previous
//! world wholesale, and the only local state is what the server cannot know
//! about: which keys are held, the in-progress aim drag, and the shot
//! cooldown.
//!
//! ### Categorized Reconnection
//! Socket closures are sorted by their close code. An expired session or a
//! vanished room ends the session immediately; anything else schedules a
//! bounded number of delayed reconnects.
//!
//! ## Module Organization
//!
//! ### Configuration (`config`)
//! Command line parsing and validated gameplay/connection settings.
//!
//! ### Network Module (`network`)
//! Websocket lifecycle:
//! - Endpoint construction from server address, room and session token
//! - Close-code categorization and reconnect scheduling
//! - Snapshot decoding and intent transmission
//!
//! ### Input Module (`input`)
//! Keyboard and pointer handling:
//! - Held-direction tracking with normalized diagonal movement
//! - Drag-to-aim shooting with distance clamping
//! - Shot cooldown on a fixed tick
//! - Respawn requests while dead
//!
//! ### Game Module (`game`)
//! Holds the latest snapshot and resolves the local player in it.
//!
//! ### Rendering Module (`rendering`)
//! Builds a frame of draw commands from the snapshot and local UI state, then
//! draws it with macroquad. Frame construction is pure and fully testable.
//!
//! ### Session (`app`)
//! Wires the pieces together for one room visit and decides when it ends.
//!
//! ## Usage Example
//!
//! ```no_run
//! use arena_client::app::GameSession;
//! use arena_client::config::{ConnectionConfig, GameConfig};
//! use arena_client::network::{ConnectTarget, WsConnector};
//!
//! async fn play() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = GameSession::new(
//!         WsConnector::new()?,
//!         GameConfig::default(),
//!         ConnectionConfig::default(),
//!         "alice",
//!     );
//!     let exit = session.run(ConnectTarget::new("room-1", "token")).await?;
//!     println!("{}", exit.message());
//!     Ok(())
//! }
//! ```
//!
//! ## Coordinate Spaces
//!
//! The server speaks in a fixed-size world (1920x1080 by default). The window
//! can be any size; every position crossing the boundary goes through
//! `shared::coords`, which scales each axis independently.

pub mod app;
pub mod config;
pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
