//! # Snake Game Server Library
//!
//! The authoritative server for the multiplayer snake game. It owns the one
//! true world, advances it at a fixed rate and streams the result to every
//! connected player over a line-oriented TCP protocol.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Movement, growth, wraparound, collisions, death and respawn all happen
//! here. Clients only send movement directives and mirror what they are told.
//!
//! ### Session Management
//! Connections join by sending a display name, receive their id, the world
//! size and the walls, and are dropped as soon as the transport reports a
//! failure. A dropped player's snake disappears on the following tick.
//!
//! ### State Broadcasting
//! Every `FramesPerShot` ticks the loop sends one record per snake and per
//! powerup to every session.
//!
//! ## Architecture Design
//!
//! ### Message Passing
//! Connection tasks never touch the world. They decode lines into
//! `GameCommand`s and queue them; the game loop drains the queue once per
//! tick. The latest movement directive per player wins.
//!
//! ### Locking
//! `WorldStore` keeps snakes and powerups behind separate locks and the
//! session registry sits behind a third. They are always taken in the order
//! snakes, powerups, sessions.
//!
//! ## Module Organization
//!
//! - `settings`: game rules loaded from JSON
//! - `world`: the shared world store and powerup pool
//! - `collision`: bounding-box queries against walls, snakes and powerups
//! - `spawn`: collision-free placement search
//! - `snake`: per-tick snake simulation and the turn rule
//! - `powerup`: timed spawning with id recycling
//! - `client_manager`: the session registry
//! - `network`: TCP accept loop and per-connection tasks
//! - `game`: the fixed-rate loop and its observers
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::game::{GameLoop, LogObserver};
//! use server::network::NetworkServer;
//! use server::settings::GameSettings;
//! use server::world::WorldStore;
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Arc::new(GameSettings::load("settings.json")?);
//!     let world = Arc::new(WorldStore::new(settings));
//!
//!     let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
//!     let mut game = GameLoop::new(world, 64, cmd_rx);
//!     game.add_observer(Box::new(LogObserver));
//!
//!     let network = NetworkServer::bind("0.0.0.0:11000").await?;
//!     tokio::spawn(network.run(cmd_tx));
//!     game.run().await;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod collision;
pub mod game;
pub mod network;
pub mod powerup;
pub mod settings;
pub mod snake;
pub mod spawn;
pub mod world;
