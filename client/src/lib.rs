//! # Snake Game Client Library
//!
//! A headless client for the multiplayer snake server. It speaks the line
//! protocol, mirrors the server's world and reports what happens to anyone
//! who registers an observer.
//!
//! ## Module Organization
//!
//! ### Controller Module (`controller`)
//! The protocol state machine: player id, then world size, then walls and
//! per-tick snake and powerup records. Keeps a `shared::World` mirror and
//! turns movement keys into directives.
//!
//! ### Network Module (`network`)
//! Owns the TCP connection. Sends the player name on connect, feeds every
//! received chunk to the controller and writes directives back.
//!
//! ### Input Module (`input`)
//! An autopilot that looks ahead of the snake's head and steers around
//! walls and other snakes.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::controller::GameController;
//! use client::input::InputManager;
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::connect("127.0.0.1:11000", "bot", GameController::new()).await?;
//!     let mut input = InputManager::default();
//!
//!     loop {
//!         client.poll().await?;
//!
//!         let key = match (client.controller().world(), client.controller().player_snake()) {
//!             (Some(world), Some(me)) => input.decide(world, me),
//!             _ => None,
//!         };
//!         if let Some(key) = key {
//!             client.send_key(key).await?;
//!         }
//!     }
//! }
//! ```

pub mod controller;
pub mod input;
pub mod network;
