//! # Territory Game Server Library
//!
//! Players connect over TCP, join with `HELLO`, and once enough players are
//! present they race to claim cells of a square grid by name. The first
//! moment every cell carries the same name, that name wins.
//!
//! ## Architecture
//!
//! Each accepted connection runs its own [`session::Session`] task. Sessions
//! never exchange messages; they coordinate only through three shared
//! structures:
//!
//! - [`game::GridStore`]: `size * size` cells, each behind its own async
//!   mutex. Claims use a non-blocking `try_lock` and answer `INUSE` when the
//!   cell is held; status queries wait for the lock.
//! - [`client_manager::AdmissionGate`]: the player cap and start quorum.
//!   Waiting sessions are woken by the gate instead of polling it.
//! - [`outcome::OutcomeSlot`]: the winner's name, written once.
//!
//! A single [`outcome::OutcomeWatcher`] task periodically locks the whole
//! grid in row-major order, checks for a single owner and publishes the
//! winner. Sessions check the slot before handling each command.
//!
//! [`network::Server`] binds the listener, spawns sessions into a `JoinSet`
//! and reaps them as they finish.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind(ServerConfig::new(8)).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod error;
pub mod game;
pub mod network;
pub mod outcome;
pub mod session;
