//! # Territory Game Client Library
//!
//! A scripted player for the territory capture server. The client joins
//! with `HELLO`, waits for `START`, then claims random cells under its own
//! name until the server announces a winner or its attempt budget runs out.
//!
//! ## Module Organization
//!
//! - `config`: connection target, player name and pacing
//! - `game`: the client's belief about which cells it owns and move picking
//! - `network`: address resolution, connection and the protocol loop
//! - `error`: failure kinds and their process exit codes
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::config::ClientConfig;
//! use client::network::{connect, Client};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("alice");
//!     let stream = connect(&config).await?;
//!     let summary = Client::new(stream, config).run().await?;
//!     println!("{:?}", summary.outcome);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod game;
pub mod network;
