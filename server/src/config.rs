//! Runtime configuration for the game server

use crate::error::ServerError;
use shared::{quorum_for, DEFAULT_PORT, MAX_GRID_SIZE, MIN_GRID_SIZE};
use std::time::Duration;

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(500);

/// Settings shared by every server component
///
/// Built by the binary from command-line arguments, or directly by tests.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host or address to bind the listener to
    pub host: String,
    /// Listening port, 0 picks an ephemeral one
    pub port: u16,
    /// Side length of the square grid
    pub grid_size: usize,
    /// Maximum number of concurrently admitted players
    pub max_players: usize,
    /// Pause between two whole-grid win checks
    pub check_interval: Duration,
}

impl ServerConfig {
    /// Creates a configuration with defaults for everything except the grid size
    ///
    /// The player cap defaults to the grid's side length.
    pub fn new(grid_size: usize) -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            grid_size,
            max_players: grid_size,
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }

    pub fn quorum(&self) -> usize {
        quorum_for(self.grid_size)
    }

    /// Number of cells the grid allocates, `None` if it does not fit in `usize`
    pub fn cell_count(&self) -> Option<usize> {
        self.grid_size.checked_mul(self.grid_size)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Rejects configurations under which a game could never start
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.grid_size < MIN_GRID_SIZE {
            return Err(ServerError::InvalidConfig(format!(
                "grid size must be at least {}, got {}",
                MIN_GRID_SIZE, self.grid_size
            )));
        }
        if self.grid_size > MAX_GRID_SIZE || self.cell_count().is_none() {
            return Err(ServerError::InvalidConfig(format!(
                "grid size must be at most {}, got {}",
                MAX_GRID_SIZE, self.grid_size
            )));
        }
        if self.max_players == 0 {
            return Err(ServerError::InvalidConfig(
                "max players must be at least 1".to_string(),
            ));
        }
        if self.max_players < self.quorum() {
            return Err(ServerError::InvalidConfig(format!(
                "max players ({}) is below the start quorum ({})",
                self.max_players,
                self.quorum()
            )));
        }
        if self.check_interval.is_zero() {
            return Err(ServerError::InvalidConfig(
                "check interval must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
