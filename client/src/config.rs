use shared::DEFAULT_PORT;
use std::time::Duration;

pub const DEFAULT_ATTEMPTS: usize = 64;
pub const DEFAULT_DELAY: Duration = Duration::from_millis(50);

/// Settings for one scripted player
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Name written into every claimed cell
    pub player_name: String,
    /// Number of commands to send after START before giving up
    pub attempts: usize,
    /// Pause between two commands
    pub delay: Duration,
    /// Every n-th command is a STATUS query instead of a claim; 0 disables queries
    pub status_every: usize,
    /// Fixed RNG seed for reproducible move sequences
    pub seed: Option<u64>,
}

impl ClientConfig {
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            player_name: player_name.into(),
            attempts: DEFAULT_ATTEMPTS,
            delay: DEFAULT_DELAY,
            status_every: 4,
            seed: None,
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
