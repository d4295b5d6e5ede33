//! Client-side view of the game and move selection

use log::debug;
use rand::Rng;
use shared::{Command, Reply};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientStage {
    Connecting,
    WaitingForStart,
    Playing,
    Finished,
}

/// How a client run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameOutcome {
    /// Server was full
    Rejected,
    /// Server announced a winner
    Ended { winner: String },
    /// Attempt budget ran out before the game was decided
    OutOfMoves,
}

/// Tallies reported once the client stops
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSummary {
    pub outcome: GameOutcome,
    pub grid_size: Option<usize>,
    pub claims: usize,
    pub contentions: usize,
    pub errors: usize,
    /// Cells this client believes it still owns
    pub owned: usize,
}

/// What the client knows about the grid
///
/// Ownership is last-write-wins on the server, so `owned` is only a belief:
/// it is corrected whenever a STATUS query shows another name.
#[derive(Debug)]
pub struct ClientGameState {
    player_name: String,
    status_every: usize,
    grid_size: Option<usize>,
    stage: ClientStage,
    owned: HashSet<(usize, usize)>,
    moves: usize,
    claims: usize,
    contentions: usize,
    errors: usize,
}

impl ClientGameState {
    pub fn new(player_name: impl Into<String>, status_every: usize) -> Self {
        Self {
            player_name: player_name.into(),
            status_every,
            grid_size: None,
            stage: ClientStage::Connecting,
            owned: HashSet::new(),
            moves: 0,
            claims: 0,
            contentions: 0,
            errors: 0,
        }
    }

    pub fn stage(&self) -> ClientStage {
        self.stage
    }

    pub fn grid_size(&self) -> Option<usize> {
        self.grid_size
    }

    pub fn owned_cells(&self) -> usize {
        self.owned.len()
    }

    pub fn joined(&mut self, grid_size: usize) {
        self.grid_size = Some(grid_size);
        self.stage = ClientStage::WaitingForStart;
    }

    pub fn started(&mut self) {
        self.stage = ClientStage::Playing;
    }

    pub fn finish(&mut self) {
        self.stage = ClientStage::Finished;
    }

    /// Picks the next command to send
    ///
    /// Claims target cells not believed to be ours yet; every
    /// `status_every`-th move instead checks a cell we think we hold.
    /// Returns `None` before the grid size is known.
    pub fn next_move<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Command> {
        let size = self.grid_size.filter(|size| *size > 0)?;
        self.moves += 1;

        if self.status_every > 0 && self.moves % self.status_every == 0 && !self.owned.is_empty() {
            let index = rng.gen_range(0..self.owned.len());
            if let Some(&(x, y)) = self.owned.iter().nth(index) {
                return Some(Command::Status { x, y });
            }
        }

        let free: Vec<(usize, usize)> = (0..size)
            .flat_map(|y| (0..size).map(move |x| (x, y)))
            .filter(|cell| !self.owned.contains(cell))
            .collect();

        let (x, y) = if free.is_empty() {
            (rng.gen_range(0..size), rng.gen_range(0..size))
        } else {
            free[rng.gen_range(0..free.len())]
        };

        Some(Command::Take {
            x,
            y,
            name: self.player_name.clone(),
        })
    }

    /// Updates the local view from the server's answer to `command`
    pub fn record_reply(&mut self, command: &Command, reply: &Reply) {
        match (command, reply) {
            (Command::Take { x, y, .. }, Reply::Taken) => {
                self.claims += 1;
                self.owned.insert((*x, *y));
            }
            (Command::Take { .. }, Reply::InUse) => {
                self.contentions += 1;
            }
            (Command::Status { x, y }, Reply::Owner(owner)) => {
                if *owner != self.player_name && self.owned.remove(&(*x, *y)) {
                    debug!("Lost ({}, {}) to '{}'", x, y, owner);
                }
            }
            (_, Reply::End(_)) => self.finish(),
            (_, Reply::Error(_)) => self.errors += 1,
            _ => {}
        }
    }

    pub fn summary(&self, outcome: GameOutcome) -> GameSummary {
        GameSummary {
            outcome,
            grid_size: self.grid_size,
            claims: self.claims,
            contentions: self.contentions,
            errors: self.errors,
            owned: self.owned.len(),
        }
    }
}
