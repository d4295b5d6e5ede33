//! Win detection
//!
//! The watcher is the only component that looks at the grid as a whole. A
//! scan locks every cell in canonical order, compares the owners while the
//! whole grid is frozen, then releases every lock again. While a scan runs
//! all claims see `INUSE` and all status reads wait.

use crate::game::GridStore;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::time::{interval, MissedTickBehavior};

/// Holds the winner's name once the game is decided
///
/// Written at most once; after that it never changes.
#[derive(Debug, Default)]
pub struct OutcomeSlot {
    winner: OnceCell<String>,
}

impl OutcomeSlot {
    /// Creates an undecided slot
    pub fn new() -> Self {
        Self::default()
    }

    /// The published winner, if any
    pub fn winner(&self) -> Option<&str> {
        self.winner.get().map(String::as_str)
    }

    /// True once a winner has been published
    pub fn is_decided(&self) -> bool {
        self.winner.initialized()
    }

    /// Records the winner. Returns false if a winner was already recorded.
    pub fn publish(&self, name: String) -> bool {
        self.winner.set(name).is_ok()
    }
}

/// Freezes the grid and checks whether one name owns every cell
///
/// Returns that name, or `None` if any cell is unowned or differs from its
/// predecessor in row-major order.
pub async fn scan_for_winner(grid: &GridStore) -> Option<String> {
    // Acquire pass, row-major
    let mut guards = Vec::with_capacity(grid.len());
    for cell in grid.cells() {
        guards.push(cell.lock().await);
    }

    // Compare pass
    let mut failures = 0usize;
    let mut previous: Option<&Option<String>> = None;
    for owner in guards.iter().map(|guard| &**guard) {
        if let Some(prev) = previous {
            if owner.is_none() || owner != prev {
                failures += 1;
            }
        }
        previous = Some(owner);
    }
    let baseline = guards.first().and_then(|guard| (**guard).clone());

    // Release pass, same order
    for guard in guards {
        drop(guard);
    }

    debug!("Grid scan finished with {} mismatches", failures);
    if failures == 0 {
        baseline
    } else {
        None
    }
}

/// Background task that publishes the winner to the outcome slot
pub struct OutcomeWatcher {
    grid: Arc<GridStore>,
    outcome: Arc<OutcomeSlot>,
    check_interval: Duration,
}

impl OutcomeWatcher {
    /// Creates a watcher that scans `grid` every `check_interval`
    pub fn new(grid: Arc<GridStore>, outcome: Arc<OutcomeSlot>, check_interval: Duration) -> Self {
        Self {
            grid,
            outcome,
            check_interval,
        }
    }

    /// Scans every `check_interval` until a winner is found, publishes it and returns it
    pub async fn run(self) -> String {
        let mut timer = interval(self.check_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Skip the first tick since it fires immediately
        timer.tick().await;

        loop {
            timer.tick().await;

            if let Some(winner) = scan_for_winner(&self.grid).await {
                if self.outcome.publish(winner.clone()) {
                    info!("Game over, {} owns all {} cells", winner, self.grid.len());
                } else {
                    warn!("Outcome already decided, keeping the first winner");
                }
                return self
                    .outcome
                    .winner()
                    .map(str::to_string)
                    .unwrap_or(winner);
            }
        }
    }
}
