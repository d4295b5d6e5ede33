//! Shared grid of lockable cells
//!
//! Each cell owns its own async mutex around the owner name. Connection
//! handlers only ever hold one cell lock at a time; the outcome watcher is
//! the single component that locks the whole grid, always in canonical
//! row-major order.

use crate::error::ServerError;
use tokio::sync::{Mutex, MutexGuard};

/// Result of a non-blocking claim attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The name was written into the cell
    Claimed,
    /// Another task held the cell lock, nothing was written
    InUse,
}

/// One grid position
///
/// The owner name is only reachable through the lock, so it can never be
/// written without holding it.
#[derive(Debug, Default)]
pub struct Cell {
    owner: Mutex<Option<String>>,
}

impl Cell {
    /// Creates an unowned cell with its lock released
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the cell lock if nobody holds it
    ///
    /// Returns `None` immediately when the lock is held.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, Option<String>>> {
        self.owner.try_lock().ok()
    }

    /// Waits for the cell lock
    ///
    /// The guard releases the lock when dropped, including when the owning
    /// task is aborted.
    pub async fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.owner.lock().await
    }
}

/// Square grid of cells stored in row-major order
///
/// Cell `(x, y)` lives at index `x + y * size`.
#[derive(Debug)]
pub struct GridStore {
    size: usize,
    cells: Vec<Cell>,
}

impl GridStore {
    /// Allocates `size * size` unowned cells with every lock released
    ///
    /// The size is expected to have passed `ServerConfig::validate`, which
    /// bounds it by `MAX_GRID_SIZE`.
    pub fn new(size: usize) -> Self {
        let cells = (0..size * size).map(|_| Cell::new()).collect();
        Self { size, cells }
    }

    /// Side length of the grid
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of cells, `size * size`
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn index(&self, x: usize, y: usize) -> Result<usize, ServerError> {
        if x >= self.size || y >= self.size {
            return Err(ServerError::OutOfBounds {
                x,
                y,
                size: self.size,
            });
        }
        Ok(x + y * self.size)
    }

    /// Looks up a cell by coordinates
    ///
    /// Fails with `OutOfBounds` if either coordinate is `>= size`.
    pub fn cell(&self, x: usize, y: usize) -> Result<&Cell, ServerError> {
        let index = self.index(x, y)?;
        Ok(&self.cells[index])
    }

    /// Cells in canonical order: y outer, x inner
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Writes `name` into the cell unless someone else currently holds its lock
    ///
    /// Never waits. Ownership is last-write-wins: a claimed cell can be
    /// claimed again under another name.
    pub fn try_claim(&self, x: usize, y: usize, name: &str) -> Result<ClaimOutcome, ServerError> {
        let cell = self.cell(x, y)?;
        match cell.try_lock() {
            Some(mut owner) => {
                *owner = Some(name.to_string());
                Ok(ClaimOutcome::Claimed)
            }
            None => Ok(ClaimOutcome::InUse),
        }
    }

    /// Returns the current owner, waiting for the cell lock if it is held
    ///
    /// An unclaimed cell reads as the empty string.
    pub async fn read_status(&self, x: usize, y: usize) -> Result<String, ServerError> {
        let cell = self.cell(x, y)?;
        let owner = cell.lock().await;
        Ok(owner.clone().unwrap_or_default())
    }

    /// Reads every owner one cell at a time in canonical order
    ///
    /// Not a consistent snapshot: other handlers may claim cells between two
    /// reads.
    pub async fn snapshot(&self) -> Vec<Option<String>> {
        let mut owners = Vec::with_capacity(self.cells.len());
        for cell in &self.cells {
            owners.push(cell.lock().await.clone());
        }
        owners
    }
}
