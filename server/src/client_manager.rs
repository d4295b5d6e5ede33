//! Player admission and start quorum
//!
//! The admission gate bounds how many players may be connected at once and
//! tells waiting handlers when enough players have joined to start. The
//! player count lives inside a `watch` channel: every mutation happens under
//! the channel's internal lock, and every successful change wakes the
//! handlers waiting for quorum instead of having them poll.

use log::{debug, info};
use std::sync::Arc;
use tokio::sync::watch;

/// Manages concurrent player slots
#[derive(Debug)]
pub struct AdmissionGate {
    max_players: usize,
    quorum: usize,
    /// Admitted player count; subscribers are woken on every change
    count: watch::Sender<usize>,
}

/// Result of a join attempt
#[derive(Debug)]
pub enum JoinOutcome {
    /// The player holds a slot until the [`GateSlot`] is dropped
    Admitted(GateSlot),
    /// The gate was full; the count is unchanged
    Rejected,
}

impl JoinOutcome {
    /// True if a slot was taken
    pub fn is_admitted(&self) -> bool {
        matches!(self, JoinOutcome::Admitted(_))
    }
}

/// One occupied player slot
///
/// Dropping the slot gives it back to the gate, so a slot is released
/// exactly once however its session ends, including task cancellation.
#[derive(Debug)]
pub struct GateSlot {
    gate: Arc<AdmissionGate>,
}

impl Drop for GateSlot {
    fn drop(&mut self) {
        self.gate.leave();
    }
}

impl AdmissionGate {
    /// Creates an empty gate
    ///
    /// `quorum` is the number of admitted players needed before sessions
    /// are released from [`AdmissionGate::wait_for_quorum`].
    pub fn new(max_players: usize, quorum: usize) -> Self {
        let (count, _) = watch::channel(0);
        Self {
            max_players,
            quorum,
            count,
        }
    }

    /// Upper bound on concurrently admitted players
    pub fn max_players(&self) -> usize {
        self.max_players
    }

    /// Admitted players required to start
    pub fn quorum(&self) -> usize {
        self.quorum
    }

    /// Attempts to take a player slot
    ///
    /// Rejected iff the gate is already full, in which case the count is
    /// left untouched.
    pub fn try_join(self: &Arc<Self>) -> JoinOutcome {
        let max_players = self.max_players;
        let admitted = self.count.send_if_modified(|count| {
            if *count >= max_players {
                return false;
            }
            *count += 1;
            true
        });

        if admitted {
            info!(
                "Player admitted ({}/{})",
                self.current_count(),
                self.max_players
            );
            JoinOutcome::Admitted(GateSlot {
                gate: Arc::clone(self),
            })
        } else {
            debug!("Join rejected, gate full at {}", self.max_players);
            JoinOutcome::Rejected
        }
    }

    /// Only reachable through [`GateSlot`]'s drop.
    fn leave(&self) {
        self.count.send_if_modified(|count| {
            if *count == 0 {
                return false;
            }
            *count -= 1;
            true
        });
        info!(
            "Player left ({}/{})",
            self.current_count(),
            self.max_players
        );
    }

    /// Snapshot of the admitted player count
    ///
    /// May be stale by the time the caller acts on it.
    pub fn current_count(&self) -> usize {
        *self.count.borrow()
    }

    /// True if the current count meets the quorum
    pub fn has_quorum(&self) -> bool {
        self.current_count() >= self.quorum
    }

    /// Waits until at least `quorum` players are admitted
    ///
    /// Returns immediately if the quorum is already met. Players leaving
    /// while this waits only delay the start.
    pub async fn wait_for_quorum(&self) {
        let quorum = self.quorum;
        let mut rx = self.count.subscribe();
        loop {
            let count = *rx.borrow_and_update();
            if count >= quorum {
                return;
            }
            // The sender lives as long as `self`, so this only fails on teardown
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn gate(max_players: usize, quorum: usize) -> Arc<AdmissionGate> {
        Arc::new(AdmissionGate::new(max_players, quorum))
    }

    #[test]
    fn test_gate_creation() {
        let gate = gate(4, 2);
        assert_eq!(gate.max_players(), 4);
        assert_eq!(gate.quorum(), 2);
        assert_eq!(gate.current_count(), 0);
        assert!(!gate.has_quorum());
    }

    #[test]
    fn test_join_increments() {
        let gate = gate(4, 2);
        let first = gate.try_join();
        assert!(first.is_admitted());
        assert_eq!(gate.current_count(), 1);

        let second = gate.try_join();
        assert!(second.is_admitted());
        assert_eq!(gate.current_count(), 2);
        assert!(gate.has_quorum());
    }

    #[test]
    fn test_join_at_capacity_is_rejected() {
        let gate = gate(2, 1);
        let _a = gate.try_join();
        let _b = gate.try_join();

        for _ in 0..5 {
            assert!(!gate.try_join().is_admitted());
            assert_eq!(gate.current_count(), 2);
        }
    }

    #[test]
    fn test_dropping_slot_leaves_once() {
        let gate = gate(2, 1);
        let slot = gate.try_join();
        let _other = gate.try_join();
        assert_eq!(gate.current_count(), 2);

        drop(slot);
        assert_eq!(gate.current_count(), 1);

        assert!(gate.try_join().is_admitted());
    }

    #[test]
    fn test_rejection_does_not_release_a_slot() {
        let gate = gate(1, 1);
        let _slot = gate.try_join();
        let rejected = gate.try_join();
        drop(rejected);
        assert_eq!(gate.current_count(), 1);
    }

    #[tokio::test]
    async fn test_quorum_already_met() {
        let gate = gate(4, 2);
        let _a = gate.try_join();
        let _b = gate.try_join();

        timeout(Duration::from_millis(100), gate.wait_for_quorum())
            .await
            .expect("quorum wait should return immediately");
    }

    #[tokio::test]
    async fn test_quorum_wait_wakes_on_join() {
        let gate = gate(4, 2);
        let _a = gate.try_join();

        let waiter = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.wait_for_quorum().await })
        };

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        let _b = gate.try_join();
        timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_quorum_wait_survives_leave() {
        let gate = gate(4, 2);
        let a = gate.try_join();

        let waiter = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.wait_for_quorum().await })
        };

        drop(a);
        let _b = gate.try_join();
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        let _c = gate.try_join();
        timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_joins_never_exceed_cap() {
        let gate = gate(3, 1);
        let mut handles = Vec::new();
        for _ in 0..16 {
            let gate = Arc::clone(&gate);
            handles.push(tokio::spawn(async move { gate.try_join() }));
        }

        let mut slots = Vec::new();
        for handle in handles {
            slots.push(handle.await.unwrap());
        }

        let admitted = slots.iter().filter(|s| s.is_admitted()).count();
        assert_eq!(admitted, 3);
        assert_eq!(gate.current_count(), 3);

        drop(slots);
        assert_eq!(gate.current_count(), 0);
    }
}
