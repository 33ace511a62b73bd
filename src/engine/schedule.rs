//! Schedule - the engine's two suspension points.
//!
//! Both are cooperative: nothing here spawns a thread or arms an OS timer.
//! The host pumps [`RecordTable::tick`](super::RecordTable::tick) from its
//! event loop and the engine resolves whatever came due.
//!
//! - [`PruneTimer`] - single-slot deferred prune. A blur schedules it, a
//!   focus cancels it; scheduling always replaces any pending deadline, so
//!   at most one is ever outstanding (last-focus-wins).
//! - [`RemovalQueue`] - removal notifications owed on the next tick. The
//!   record and index are captured at removal time, while the row is still
//!   queryable; emission happens one tick later.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::types::Record;

/// Delay between a blur and the prune it schedules. Long enough for a focus
/// to land in another row of the same table first; not configurable.
pub const PRUNE_DELAY: Duration = Duration::from_millis(100);

// =============================================================================
// PRUNE TIMER
// =============================================================================

/// Single-slot cancellable deadline for the deferred prune.
#[derive(Debug, Default)]
pub(crate) struct PruneTimer {
    deadline: Option<Instant>,
}

impl PruneTimer {
    /// Schedule a prune at `now + PRUNE_DELAY`, replacing any pending one.
    pub(crate) fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + PRUNE_DELAY);
    }

    /// Cancel the pending prune, if any.
    pub(crate) fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Whether a prune is currently scheduled.
    pub(crate) fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consume the deadline if it has come due.
    pub(crate) fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

// =============================================================================
// REMOVAL QUEUE
// =============================================================================

/// Removal notifications waiting for the next tick, in removal order.
#[derive(Debug, Default)]
pub(crate) struct RemovalQueue {
    pending: VecDeque<(Record, usize)>,
}

impl RemovalQueue {
    /// Queue a removed row's last known record and the index it occupied.
    pub(crate) fn push(&mut self, record: Record, index: usize) {
        self.pending.push_back((record, index));
    }

    /// Take everything owed, FIFO.
    pub(crate) fn drain(&mut self) -> Vec<(Record, usize)> {
        self.pending.drain(..).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}
