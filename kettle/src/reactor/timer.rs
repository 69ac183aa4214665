use parking_lot::Mutex;
use std::cmp::Ordering;
use std::sync::Arc;
use std::task::Waker;
use std::time::Instant;

/// Waker of a pending sleep, shared between the sleep and the reactor.
///
/// Emptied by whichever side finishes first: the reactor when the timer
/// fires, the sleep when it is dropped.
pub(crate) type TimerSlot = Arc<Mutex<Option<Waker>>>;

/// An entry in the reactor timer heap.
///
/// Entries are ordered by deadline, then by registration sequence, so
/// timers sharing a deadline fire in the order they were registered.
pub(crate) struct TimerEntry {
    /// The time at which the timer should fire.
    pub(crate) deadline: Instant,

    /// Registration order, used to break ties between equal deadlines.
    pub(crate) seq: u64,

    /// Waker to notify when the deadline is reached.
    pub(crate) slot: TimerSlot,
}

impl TimerEntry {
    fn key(&self) -> (Instant, u64) {
        (self.deadline, self.seq)
    }
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Ord for TimerEntry {
    /// Reversed so that `BinaryHeap<TimerEntry>` pops the earliest
    /// deadline first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
