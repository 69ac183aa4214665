//! Scheduling states of a task and its public lifecycle view.

/// Task is idle and not scheduled.
///
/// The task exists but is waiting to be woken.
pub(crate) const IDLE: usize = 0;

/// Task is queued for execution.
///
/// The task has been scheduled and is waiting in a run queue.
pub(crate) const QUEUED: usize = 1;

/// Task is currently being polled by a worker.
///
/// At most one worker may observe this state at a time.
pub(crate) const RUNNING: usize = 2;

/// Task has reached a terminal state.
///
/// The result is stored and the body will not be polled again.
pub(crate) const COMPLETE: usize = 3;

/// Task has been woken while running.
///
/// It must be re-queued once the current poll returns.
pub(crate) const NOTIFIED: usize = 4;

/// Lifecycle of a task as seen through its handle.
///
/// `Created → Running → {Completed | Failed | Cancelled}`. The three
/// terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Spawned but not yet picked up by a worker.
    Created,
    /// Polled at least once and not finished.
    Running,
    /// The body returned a value.
    Completed,
    /// The body returned a domain error or panicked.
    Failed,
    /// The body observed cancellation and stopped.
    Cancelled,
}

impl TaskState {
    /// Returns `true` for `Completed`, `Failed` and `Cancelled`.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Cancelled
        )
    }
}
