//! Error types used by the kettle task core.
//!
//! - [`TaskError`]: how a task ended when it did not complete successfully.
//! - [`Cancelled`]: returned by cooperative cancellation checkpoints.
//! - [`ResourceExhausted`]: a capacity precondition of an exclusive resource failed.
//! - [`GroupClosed`]: a member was added to a task group that already finished.
//! - [`Elapsed`]: a deadline expired before the awaited future completed.
//! - [`RuntimeError`]: the runtime itself could not be started.
//!
//! Every enum offers `as_label` returning a short stable snake_case label
//! suitable for structured log fields.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// # How a task ended without producing a value.
///
/// The body of a task returns `Result<R, TaskError<E>>`. Domain failures are
/// wrapped in [`TaskError::Failed`]; a body that honours a cancellation
/// request returns [`TaskError::Cancelled`] (usually through
/// `token.checkpoint()?`). A panic inside the body is caught by the runtime
/// and surfaces as [`TaskError::Panicked`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError<E> {
    /// The task body raised a domain error.
    #[error("task failed: {0}")]
    Failed(E),

    /// The task observed a cancellation request and stopped.
    #[error("task cancelled")]
    Cancelled,

    /// The task body panicked; the payload message is kept.
    #[error("task panicked: {0}")]
    Panicked(String),
}

impl<E> TaskError<E> {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use kettle::TaskError;
    ///
    /// let err: TaskError<()> = TaskError::Cancelled;
    /// assert_eq!(err.as_label(), "task_cancelled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Failed(_) => "task_failed",
            TaskError::Cancelled => "task_cancelled",
            TaskError::Panicked(_) => "task_panicked",
        }
    }

    /// Returns `true` if the task stopped because it was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TaskError::Cancelled)
    }

    /// Returns `true` for domain failures and panics.
    pub fn is_failure(&self) -> bool {
        !self.is_cancelled()
    }

    /// Returns the domain error, if this is a [`TaskError::Failed`].
    pub fn into_failed(self) -> Option<E> {
        match self {
            TaskError::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Maps the domain error with `f`, leaving the other variants untouched.
    pub fn map<F, U>(self, f: F) -> TaskError<U>
    where
        F: FnOnce(E) -> U,
    {
        match self {
            TaskError::Failed(err) => TaskError::Failed(f(err)),
            TaskError::Cancelled => TaskError::Cancelled,
            TaskError::Panicked(msg) => TaskError::Panicked(msg),
        }
    }
}

/// Marker error returned by a cancellation checkpoint.
///
/// Converts into [`TaskError::Cancelled`] so bodies can write
/// `token.checkpoint()?`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[error("cancellation requested")]
pub struct Cancelled;

impl<E> From<Cancelled> for TaskError<E> {
    fn from(_: Cancelled) -> Self {
        TaskError::Cancelled
    }
}

/// A capacity precondition failed: more was requested than remained.
///
/// The resource is left untouched when this error is returned.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("resource exhausted: requested {requested}, available {available}")]
pub struct ResourceExhausted {
    /// Amount the caller asked for.
    pub requested: u64,
    /// Amount that was left at the time of the request.
    pub available: u64,
}

/// A member was added to a task group after `await_all` returned.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("task group is closed")]
pub struct GroupClosed;

/// A deadline expired before the awaited future completed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("deadline of {0:?} elapsed")]
pub struct Elapsed(pub Duration);

/// # Errors produced while starting the runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// An OS thread (worker or timer) could not be spawned.
    #[error("failed to spawn runtime thread: {0}")]
    Spawn(#[from] io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Spawn(_) => "runtime_spawn_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_error_converts_into_cancelled() {
        fn body() -> Result<(), TaskError<&'static str>> {
            Err::<(), _>(Cancelled)?;
            Ok(())
        }

        assert_eq!(body(), Err(TaskError::Cancelled));
    }

    #[test]
    fn labels_and_messages() {
        let failed: TaskError<&str> = TaskError::Failed("no water");
        assert_eq!(failed.as_label(), "task_failed");
        assert_eq!(failed.to_string(), "task failed: no water");
        assert!(failed.is_failure());

        let exhausted = ResourceExhausted {
            requested: 100,
            available: 10,
        };
        assert_eq!(
            exhausted.to_string(),
            "resource exhausted: requested 100, available 10"
        );
    }

    #[test]
    fn map_keeps_cancellation() {
        let err: TaskError<u8> = TaskError::Cancelled;
        assert_eq!(err.map(u16::from), TaskError::<u16>::Cancelled);

        let err: TaskError<u8> = TaskError::Failed(7);
        assert_eq!(err.map(u16::from).into_failed(), Some(7u16));
    }
}
