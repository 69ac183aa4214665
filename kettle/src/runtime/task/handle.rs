use super::{CancellationToken, Priority, Task, TaskId, TaskState};
use crate::error::{Elapsed, TaskError};
use crate::time;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

/// A handle to a spawned task.
///
/// A `TaskHandle` lets the holder await the outcome of a task, request its
/// cancellation and inspect its state. It implements [`Future`] and
/// resolves once the task is terminal.
///
/// Handles are cheap to clone and every clone observes the same task:
/// awaiting any number of them yields identical clones of one outcome.
///
/// Dropping a `TaskHandle` does **not** cancel the task; it only discards
/// the ability to observe its result.
pub struct TaskHandle<R, E> {
    /// Shared reference to the underlying task.
    pub(crate) task: Arc<Task<R, E>>,
}

impl<R, E> TaskHandle<R, E> {
    /// Identifier of the task.
    pub fn id(&self) -> TaskId {
        self.task.id()
    }

    /// Priority the task was spawned with.
    pub fn priority(&self) -> Priority {
        self.task.priority()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TaskState {
        self.task.lifecycle()
    }

    /// Returns `true` once the task is terminal.
    pub fn is_finished(&self) -> bool {
        self.task.is_complete()
    }

    /// Requests cooperative cancellation of the task and its descendants.
    ///
    /// Idempotent. A body that never checks its token runs to completion.
    pub fn cancel(&self) {
        tracing::trace!(task = %self.task.id(), "cancellation requested");
        self.task.token().cancel();
    }

    /// Returns `true` once cancellation has been requested.
    ///
    /// This reflects the request, not the outcome: the task may still
    /// complete normally if its body ignores the signal.
    pub fn is_cancelled(&self) -> bool {
        self.task.token().is_cancelled()
    }

    /// The task's cancellation token.
    pub fn token(&self) -> &CancellationToken {
        self.task.token()
    }
}

impl<R: Clone, E: Clone> TaskHandle<R, E> {
    /// Returns the outcome if the task has finished, without waiting.
    pub fn try_result(&self) -> Option<Result<R, TaskError<E>>> {
        self.task.try_result()
    }

    /// Waits for the task to finish and returns a clone of its outcome.
    ///
    /// Equivalent to awaiting the handle itself, but borrows it.
    pub fn join(&self) -> Join<'_, R, E> {
        Join { handle: self }
    }

    /// Waits at most `duration` for the task.
    ///
    /// If the deadline passes first the task is cancelled and
    /// `Err(Elapsed)` is returned; the task itself may still finish later
    /// and its outcome stays available through this handle.
    pub async fn join_timeout(&self, duration: Duration) -> Result<Result<R, TaskError<E>>, Elapsed> {
        let out = time::timeout(duration, self.join()).await;

        if out.is_err() {
            tracing::trace!(task = %self.task.id(), ?duration, "join timed out, cancelling task");
            self.cancel();
        }

        out
    }
}

impl<R, E> Clone for TaskHandle<R, E> {
    fn clone(&self) -> Self {
        Self {
            task: self.task.clone(),
        }
    }
}

impl<R, E> fmt::Debug for TaskHandle<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id())
            .field("priority", &self.priority())
            .field("state", &self.state())
            .finish()
    }
}

impl<R: Clone, E: Clone> Future for TaskHandle<R, E> {
    type Output = Result<R, TaskError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.task.poll_result(cx)
    }
}

/// Future returned by [`TaskHandle::join`].
pub struct Join<'a, R, E> {
    handle: &'a TaskHandle<R, E>,
}

impl<R: Clone, E: Clone> Future for Join<'_, R, E> {
    type Output = Result<R, TaskError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.handle.task.poll_result(cx)
    }
}
