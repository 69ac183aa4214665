use crate::runtime::task::Task;

use std::fmt::Debug;
use std::sync::Arc;
use std::task::{Wake, Waker};

/// Waking a task reschedules it on the runtime it was spawned on.
///
/// The waker holds a strong reference to the task, so a pending timer or
/// cancellation waiter keeps the task alive until it fires.
impl<R, E> Wake for Task<R, E>
where
    R: Send + 'static,
    E: Send + Debug + 'static,
{
    fn wake(self: Arc<Self>) {
        Task::schedule(self);
    }

    fn wake_by_ref(self: &Arc<Self>) {
        Task::schedule(self.clone());
    }
}

/// Creates a [`Waker`] that reschedules `task` when woken.
pub(crate) fn make_waker<R, E>(task: Arc<Task<R, E>>) -> Waker
where
    R: Send + 'static,
    E: Send + Debug + 'static,
{
    Waker::from(task)
}
