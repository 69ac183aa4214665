use crate::runtime::task::{Priority, TaskId, panic_message};

use std::panic::{self, AssertUnwindSafe};

/// A failed task whose result nobody observed.
///
/// Delivered to the hook installed with
/// [`RuntimeBuilder::on_unobserved_failure`](crate::RuntimeBuilder::on_unobserved_failure)
/// when the last handle to such a task is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnobservedFailure {
    /// Identifier of the failed task.
    pub task: TaskId,
    /// Priority the task was spawned with.
    pub priority: Priority,
    /// Debug rendering of the error or panic message.
    pub message: String,
}

/// Callback type for unobserved failures.
pub(crate) type FailureHook = Box<dyn Fn(&UnobservedFailure) + Send + Sync>;

/// Runtime-wide diagnostic sinks.
///
/// Every unobserved failure is logged at `warn` level; the optional hook
/// lets embedders collect them as well.
#[derive(Default)]
pub(crate) struct Diagnostics {
    on_unobserved_failure: Option<FailureHook>,
}

impl Diagnostics {
    pub(crate) fn new(on_unobserved_failure: Option<FailureHook>) -> Self {
        Self {
            on_unobserved_failure,
        }
    }

    pub(crate) fn report_unobserved(&self, failure: UnobservedFailure) {
        tracing::warn!(
            task = %failure.task,
            priority = %failure.priority,
            error = %failure.message,
            "task failed but its result was never observed"
        );

        let Some(hook) = &self.on_unobserved_failure else {
            return;
        };

        // The hook may run on a worker thread, which must survive it.
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| hook(&failure))) {
            tracing::warn!(
                task = %failure.task,
                panic = %panic_message(payload.as_ref()),
                "unobserved failure hook panicked"
            );
        }
    }
}
