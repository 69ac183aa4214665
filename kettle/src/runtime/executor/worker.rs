use crate::runtime::context::{CURRENT_LOCALS, CURRENT_WORKER_ID};
use crate::runtime::task::Runnable;
use crate::runtime::work_stealing::injector::InjectorHandle;
use crate::runtime::work_stealing::queue::LocalQueue;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Every `INJECTOR_INTERVAL`-th dispatch looks at the injector before the
/// local queue, so woken and externally spawned tasks are not starved by
/// a worker that keeps feeding its own queue.
const INJECTOR_INTERVAL: u64 = 31;

/// A worker thread in the executor.
///
/// A `Worker` executes runnable tasks using a work-stealing strategy.
/// Each worker owns a local queue and cooperates with other workers to
/// balance load.
///
/// The execution order is:
/// 1. Pop from the local queue (the injector first every 31st dispatch)
/// 2. Take from the global injector
/// 3. Steal from other workers
/// 4. Park if no work is available
pub(crate) struct Worker {
    /// Unique identifier of the worker.
    id: usize,

    /// All local queues (one per worker).
    locals: Arc<Vec<Arc<LocalQueue>>>,

    /// Handle to the global injector queue.
    injector: InjectorHandle,
}

impl Worker {
    pub(crate) fn new(id: usize, locals: Arc<Vec<Arc<LocalQueue>>>, injector: InjectorHandle) -> Self {
        Self {
            id,
            locals,
            injector,
        }
    }

    /// Runs the worker event loop until the shutdown flag is raised.
    ///
    /// The runtime context must already be installed on this thread.
    pub(crate) fn run(&self, shutdown: Arc<AtomicBool>) {
        CURRENT_WORKER_ID.with(|id| *id.borrow_mut() = Some(self.id));
        CURRENT_LOCALS.with(|locals| *locals.borrow_mut() = Some(self.locals.clone()));

        tracing::trace!(worker = self.id, "worker started");

        let mut tick: u64 = 0;

        while !shutdown.load(Ordering::Acquire) {
            tick = tick.wrapping_add(1);

            match self.next_task(tick) {
                Some(task) => {
                    tracing::trace!(worker = self.id, task = %task.id(), priority = %task.priority(), "polling task");
                    task.run();
                }
                None => self.injector.park(),
            }
        }

        CURRENT_WORKER_ID.with(|id| *id.borrow_mut() = None);
        CURRENT_LOCALS.with(|locals| *locals.borrow_mut() = None);

        tracing::trace!(worker = self.id, "worker stopped");
    }

    fn next_task(&self, tick: u64) -> Option<Arc<dyn Runnable>> {
        let local = &self.locals[self.id];

        if tick % INJECTOR_INTERVAL == 0
            && let Some(task) = self.injector.steal()
        {
            return Some(task);
        }

        local
            .pop()
            .or_else(|| self.injector.steal())
            .or_else(|| self.try_steal())
    }

    /// Attempts to steal a task from another worker's local queue.
    ///
    /// Workers are visited in a round-robin fashion to avoid
    /// starvation and distribute load evenly.
    fn try_steal(&self) -> Option<Arc<dyn Runnable>> {
        let len = self.locals.len();

        if len <= 1 {
            return None;
        }

        (1..len)
            .map(|offset| (self.id + offset) % len)
            .find_map(|victim| self.locals[victim].steal())
    }
}
