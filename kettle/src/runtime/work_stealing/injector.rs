use super::queue::RunQueue;
use crate::runtime::task::Runnable;

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Shared handle to the global task injector.
pub(crate) type InjectorHandle = Arc<Injector>;

/// Global task injector for the work-stealing scheduler.
///
/// Tasks spawned from outside a worker, and every task that is woken,
/// land here. Workers take from it when their local queue is empty, and
/// periodically even when it is not.
///
/// It also coordinates worker parking through a condition variable.
pub(crate) struct Injector {
    /// Priority queue of globally injected tasks.
    queue: Mutex<RunQueue>,

    /// Condition variable used to wake parked workers.
    condvar: Condvar,

    /// Indicates whether the executor is shutting down.
    shutdown: AtomicBool,
}

impl Injector {
    /// Creates a new empty injector.
    pub(crate) fn new(starvation_limit: u64) -> Self {
        Injector {
            queue: Mutex::new(RunQueue::new(starvation_limit)),
            condvar: Condvar::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Signals shutdown and wakes all parked workers.
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.condvar.notify_all();
    }

    /// Pushes a task and wakes one parked worker.
    pub(crate) fn push(&self, task: Arc<dyn Runnable>) {
        self.queue.lock().push(task);
        self.condvar.notify_one();
    }

    /// Parks the current worker until work arrives or shutdown begins.
    ///
    /// The wait is bounded so that work pushed to another worker's local
    /// queue (which does not signal the condvar) is still picked up by
    /// stealing.
    pub(crate) fn park(&self) {
        if self.shutdown.load(Ordering::Acquire) {
            return;
        }

        let mut queue = self.queue.lock();
        if !queue.is_empty() {
            return;
        }

        let _ = self.condvar.wait_for(&mut queue, Duration::from_millis(1));
    }

    /// Takes the next task according to the priority rule.
    pub(crate) fn steal(&self) -> Option<Arc<dyn Runnable>> {
        self.queue.lock().pop()
    }

    /// Drops every queued task.
    pub(crate) fn clear(&self) {
        let stale = self.queue.lock().drain();
        drop(stale);
    }
}
