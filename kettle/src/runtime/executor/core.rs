use crate::runtime::context::{Handle, enter_context};
use crate::runtime::executor::worker::Worker;
use crate::runtime::work_stealing::queue::LocalQueue;

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

/// Multi-threaded task executor.
///
/// The `Executor` is responsible for:
/// - spawning worker threads,
/// - coordinating task execution via work-stealing,
/// - installing the runtime context on every worker,
/// - managing orderly shutdown and thread joining.
pub(crate) struct Executor {
    /// Runtime handle shared with every worker (holds the injector).
    handle: Handle,

    /// One local queue per worker.
    locals: Arc<Vec<Arc<LocalQueue>>>,

    /// Join handles for worker threads.
    handles: Vec<JoinHandle<()>>,

    /// Shutdown flag shared with all workers.
    shutdown: Arc<AtomicBool>,
}

impl Executor {
    /// Creates a new executor with `threads` worker threads.
    ///
    /// Each worker gets its own priority run queue using
    /// `starvation_limit`. If a thread fails to spawn, the workers started
    /// so far are shut down and the error is returned.
    pub(crate) fn new(handle: Handle, threads: usize, starvation_limit: u64) -> io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));

        let locals: Arc<Vec<_>> = Arc::new(
            (0..threads)
                .map(|_| Arc::new(LocalQueue::new(starvation_limit)))
                .collect(),
        );

        let mut executor = Self {
            handle,
            locals,
            handles: Vec::with_capacity(threads),
            shutdown,
        };

        for id in 0..threads {
            let worker = Worker::new(id, executor.locals.clone(), executor.handle.injector.clone());
            let handle = executor.handle.clone();
            let shutdown = executor.shutdown.clone();

            let spawned = thread::Builder::new()
                .name(format!("kettle-worker-{id}"))
                .spawn(move || {
                    enter_context(handle, || worker.run(shutdown));
                });

            match spawned {
                Ok(thread) => executor.handles.push(thread),
                Err(err) => {
                    executor.shutdown();
                    executor.join();
                    return Err(err);
                }
            }
        }

        Ok(executor)
    }

    /// Signals all workers to shut down and wakes the parked ones.
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.handle.injector.shutdown();
    }

    /// Waits for all worker threads to terminate, then drops every task
    /// still queued.
    ///
    /// This should be called after initiating shutdown.
    pub(crate) fn join(&mut self) {
        for h in self.handles.drain(..) {
            let _ = h.join();
        }

        for local in self.locals.iter() {
            local.clear();
        }
        self.handle.injector.clear();
    }
}
