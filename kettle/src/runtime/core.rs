use super::context::Handle;
use super::diagnostics::Diagnostics;
use super::executor::core::Executor;
use super::task::{CancellationToken, Priority, TaskHandle, spawn_on};
use super::work_stealing::injector::Injector;
use crate::error::{RuntimeError, TaskError};
use crate::reactor::Reactor;
use crate::reactor::command::Command;

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, mpsc};

/// The main runtime handle.
///
/// `Runtime` is responsible for:
/// - spawning tasks from outside the runtime,
/// - driving task execution via the executor,
/// - running the timer reactor,
/// - providing a synchronous entry point via [`block_on`](Self::block_on).
///
/// Dropping the runtime shuts down all internal components in an orderly
/// fashion. Tasks still pending at that point are dropped without being
/// polled again.
pub struct Runtime {
    /// Task executor responsible for scheduling and running futures.
    executor: Executor,

    /// Reactor, injector and diagnostics shared with every task.
    handle: Handle,
}

impl Runtime {
    pub(crate) fn new(
        worker_threads: usize,
        starvation_limit: u64,
        diagnostics: Diagnostics,
    ) -> Result<Self, RuntimeError> {
        let reactor = Reactor::start()?;

        let handle = Handle {
            reactor,
            injector: Arc::new(Injector::new(starvation_limit)),
            diagnostics: Arc::new(diagnostics),
        };

        let executor = match Executor::new(handle.clone(), worker_threads, starvation_limit) {
            Ok(executor) => executor,
            Err(err) => {
                let _ = handle.reactor.send(Command::Shutdown);
                return Err(err.into());
            }
        };

        tracing::debug!(worker_threads, starvation_limit, "runtime started");

        Ok(Self { executor, handle })
    }

    /// Spawns a task onto the runtime from outside of it.
    ///
    /// The task gets a fresh root [`CancellationToken`]. Inside a task,
    /// prefer [`task::spawn`](crate::task::spawn), which links the new
    /// token to the caller's.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let handle = runtime.spawn(Priority::Low, |_| async {
    ///     Ok::<_, TaskError<Infallible>>(7)
    /// });
    /// assert_eq!(runtime.block_on(handle), Ok(7));
    /// ```
    pub fn spawn<F, Fut, R, E>(&self, priority: Priority, body: F) -> TaskHandle<R, E>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<R, TaskError<E>>> + Send + 'static,
        R: Send + 'static,
        E: Send + fmt::Debug + 'static,
    {
        spawn_on(&self.handle, priority, CancellationToken::new(), body)
    }

    /// Runs a future to completion, blocking the current thread.
    ///
    /// This method is typically used as the synchronous entry point
    /// of the runtime (e.g. in `main` or tests). The future runs as a
    /// regular [`Priority::Normal`] task; its result is sent back through
    /// a channel.
    ///
    /// # Panics
    ///
    /// Re-raises a panic of `future` on the calling thread, and panics if
    /// the runtime shuts down before the future completes.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let result = runtime.block_on(async {
    ///     42
    /// });
    /// assert_eq!(result, 42);
    /// ```
    pub fn block_on<F>(&self, future: F) -> F::Output
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let (transmitter, receiver) = mpsc::channel();

        let task = self.spawn(Priority::Normal, move |_| async move {
            let _ = transmitter.send(future.await);
            Ok::<_, TaskError<Infallible>>(())
        });

        match receiver.recv() {
            Ok(output) => output,
            Err(_) => match task.try_result() {
                Some(Err(TaskError::Panicked(message))) => panic!("{message}"),
                _ => panic!("runtime shut down before the future completed"),
            },
        }
    }
}

impl Drop for Runtime {
    /// Shuts down the runtime.
    ///
    /// 1. Signals the executor to shut down
    /// 2. Sends a shutdown command to the reactor
    /// 3. Joins all worker threads and drops the remaining queued tasks
    fn drop(&mut self) {
        self.executor.shutdown();

        let _ = self.handle.reactor.send(Command::Shutdown);

        self.executor.join();

        tracing::debug!("runtime stopped");
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime").finish_non_exhaustive()
    }
}
