use super::Runtime;
use super::diagnostics::{Diagnostics, FailureHook, UnobservedFailure};
use crate::error::RuntimeError;

use std::fmt;
use std::thread;

/// Default number of dispatches a queued task may be passed over before
/// it is served ahead of higher-priority work.
pub(crate) const DEFAULT_STARVATION_LIMIT: u64 = 16;

/// Builder for configuring and creating a runtime.
///
/// # Examples
///
/// ```rust,ignore
/// let runtime = RuntimeBuilder::new()
///     .worker_threads(4)
///     .starvation_limit(8)
///     .on_unobserved_failure(|failure| eprintln!("lost: {failure:?}"))
///     .build();
/// ```
pub struct RuntimeBuilder {
    /// Number of worker threads in the executor.
    worker_threads: usize,

    /// Aging threshold of the priority run queues.
    starvation_limit: u64,

    /// Optional callback for failed tasks nobody awaited.
    on_unobserved_failure: Option<FailureHook>,
}

impl RuntimeBuilder {
    /// Creates a new `RuntimeBuilder` with default configuration.
    ///
    /// By default, the number of worker threads is set to the number
    /// of available logical CPUs, falling back to `1` if unavailable,
    /// and the starvation limit is 16 dispatches.
    pub fn new() -> Self {
        let worker_threads = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Self {
            worker_threads,
            starvation_limit: DEFAULT_STARVATION_LIMIT,
            on_unobserved_failure: None,
        }
    }

    /// Sets the number of worker threads used by the runtime.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn worker_threads(mut self, n: usize) -> Self {
        assert!(n > 0, "worker_threads must be > 0");

        self.worker_threads = n;
        self
    }

    /// Sets how many dispatches a ready task may wait before it is served
    /// regardless of priority.
    ///
    /// Lower values make scheduling fairer, higher values make priorities
    /// stricter. Every ready task is still dispatched eventually.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn starvation_limit(mut self, n: u64) -> Self {
        assert!(n > 0, "starvation_limit must be > 0");

        self.starvation_limit = n;
        self
    }

    /// Installs a callback invoked for every failed task whose outcome was
    /// never observed through a handle.
    ///
    /// The failure is logged at `warn` level whether or not a hook is set.
    pub fn on_unobserved_failure<F>(mut self, hook: F) -> Self
    where
        F: Fn(&UnobservedFailure) + Send + Sync + 'static,
    {
        self.on_unobserved_failure = Some(Box::new(hook));
        self
    }

    /// Builds the runtime with the configured options.
    ///
    /// # Panics
    ///
    /// Panics if a runtime thread cannot be spawned; see
    /// [`try_build`](Self::try_build).
    pub fn build(self) -> Runtime {
        match self.try_build() {
            Ok(runtime) => runtime,
            Err(err) => panic!("failed to build runtime: {err}"),
        }
    }

    /// Builds the runtime, reporting thread spawn failures.
    ///
    /// This starts the timer reactor and the worker threads.
    pub fn try_build(self) -> Result<Runtime, RuntimeError> {
        Runtime::new(
            self.worker_threads,
            self.starvation_limit,
            Diagnostics::new(self.on_unobserved_failure),
        )
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RuntimeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeBuilder")
            .field("worker_threads", &self.worker_threads)
            .field("starvation_limit", &self.starvation_limit)
            .field("on_unobserved_failure", &self.on_unobserved_failure.is_some())
            .finish()
    }
}
