use crate::reactor::ReactorHandle;
use crate::runtime::diagnostics::Diagnostics;
use crate::runtime::task::CancellationToken;
use crate::runtime::work_stealing::injector::InjectorHandle;
use crate::runtime::work_stealing::queue::LocalQueue;

use std::cell::RefCell;
use std::sync::Arc;

/// Shared handles every runtime component may need.
///
/// Cloned into each task so it can reschedule itself and report
/// diagnostics without going through thread-locals.
#[derive(Clone)]
pub(crate) struct Handle {
    /// Channel to the timer reactor.
    pub(crate) reactor: ReactorHandle,

    /// Global injector queue.
    pub(crate) injector: InjectorHandle,

    /// Diagnostic sinks (unobserved failures).
    pub(crate) diagnostics: Arc<Diagnostics>,
}

thread_local! {
    /// Handle of the runtime the current thread belongs to.
    ///
    /// Set by worker threads for their whole lifetime, which lets
    /// `task::spawn` and `time::sleep` work without explicit parameters.
    pub(crate) static CURRENT: RefCell<Option<Handle>> = const { RefCell::new(None) };

    /// Identifier of the current worker thread.
    pub(crate) static CURRENT_WORKER_ID: RefCell<Option<usize>> = const { RefCell::new(None) };

    /// References to all local worker queues, for local pushes and stealing.
    pub(crate) static CURRENT_LOCALS: RefCell<Option<Arc<Vec<Arc<LocalQueue>>>>> =
        const { RefCell::new(None) };

    /// Cancellation token of the task currently being polled.
    ///
    /// Tasks spawned while it is set inherit a child token, which is how
    /// cancellation reaches descendants.
    pub(crate) static CURRENT_TOKEN: RefCell<Option<CancellationToken>> =
        const { RefCell::new(None) };
}

/// Installs `handle` as the current runtime for the duration of `f`,
/// restoring the previous one afterwards.
pub(crate) fn enter_context<R>(handle: Handle, f: impl FnOnce() -> R) -> R {
    let prev = CURRENT.with(|c| c.replace(Some(handle)));
    let out = f();
    CURRENT.with(|c| c.replace(prev));
    out
}

/// Marks `token` as belonging to the task being polled during `f`.
pub(crate) fn enter_task<R>(token: CancellationToken, f: impl FnOnce() -> R) -> R {
    let prev = CURRENT_TOKEN.with(|c| c.replace(Some(token)));
    let out = f();
    CURRENT_TOKEN.with(|c| c.replace(prev));
    out
}

/// Returns a clone of the current runtime handle, if any.
pub(crate) fn current() -> Option<Handle> {
    CURRENT.with(|c| c.borrow().clone())
}

/// Returns the token of the task currently being polled, if any.
pub(crate) fn current_token() -> Option<CancellationToken> {
    CURRENT_TOKEN.with(|c| c.borrow().clone())
}
