use super::state::{COMPLETE, IDLE, NOTIFIED, QUEUED, RUNNING};
use super::{CancellationToken, Priority, TaskHandle, TaskId, TaskState};
use crate::error::TaskError;
use crate::runtime::context::{self, CURRENT_LOCALS, CURRENT_WORKER_ID, Handle};
use crate::runtime::diagnostics::UnobservedFailure;
use crate::runtime::task::waker::make_waker;

use parking_lot::Mutex;
use std::any::Any;
use std::cell::UnsafeCell;
use std::fmt;
use std::future::Future;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll, Waker};

/// A runnable unit of work that can be executed by the scheduler.
///
/// Erases the result types of a task so run queues can hold a
/// heterogeneous collection through `Arc<dyn Runnable>`.
pub(crate) trait Runnable: Send + Sync {
    /// Polls the task once. Called by a worker thread.
    fn run(self: Arc<Self>);

    /// Identifier of the task, for tracing.
    fn id(&self) -> TaskId;

    /// Priority lane the task is queued in.
    fn priority(&self) -> Priority;
}

type Body<R, E> = Pin<Box<dyn Future<Output = Result<R, TaskError<E>>> + Send>>;

/// A spawned task managed by the runtime.
///
/// Owns the body future until it finishes, then keeps the outcome so any
/// number of [`TaskHandle`]s can read it.
pub(crate) struct Task<R, E> {
    id: TaskId,
    priority: Priority,

    /// Cooperative cancellation flag handed to the body.
    token: CancellationToken,

    /// The body. Only touched while the task is `RUNNING`, which a single
    /// worker at a time can reach. Dropped as soon as it completes.
    future: UnsafeCell<Option<Body<R, E>>>,

    /// Outcome, set exactly once before the state becomes `COMPLETE`.
    result: Mutex<Option<Result<R, TaskError<E>>>>,

    /// Scheduling state (`IDLE`, `QUEUED`, ...).
    state: AtomicUsize,

    /// Whether a worker has polled the body at least once.
    started: AtomicBool,

    /// Whether any handle has read the outcome.
    observed: AtomicBool,

    /// Rendered error of a failed task, kept for the unobserved-failure report.
    failure: OnceLock<String>,

    /// Runtime this task reschedules itself on.
    handle: Handle,

    /// Wakers of everyone awaiting the outcome.
    waiters: Mutex<Vec<Waker>>,
}

// Safety: `future` is only accessed by the worker that moved the state to
// `RUNNING`; every other field is synchronized on its own.
unsafe impl<R: Send, E: Send> Sync for Task<R, E> {}

impl<R, E> Task<R, E>
where
    R: Send + 'static,
    E: Send + fmt::Debug + 'static,
{
    fn new(priority: Priority, token: CancellationToken, future: Body<R, E>, handle: Handle) -> Self {
        Self {
            id: TaskId::next(),
            priority,
            token,
            future: UnsafeCell::new(Some(future)),
            result: Mutex::new(None),
            state: AtomicUsize::new(QUEUED),
            started: AtomicBool::new(false),
            observed: AtomicBool::new(false),
            failure: OnceLock::new(),
            handle,
            waiters: Mutex::new(Vec::new()),
        }
    }

    /// Polls the body once.
    ///
    /// - `Poll::Pending`: back to `IDLE`, or re-queued if it was woken
    ///   while running.
    /// - `Poll::Ready` or a panic: the outcome is stored and every waiter
    ///   is woken.
    fn run(self: Arc<Self>) {
        let current = self.state.load(Ordering::Acquire);

        if current != QUEUED && current != NOTIFIED {
            return;
        }

        // Exclusive access to `future` from here on.
        if self
            .state
            .compare_exchange(current, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        self.started.store(true, Ordering::Release);

        let waker = make_waker(self.clone());
        let mut cx = Context::from_waker(&waker);

        // Safety: the RUNNING state guarantees no other thread touches the future.
        let slot = unsafe { &mut *self.future.get() };

        let Some(body) = slot.as_mut() else {
            return;
        };

        let polled = context::enter_task(self.token.clone(), || {
            panic::catch_unwind(AssertUnwindSafe(|| body.as_mut().poll(&mut cx)))
        });

        let output = match polled {
            Ok(Poll::Pending) => {
                if self
                    .state
                    .compare_exchange(RUNNING, IDLE, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    // Woken while running; go straight back to the queue.
                    self.state.store(QUEUED, Ordering::Release);
                    self.handle.injector.push(self.clone());
                }
                return;
            }
            Ok(Poll::Ready(output)) => output,
            Err(payload) => Err(TaskError::Panicked(panic_message(payload.as_ref()))),
        };

        // The body is dropped only after the outcome is published, so a
        // channel inside it closes after `try_result` can see the outcome.
        let body = slot.take();
        self.complete(output);

        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| drop(body))) {
            tracing::warn!(
                task = %self.id,
                panic = %panic_message(payload.as_ref()),
                "task body panicked while being dropped"
            );
        }
    }

    fn complete(&self, output: Result<R, TaskError<E>>) {
        match &output {
            Ok(_) => tracing::trace!(task = %self.id, "task completed"),
            Err(TaskError::Cancelled) => tracing::trace!(task = %self.id, "task cancelled"),
            Err(err) => {
                let message = match err {
                    TaskError::Failed(e) => format!("{e:?}"),
                    TaskError::Panicked(msg) => format!("panic: {msg}"),
                    TaskError::Cancelled => String::new(),
                };
                tracing::debug!(task = %self.id, kind = err.as_label(), error = %message, "task failed");
                let _ = self.failure.set(message);
            }
        }

        *self.result.lock() = Some(output);
        self.state.store(COMPLETE, Ordering::Release);

        let waiters = mem::take(&mut *self.waiters.lock());
        for waker in waiters {
            waker.wake();
        }
    }

    /// Reschedules the task after a wake-up.
    ///
    /// `IDLE` tasks are queued; `RUNNING` tasks are marked `NOTIFIED` so
    /// they are re-queued once the current poll returns.
    pub(crate) fn schedule(self: Arc<Self>) {
        loop {
            let state = self.state.load(Ordering::Acquire);

            match state {
                IDLE => {
                    if self
                        .state
                        .compare_exchange(IDLE, QUEUED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        self.handle.injector.push(self.clone());
                        return;
                    }
                }
                RUNNING => {
                    if self
                        .state
                        .compare_exchange(RUNNING, NOTIFIED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return;
                    }
                }
                // Already queued, notified or finished.
                _ => return,
            }
        }
    }
}

impl<R, E> Task<R, E> {
    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    pub(crate) fn priority(&self) -> Priority {
        self.priority
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.state.load(Ordering::Acquire) == COMPLETE
    }

    pub(crate) fn lifecycle(&self) -> TaskState {
        if self.is_complete() {
            return match &*self.result.lock() {
                Some(Ok(_)) => TaskState::Completed,
                Some(Err(TaskError::Cancelled)) => TaskState::Cancelled,
                Some(Err(_)) => TaskState::Failed,
                None => TaskState::Running,
            };
        }

        if self.started.load(Ordering::Acquire) {
            TaskState::Running
        } else {
            TaskState::Created
        }
    }
}

impl<R: Clone, E: Clone> Task<R, E> {
    /// Returns a clone of the outcome if the task has finished.
    pub(crate) fn try_result(&self) -> Option<Result<R, TaskError<E>>> {
        let out = self.result.lock().clone();

        if out.is_some() {
            self.observed.store(true, Ordering::Release);
        }

        out
    }

    /// Returns the outcome, or registers `cx`'s waker to be woken on completion.
    ///
    /// The waker is registered before re-checking so a completion racing
    /// with this call cannot be missed.
    pub(crate) fn poll_result(&self, cx: &mut Context<'_>) -> Poll<Result<R, TaskError<E>>> {
        if let Some(out) = self.try_result() {
            return Poll::Ready(out);
        }

        {
            let mut waiters = self.waiters.lock();
            if !waiters.iter().any(|w| w.will_wake(cx.waker())) {
                waiters.push(cx.waker().clone());
            }
        }

        match self.try_result() {
            Some(out) => Poll::Ready(out),
            None => Poll::Pending,
        }
    }
}

impl<R, E> Runnable for Task<R, E>
where
    R: Send + 'static,
    E: Send + fmt::Debug + 'static,
{
    fn run(self: Arc<Self>) {
        Task::run(self)
    }

    fn id(&self) -> TaskId {
        self.id
    }

    fn priority(&self) -> Priority {
        self.priority
    }
}

impl<R, E> Drop for Task<R, E> {
    /// Reports a failure nobody looked at.
    fn drop(&mut self) {
        if self.observed.load(Ordering::Acquire) {
            return;
        }

        if let Some(message) = self.failure.take() {
            self.handle.diagnostics.report_unobserved(UnobservedFailure {
                task: self.id,
                priority: self.priority,
                message,
            });
        }
    }
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Spawns a task on `handle` with an explicit cancellation token.
///
/// From a worker thread the task goes to that worker's local queue;
/// otherwise it is injected globally.
pub(crate) fn spawn_on<F, Fut, R, E>(
    handle: &Handle,
    priority: Priority,
    token: CancellationToken,
    body: F,
) -> TaskHandle<R, E>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<R, TaskError<E>>> + Send + 'static,
    R: Send + 'static,
    E: Send + fmt::Debug + 'static,
{
    let future = body(token.clone());
    let task = Arc::new(Task::new(priority, token, Box::pin(future), handle.clone()));

    tracing::trace!(task = %task.id, %priority, "task spawned");

    // Local queues belong to whichever runtime owns the current thread.
    let same_runtime = context::current()
        .is_some_and(|current| Arc::ptr_eq(&current.injector, &handle.injector));

    let runnable: Arc<dyn Runnable> = task.clone();
    let pushed_locally = same_runtime && push_local(&runnable);

    if !pushed_locally {
        handle.injector.push(runnable);
    }

    TaskHandle { task }
}

/// Pushes `task` to the current worker's local queue, if this thread is a
/// worker.
fn push_local(task: &Arc<dyn Runnable>) -> bool {
    let Some(id) = CURRENT_WORKER_ID.with(|id| *id.borrow()) else {
        return false;
    };

    CURRENT_LOCALS.with(|locals| match locals.borrow().as_ref() {
        Some(locals) => {
            locals[id].push(task.clone());
            true
        }
        None => false,
    })
}

/// Spawns a task inside the current runtime.
///
/// `body` receives the task's [`CancellationToken`] and returns the future
/// to run. The call never blocks; the returned handle reports
/// [`TaskState::Created`] until a worker first polls the task.
///
/// When called from inside another task, the new task's token is a child
/// of the caller's, so cancelling the parent reaches it too.
///
/// # Panics
/// Panics if called outside the context of a running runtime.
///
/// # Examples
///
/// ```rust,ignore
/// let handle = task::spawn(Priority::High, |token| async move {
///     token.checkpoint()?;
///     Ok::<_, TaskError<Infallible>>(42)
/// });
/// assert_eq!(handle.await, Ok(42));
/// ```
pub fn spawn<F, Fut, R, E>(priority: Priority, body: F) -> TaskHandle<R, E>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<R, TaskError<E>>> + Send + 'static,
    R: Send + 'static,
    E: Send + fmt::Debug + 'static,
{
    let handle = context::current().expect("spawn must be called within the context of a runtime");
    let token = context::current_token()
        .map(|parent| parent.child())
        .unwrap_or_default();

    spawn_on(&handle, priority, token, body)
}

/// Returns the cancellation token of the task currently being polled.
///
/// `None` when called outside a task body.
pub fn current_token() -> Option<CancellationToken> {
    context::current_token()
}

/// Returns `true` if the task currently being polled has been asked to
/// cancel. Always `false` outside a task body.
pub fn is_cancelled() -> bool {
    context::current_token().is_some_and(|token| token.is_cancelled())
}
