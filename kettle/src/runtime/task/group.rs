use super::{CancellationToken, Priority, TaskHandle, TaskId};
use crate::error::{GroupClosed, TaskError};
use crate::runtime::context;
use crate::runtime::task::core::spawn_on;

use parking_lot::Mutex;
use std::fmt;
use std::future::{Future, poll_fn};
use std::sync::Arc;
use std::task::{Poll, Waker};

/// A dynamic set of child tasks awaited and cancelled together.
///
/// Members are registered with [`add`](Self::add), or through a
/// [`GroupHandle`] from inside a member body while the group is being
/// awaited. Every member gets a child of the group's token, so
/// [`cancel_all`](Self::cancel_all) reaches current and future members
/// alike.
///
/// - [`await_all`](Self::await_all) collects every outcome in insertion
///   order and never short-circuits.
/// - [`try_await_all`](Self::try_await_all) stops at the first error,
///   cancelling the siblings.
/// - [`join_next`](Self::join_next) yields outcomes in completion order.
///
/// Dropping the group cancels its members cooperatively.
///
/// # Examples
///
/// ```rust,ignore
/// let mut group = TaskGroup::new();
/// for n in 0..4 {
///     group.add(Priority::Normal, move |_| async move { Ok::<_, TaskError<()>>(n) })?;
/// }
/// let outcomes = group.await_all().await;
/// assert_eq!(outcomes.len(), 4);
/// ```
pub struct TaskGroup<R, E> {
    shared: Arc<Shared<R, E>>,

    /// Members already yielded by `join_next`, by insertion index.
    joined: Vec<bool>,
}

/// A cloneable reference to a [`TaskGroup`] that can add members.
///
/// Meant to be moved into member bodies so a group can grow while it is
/// being awaited.
pub struct GroupHandle<R, E> {
    shared: Arc<Shared<R, E>>,
}

struct Shared<R, E> {
    token: CancellationToken,
    members: Mutex<Members<R, E>>,
}

struct Members<R, E> {
    handles: Vec<TaskHandle<R, E>>,

    /// Set once `await_all` has returned.
    closed: bool,

    /// Waker of the task awaiting the group, woken when a member is added.
    waker: Option<Waker>,
}

impl<R, E> Shared<R, E>
where
    R: Send + 'static,
    E: Send + fmt::Debug + 'static,
{
    fn add<F, Fut>(&self, priority: Priority, body: F) -> Result<TaskHandle<R, E>, GroupClosed>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<R, TaskError<E>>> + Send + 'static,
    {
        if self.members.lock().closed {
            return Err(GroupClosed);
        }

        let runtime = context::current().expect("task groups must be used within a runtime");
        let member = spawn_on(&runtime, priority, self.token.child(), body);

        let mut members = self.members.lock();

        // Closed while the member was being spawned.
        if members.closed {
            member.cancel();
            return Err(GroupClosed);
        }

        members.handles.push(member.clone());
        if let Some(waker) = members.waker.take() {
            waker.wake();
        }

        tracing::trace!(task = %member.id(), members = members.handles.len(), "group member added");
        Ok(member)
    }
}

impl<R, E> TaskGroup<R, E> {
    /// Creates an empty group.
    ///
    /// Inside a task the group token is a child of the task's token, so
    /// cancelling the enclosing task cancels the group.
    pub fn new() -> Self {
        let token = context::current_token()
            .map(|parent| parent.child())
            .unwrap_or_default();

        Self {
            shared: Arc::new(Shared {
                token,
                members: Mutex::new(Members {
                    handles: Vec::new(),
                    closed: false,
                    waker: None,
                }),
            }),
            joined: Vec::new(),
        }
    }

    /// Returns a handle that can add members, e.g. from inside a member.
    pub fn handle(&self) -> GroupHandle<R, E> {
        GroupHandle {
            shared: self.shared.clone(),
        }
    }

    /// Cancels every current and future member. Idempotent.
    pub fn cancel_all(&self) {
        tracing::trace!(members = self.len(), "cancelling task group");
        self.shared.token.cancel();
    }

    /// Returns `true` once [`cancel_all`](Self::cancel_all) was called or an
    /// enclosing task was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.shared.token.is_cancelled()
    }

    /// Number of members registered so far.
    pub fn len(&self) -> usize {
        self.shared.members.lock().handles.len()
    }

    /// Returns `true` if no member was ever added.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self, waker: &Waker) -> Vec<TaskHandle<R, E>> {
        let mut members = self.shared.members.lock();
        members.waker = Some(waker.clone());
        members.handles.clone()
    }
}

impl<R, E> TaskGroup<R, E>
where
    R: Send + 'static,
    E: Send + fmt::Debug + 'static,
{
    /// Spawns a member task.
    ///
    /// `body` receives a token that is a child of the group's token.
    ///
    /// # Errors
    /// [`GroupClosed`] once [`await_all`](Self::await_all) has returned.
    ///
    /// # Panics
    /// Panics if called outside the context of a running runtime.
    pub fn add<F, Fut>(&self, priority: Priority, body: F) -> Result<TaskHandle<R, E>, GroupClosed>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<R, TaskError<E>>> + Send + 'static,
    {
        self.shared.add(priority, body)
    }
}

impl<R: Clone, E: Clone> TaskGroup<R, E> {
    /// Waits until every member is terminal and returns one outcome per
    /// member, in insertion order.
    ///
    /// Members added while waiting are waited for too. Failures and
    /// cancellations are reported as explicit `Err` entries. Afterwards the
    /// group is closed and further `add` calls fail with [`GroupClosed`].
    pub async fn await_all(&mut self) -> Vec<Result<R, TaskError<E>>> {
        poll_fn(|cx| {
            let handles = self.snapshot(cx.waker());

            for member in &handles {
                if !member.is_finished() && member.task.poll_result(cx).is_pending() {
                    return Poll::Pending;
                }
            }

            let mut members = self.shared.members.lock();

            // A finished member added another one after the snapshot.
            if members.handles.len() != handles.len() {
                cx.waker().wake_by_ref();
                return Poll::Pending;
            }

            members.closed = true;
            members.waker = None;

            Poll::Ready(
                handles
                    .iter()
                    .filter_map(|member| member.try_result())
                    .collect(),
            )
        })
        .await
    }

    /// Waits for all members, stopping at the first error.
    ///
    /// The first failing member cancels its siblings; they are drained
    /// before returning so no member outlives the call. Returns the values
    /// in insertion order when every member succeeded.
    pub async fn try_await_all(&mut self) -> Result<Vec<R>, TaskError<E>> {
        let mut first_error = None;

        while let Some((id, out)) = self.join_next().await {
            if let Err(err) = out
                && first_error.is_none()
            {
                tracing::debug!(task = %id, kind = err.as_label(), "group member failed, cancelling siblings");
                self.cancel_all();
                first_error = Some(err);
            }
        }

        let outcomes = self.await_all().await;

        match first_error {
            Some(err) => Err(err),
            None => outcomes.into_iter().collect(),
        }
    }

    /// Waits for the next member to finish, in completion order.
    ///
    /// Returns `None` once every member has been yielded.
    pub async fn join_next(&mut self) -> Option<(TaskId, Result<R, TaskError<E>>)> {
        poll_fn(|cx| {
            let handles = self.snapshot(cx.waker());
            self.joined.resize(handles.len(), false);

            let mut pending = false;

            for (index, member) in handles.iter().enumerate() {
                if self.joined[index] {
                    continue;
                }

                match member.task.poll_result(cx) {
                    Poll::Ready(out) => {
                        self.joined[index] = true;
                        return Poll::Ready(Some((member.id(), out)));
                    }
                    Poll::Pending => pending = true,
                }
            }

            if pending {
                Poll::Pending
            } else {
                Poll::Ready(None)
            }
        })
        .await
    }
}

impl<R, E> GroupHandle<R, E>
where
    R: Send + 'static,
    E: Send + fmt::Debug + 'static,
{
    /// Adds a member to the group, see [`TaskGroup::add`].
    pub fn add<F, Fut>(&self, priority: Priority, body: F) -> Result<TaskHandle<R, E>, GroupClosed>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<R, TaskError<E>>> + Send + 'static,
    {
        self.shared.add(priority, body)
    }
}

impl<R, E> GroupHandle<R, E> {
    /// Returns `true` once the group was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.shared.token.is_cancelled()
    }
}

impl<R, E> Clone for GroupHandle<R, E> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<R, E> Default for TaskGroup<R, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, E> Drop for TaskGroup<R, E> {
    fn drop(&mut self) {
        self.shared.token.cancel();
    }
}

impl<R, E> fmt::Debug for TaskGroup<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members = self.shared.members.lock();
        f.debug_struct("TaskGroup")
            .field("members", &members.handles.len())
            .field("closed", &members.closed)
            .field("cancelled", &self.shared.token.is_cancelled())
            .finish()
    }
}
