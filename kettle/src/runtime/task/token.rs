use crate::error::Cancelled;

use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll, Waker};

/// A cooperative cancellation flag shared by a task and its descendants.
///
/// Cancelling a token never interrupts running code. The owning task sees
/// the request only when it polls [`is_cancelled`](Self::is_cancelled),
/// calls [`checkpoint`](Self::checkpoint) or awaits
/// [`cancelled`](Self::cancelled), and it is free to ignore it.
///
/// Tokens form a tree: [`child`](Self::child) tokens are cancelled together
/// with their parent, but cancelling a child leaves the parent untouched.
/// A token only refers to other tokens; it never keeps a task alive.
#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    cancelled: AtomicBool,
    children: Mutex<Vec<Weak<Inner>>>,

    /// Wakers of pending `cancelled()` futures, keyed by future.
    waiters: Mutex<Vec<(u64, Waker)>>,
    next_key: AtomicU64,
}

impl CancellationToken {
    /// Creates a new, uncancelled root token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a token that is cancelled whenever `self` is.
    ///
    /// If `self` is already cancelled the child starts out cancelled.
    pub fn child(&self) -> Self {
        let child = Self::new();

        {
            let mut children = self.inner.children.lock();
            children.retain(|weak| weak.strong_count() > 0);
            children.push(Arc::downgrade(&child.inner));
        }

        // A concurrent `cancel` may have walked the children before the push.
        if self.is_cancelled() {
            child.cancel();
        }

        child
    }

    /// Requests cancellation of this token and all of its descendants.
    ///
    /// Idempotent: only the first call has an effect.
    pub fn cancel(&self) {
        Inner::cancel(&self.inner);
    }

    /// Returns `true` once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Cooperative checkpoint.
    ///
    /// Returns `Err(Cancelled)` once cancellation has been requested, so a
    /// task body can unwind with `token.checkpoint()?`.
    pub fn checkpoint(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Returns a future that resolves once cancellation is requested.
    pub fn cancelled(&self) -> WaitForCancellation<'_> {
        WaitForCancellation {
            token: self,
            key: None,
        }
    }
}

impl Inner {
    fn cancel(this: &Arc<Inner>) {
        if this.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }

        let waiters = std::mem::take(&mut *this.waiters.lock());
        for (_, waker) in waiters {
            waker.wake();
        }

        let children = std::mem::take(&mut *this.children.lock());
        for child in children.iter().filter_map(Weak::upgrade) {
            Inner::cancel(&child);
        }
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Future returned by [`CancellationToken::cancelled`].
///
/// Dropping it unregisters its waker, so an abandoned wait does not keep
/// the waiting task alive through the token.
pub struct WaitForCancellation<'a> {
    token: &'a CancellationToken,
    key: Option<u64>,
}

impl Future for WaitForCancellation<'_> {
    type Output = ();

    /// The waker is registered before re-checking the flag so a concurrent
    /// `cancel` cannot be missed.
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.token.is_cancelled() {
            return Poll::Ready(());
        }

        let inner = &self.token.inner;
        let key = {
            let mut waiters = inner.waiters.lock();

            match self.key.and_then(|key| waiters.iter_mut().find(|(k, _)| *k == key)) {
                Some((key, waker)) => {
                    if !waker.will_wake(cx.waker()) {
                        *waker = cx.waker().clone();
                    }
                    *key
                }
                None => {
                    let key = inner.next_key.fetch_add(1, Ordering::Relaxed);
                    waiters.push((key, cx.waker().clone()));
                    key
                }
            }
        };
        self.key = Some(key);

        if self.token.is_cancelled() {
            return Poll::Ready(());
        }

        Poll::Pending
    }
}

impl Drop for WaitForCancellation<'_> {
    fn drop(&mut self) {
        if let Some(key) = self.key {
            self.token.inner.waiters.lock().retain(|(k, _)| *k != key);
        }
    }
}
