use std::cell::UnsafeCell;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

/// An asynchronous, first-in first-out mutex.
///
/// Tasks that cannot acquire the lock are suspended, not blocked, and are
/// served strictly in the order they first asked for it. On release the
/// lock is handed directly to the oldest waiter: it never becomes free in
/// between, so a newcomer cannot barge ahead of a queued task.
pub struct Mutex<T: ?Sized> {
    /// Lock ownership and the queue of waiting tasks.
    ///
    /// Guarded by a short-lived `parking_lot` lock that is never held
    /// across an await.
    state: parking_lot::Mutex<State>,

    /// The protected value. Only reachable through a [`MutexGuard`].
    data: UnsafeCell<T>,
}

struct State {
    locked: bool,

    /// Waiters in arrival order.
    queue: VecDeque<Waiter>,

    /// Waiter the lock was handed to and which has not picked it up yet.
    granted: Option<u64>,

    next_ticket: u64,
}

struct Waiter {
    ticket: u64,
    waker: Waker,
}

// Safety: the data is only accessed through a guard, and at most one guard
// exists at a time.
unsafe impl<T: ?Sized + Send> Send for Mutex<T> {}
unsafe impl<T: ?Sized + Send> Sync for Mutex<T> {}

impl<T> Mutex<T> {
    /// Creates a new, unlocked mutex wrapping `value`.
    pub fn new(value: T) -> Mutex<T> {
        Self {
            state: parking_lot::Mutex::new(State {
                locked: false,
                queue: VecDeque::new(),
                granted: None,
                next_ticket: 0,
            }),
            data: UnsafeCell::new(value),
        }
    }

    /// Consumes the mutex and returns the protected value.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: ?Sized> Mutex<T> {
    /// Returns a future that resolves to a guard once the lock is acquired.
    ///
    /// The place in line is taken on the first poll.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let mut guard = mutex.lock().await;
    /// *guard += 1;
    /// ```
    pub fn lock(&self) -> LockFuture<'_, T> {
        LockFuture {
            mutex: self,
            ticket: None,
        }
    }

    /// Acquires the lock only if it is free and nobody is queued for it.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, T>> {
        let mut state = self.state.lock();

        if state.locked || !state.queue.is_empty() {
            return None;
        }

        state.locked = true;
        Some(MutexGuard::new(self))
    }

    /// Returns a mutable reference to the value; no locking is needed since
    /// the borrow is exclusive.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    /// Hands the lock to the oldest waiter, or frees it if nobody waits.
    fn release(&self) {
        let next = {
            let mut state = self.state.lock();

            match state.queue.pop_front() {
                Some(waiter) => {
                    state.granted = Some(waiter.ticket);
                    Some(waiter)
                }
                None => {
                    state.locked = false;
                    None
                }
            }
        };

        if let Some(waiter) = next {
            tracing::trace!(ticket = waiter.ticket, "mutex handed off");
            waiter.waker.wake();
        }
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Mutex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Mutex");
        match self.try_lock() {
            Some(guard) => d.field("data", &&*guard),
            None => d.field("data", &format_args!("<locked>")),
        };
        d.finish()
    }
}

impl<T: Default> Default for Mutex<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Future returned by [`Mutex::lock`].
///
/// Dropping it while queued gives up its place; if the lock had already
/// been handed to it, the lock moves on to the next waiter.
pub struct LockFuture<'a, T: ?Sized> {
    mutex: &'a Mutex<T>,

    /// Place in the queue, once taken.
    ticket: Option<u64>,
}

impl<'a, T: ?Sized> Future for LockFuture<'a, T> {
    type Output = MutexGuard<'a, T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mutex = self.mutex;
        let mut state = mutex.state.lock();

        match self.ticket {
            None => {
                if !state.locked && state.queue.is_empty() {
                    state.locked = true;
                    return Poll::Ready(MutexGuard::new(mutex));
                }

                let ticket = state.next_ticket;
                state.next_ticket += 1;
                state.queue.push_back(Waiter {
                    ticket,
                    waker: cx.waker().clone(),
                });

                drop(state);
                self.ticket = Some(ticket);
                Poll::Pending
            }
            Some(ticket) => {
                if state.granted == Some(ticket) {
                    state.granted = None;
                    drop(state);
                    self.ticket = None;
                    return Poll::Ready(MutexGuard::new(mutex));
                }

                if let Some(waiter) = state.queue.iter_mut().find(|w| w.ticket == ticket)
                    && !waiter.waker.will_wake(cx.waker())
                {
                    waiter.waker = cx.waker().clone();
                }

                Poll::Pending
            }
        }
    }
}

impl<T: ?Sized> Drop for LockFuture<'_, T> {
    fn drop(&mut self) {
        let Some(ticket) = self.ticket else {
            return;
        };

        let handed_to_us = {
            let mut state = self.mutex.state.lock();

            if state.granted == Some(ticket) {
                state.granted = None;
                true
            } else {
                state.queue.retain(|w| w.ticket != ticket);
                false
            }
        };

        if handed_to_us {
            self.mutex.release();
        }
    }
}

/// Guard returned by [`Mutex::lock`].
///
/// Releases the mutex (handing it to the next waiter) when dropped.
pub struct MutexGuard<'a, T: ?Sized> {
    mutex: &'a Mutex<T>,

    /// The guard hands out `&mut T`, so it is `Sync` only when `T` is.
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T: ?Sized> MutexGuard<'a, T> {
    fn new(mutex: &'a Mutex<T>) -> Self {
        Self {
            mutex,
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> Drop for MutexGuard<'_, T> {
    fn drop(&mut self) {
        self.mutex.release();
    }
}

impl<T: ?Sized> Deref for MutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Safety: the guard is the unique owner of the lock.
        unsafe { &*self.mutex.data.get() }
    }
}

impl<T: ?Sized> DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // Safety: the guard is the unique owner of the lock.
        unsafe { &mut *self.mutex.data.get() }
    }
}
