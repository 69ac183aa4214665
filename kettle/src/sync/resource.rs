use super::Mutex;
use crate::error::ResourceExhausted;

use std::fmt;

/// A value that only one task at a time can read or change.
///
/// Every access goes through a FIFO [`Mutex`], so concurrent callers are
/// served in arrival order and no update is ever lost. [`mutate`] is the
/// only way to change the value, and it is all-or-nothing: either the
/// closure's new value is committed or the old one stays in place.
///
/// [`mutate`]: Self::mutate
///
/// # Examples
///
/// ```rust,ignore
/// let water = ExclusiveResource::new(10u64);
/// water.consume(2).await?;
/// assert_eq!(water.read().await, 8);
/// ```
pub struct ExclusiveResource<T> {
    value: Mutex<T>,
}

impl<T> ExclusiveResource<T> {
    /// Wraps `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            value: Mutex::new(initial),
        }
    }

    /// Returns a snapshot of the current value.
    pub async fn read(&self) -> T
    where
        T: Clone,
    {
        self.value.lock().await.clone()
    }

    /// Replaces the value with the result of `f`, with exclusive access.
    ///
    /// `f` sees the current value. If it returns `Err`, the value is left
    /// untouched and that exact error is returned. A panic in `f` also
    /// leaves the value untouched and releases the resource.
    pub async fn mutate<F, E>(&self, f: F) -> Result<(), E>
    where
        F: FnOnce(&T) -> Result<T, E>,
    {
        let mut guard = self.value.lock().await;
        let next = f(&guard)?;
        *guard = next;
        Ok(())
    }

    /// Consumes the resource and returns the value.
    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}

impl ExclusiveResource<u64> {
    /// Takes `amount` units out of a counted resource and returns what is
    /// left.
    ///
    /// # Errors
    ///
    /// [`ResourceExhausted`] if fewer than `amount` units remain; nothing is
    /// taken in that case.
    pub async fn consume(&self, amount: u64) -> Result<u64, ResourceExhausted> {
        let mut remaining = 0;

        self.mutate(|&available| {
            let Some(left) = available.checked_sub(amount) else {
                tracing::trace!(requested = amount, available, "resource exhausted");
                return Err(ResourceExhausted {
                    requested: amount,
                    available,
                });
            };

            remaining = left;
            Ok(left)
        })
        .await?;

        Ok(remaining)
    }
}

impl<T: Default> Default for ExclusiveResource<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for ExclusiveResource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExclusiveResource")
            .field("value", &self.value)
            .finish()
    }
}
