use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// Wraps a future and measures how long it takes to complete.
///
/// Resolves to the wrapped output together with the time elapsed since the
/// **first poll**, not since construction.
///
/// # Examples
///
/// ```rust,ignore
/// let (bowl, took) = instrumented(cook_single_ramen(&kitchen, 1, &token)).await;
/// tracing::info!(?took, "ramen served");
/// ```
pub fn instrumented<F: Future>(future: F) -> Instrumented<F> {
    Instrumented {
        future,
        started: None,
    }
}

/// Future returned by [`instrumented`].
pub struct Instrumented<F> {
    future: F,
    started: Option<Instant>,
}

impl<F: Future> Future for Instrumented<F> {
    type Output = (F::Output, Duration);

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // Safety: `future` is structurally pinned and never moved.
        let this = unsafe { self.get_unchecked_mut() };
        let started = *this.started.get_or_insert_with(Instant::now);

        unsafe { Pin::new_unchecked(&mut this.future) }
            .poll(cx)
            .map(|output| (output, started.elapsed()))
    }
}
