//! Timer utilities backed by the runtime's timer reactor.
//!
//! - [`sleep`] suspends the current task until a deadline,
//! - [`timeout`] races a future against a deadline,
//! - [`instrumented`] measures how long a future takes.

mod instrumented;
mod sleep;
mod timeout;

pub use instrumented::{Instrumented, instrumented};
pub use sleep::{Sleep, sleep};
pub use timeout::{Timeout, timeout};
