//! Asynchronous task primitives.
//!
//! - [`spawn`] starts a task and returns its [`TaskHandle`].
//! - [`TaskGroup`] joins and cancels a dynamic set of tasks together.
//! - [`CancellationToken`] carries cooperative cancellation from a task to
//!   its descendants.
//! - [`Priority`] is the scheduling hint attached to every task.
//!
//! The task core, its waker and the scheduling states are internal to the
//! executor.

mod core;
mod group;
mod handle;
mod id;
mod priority;
mod state;
mod token;
mod waker;

pub(crate) use self::core::{Runnable, Task, panic_message, spawn_on};

pub use self::core::{current_token, is_cancelled, spawn};
pub use group::{GroupHandle, TaskGroup};
pub use handle::{Join, TaskHandle};
pub use id::TaskId;
pub use priority::Priority;
pub use state::TaskState;
pub use token::{CancellationToken, WaitForCancellation};
