//! # Kettle
//!
//! **Kettle** is a small structured-concurrency task core built on its own
//! work-stealing runtime. It offers the handful of primitives needed to
//! run cooperative tasks safely:
//!
//! - **Tasks with results**: [`task::spawn`] returns a cloneable
//!   [`TaskHandle`] that any number of holders can await.
//! - **Task groups**: [`TaskGroup`] joins and cancels a dynamic set of tasks,
//!   collecting every outcome or failing fast.
//! - **Cooperative cancellation**: a [`CancellationToken`] per task, linked
//!   to the tokens of everything the task spawns.
//! - **Priorities**: a [`Priority`] hint per task, honoured by a scheduler
//!   that never lets low-priority work starve.
//! - **Exclusive resources**: [`ExclusiveResource`] serializes access to a
//!   value in arrival order with all-or-nothing updates.
//! - **Timers**: [`time::sleep`], [`time::timeout`] and
//!   [`time::instrumented`].
//! - **Macros**: `#[kettle::main]`, `#[kettle::test]` and `join!`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kettle::{ExclusiveResource, Priority, TaskError, task};
//! use std::sync::Arc;
//!
//! #[kettle::main]
//! async fn main() {
//!     let water = Arc::new(ExclusiveResource::new(10u64));
//!
//!     let pot = water.clone();
//!     let handle = task::spawn(Priority::High, move |token| async move {
//!         token.checkpoint()?;
//!         pot.consume(2).await.map_err(TaskError::Failed)
//!     });
//!
//!     assert_eq!(handle.await, Ok(8));
//! }
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (task lifecycle at `trace`, failures
//! at `debug`, unobserved failures at `warn`) and never installs a
//! subscriber itself.

mod error;
mod reactor;
mod runtime;

pub mod sync;
pub mod time;

pub use error::{Cancelled, Elapsed, GroupClosed, ResourceExhausted, RuntimeError, TaskError};
pub use runtime::Runtime;
pub use runtime::builder::RuntimeBuilder;
pub use runtime::diagnostics::UnobservedFailure;
pub use runtime::task;
pub use runtime::task::{CancellationToken, Priority, TaskGroup, TaskHandle, TaskId, TaskState};
pub use runtime::yield_now::{YieldNow, yield_now};
pub use sync::ExclusiveResource;

pub use kettle_macros::*;
