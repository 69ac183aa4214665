//! Work-stealing scheduler components.
//!
//! - [`injector`]: the global queue for injected and woken tasks, plus
//!   worker parking,
//! - [`queue`]: the priority run queue and the per-worker local queues
//!   built on it.
//!
//! Both queues apply the same priority rule with bounded waiting, so the
//! scheduler honours [`Priority`](crate::task::Priority) hints without ever
//! starving a task.

pub(crate) mod injector;
pub(crate) mod queue;
