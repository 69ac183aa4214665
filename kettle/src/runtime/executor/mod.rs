//! Task executor implementation.
//!
//! - `core`: worker thread lifecycle and shutdown,
//! - `worker`: the per-thread scheduling loop with work-stealing.

pub(crate) mod core;
pub(crate) mod worker;
