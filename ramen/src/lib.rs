//! Ramen kitchen simulation built on the `kettle` task core.
//!
//! Each scenario mirrors a way of running concurrent work:
//!
//! - [`cook_multiple`] cooks two ramen side by side while a ticker and a
//!   status checker run in the background until they are cancelled.
//! - [`demonstrate_priorities`] spawns ramen at different priorities and
//!   collects two more through a [`kettle::TaskGroup`].
//! - [`demonstrate_shortage`] asks for more water than the kitchen has.
//!
//! Durations come from [`KitchenConfig`]; use [`KitchenConfig::scaled`] to
//! speed a run up.

mod config;
mod kitchen;
mod scenarios;

pub use config::{ConfigError, KitchenConfig, StepDurations, TIME_SCALE_VAR, parse_time_scale};
pub use kitchen::{CookingError, Kitchen, cook_ramen, cook_single_ramen};
pub use scenarios::{
    KitchenReport, ShortageReport, cook_multiple, demonstrate_priorities, demonstrate_shortage,
};
