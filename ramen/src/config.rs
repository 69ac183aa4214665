use std::env;
use std::time::Duration;
use thiserror::Error;

/// Environment variable that scales every duration of the simulation.
pub const TIME_SCALE_VAR: &str = "RAMEN_TIME_SCALE";

/// How long each cooking step takes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepDurations {
    /// Bringing the water to a boil.
    pub boil: Duration,
    /// Adding soup base and flakes.
    pub ingredients: Duration,
    /// Cooking the noodles.
    pub noodles: Duration,
    /// Adding the egg.
    pub egg: Duration,
}

impl Default for StepDurations {
    fn default() -> Self {
        Self {
            boil: Duration::from_secs(3),
            ingredients: Duration::from_secs(1),
            noodles: Duration::from_secs(4),
            egg: Duration::from_secs(1),
        }
    }
}

/// Settings of one simulated kitchen.
#[derive(Debug, Clone, PartialEq)]
pub struct KitchenConfig {
    /// Cups of water available when the kitchen opens.
    pub water_cups: u64,
    /// Cups boiled for one ramen.
    pub cups_per_ramen: u64,
    /// Duration of each cooking step.
    pub steps: StepDurations,
    /// Period of the elapsed-time ticker.
    pub tick: Duration,
    /// Number of ticks before the ticker stops on its own.
    pub timer_ticks: u32,
    /// Period of the status checker.
    pub check_interval: Duration,
}

impl Default for KitchenConfig {
    fn default() -> Self {
        Self {
            water_cups: 10,
            cups_per_ramen: 2,
            steps: StepDurations::default(),
            tick: Duration::from_secs(1),
            timer_ticks: 10,
            check_interval: Duration::from_secs(2),
        }
    }
}

/// # Errors raised while reading the kitchen configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// [`TIME_SCALE_VAR`] is not a positive finite number.
    #[error("invalid {TIME_SCALE_VAR} value {0:?}: expected a positive number")]
    InvalidTimeScale(String),
}

impl KitchenConfig {
    /// Multiplies every duration by `factor`. Quantities are kept.
    ///
    /// # Panics
    /// Panics if `factor` is negative or not finite.
    pub fn scaled(mut self, factor: f64) -> Self {
        let scale = |d: Duration| d.mul_f64(factor);

        self.steps = StepDurations {
            boil: scale(self.steps.boil),
            ingredients: scale(self.steps.ingredients),
            noodles: scale(self.steps.noodles),
            egg: scale(self.steps.egg),
        };
        self.tick = scale(self.tick);
        self.check_interval = scale(self.check_interval);
        self
    }

    /// Default configuration, scaled by [`TIME_SCALE_VAR`] when it is set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::default();

        match env::var(TIME_SCALE_VAR) {
            Ok(raw) => Ok(config.scaled(parse_time_scale(&raw)?)),
            Err(_) => Ok(config),
        }
    }
}

/// Parses a time scale such as `0.1` (ten times faster).
pub fn parse_time_scale(raw: &str) -> Result<f64, ConfigError> {
    match raw.trim().parse::<f64>() {
        Ok(scale) if scale.is_finite() && scale > 0.0 => Ok(scale),
        _ => Err(ConfigError::InvalidTimeScale(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_recipe() {
        let config = KitchenConfig::default();
        assert_eq!(config.water_cups, 10);
        assert_eq!(config.steps.noodles, Duration::from_secs(4));
        assert_eq!(config.check_interval, Duration::from_secs(2));
    }

    #[test]
    fn scaling_touches_durations_only() {
        let config = KitchenConfig::default().scaled(0.5);
        assert_eq!(config.steps.boil, Duration::from_millis(1500));
        assert_eq!(config.tick, Duration::from_millis(500));
        assert_eq!(config.water_cups, 10);
        assert_eq!(config.timer_ticks, 10);
    }

    #[test]
    fn time_scale_must_be_positive() {
        assert_eq!(parse_time_scale(" 0.25 "), Ok(0.25));
        assert!(parse_time_scale("0").is_err());
        assert!(parse_time_scale("-1").is_err());
        assert_eq!(
            parse_time_scale("fast"),
            Err(ConfigError::InvalidTimeScale("fast".to_string()))
        );
    }
}
