use crate::config::KitchenConfig;
use crate::kitchen::{CookingError, Kitchen, cook_ramen, cook_single_ramen};

use kettle::time::timeout;
use kettle::{CancellationToken, GroupClosed, Priority, TaskError, TaskGroup, task};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Outcome of one cooking scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct KitchenReport {
    /// One outcome per ramen, ordered by ramen number.
    pub ramen: Vec<Result<String, TaskError<CookingError>>>,
    /// Cups of water left once every ramen is done.
    pub water_left: u64,
    /// Status checks performed while cooking. Zero when no checker ran.
    pub status_checks: u32,
    /// Elapsed-time ticks logged while cooking. Zero when no ticker ran.
    pub ticks: u32,
}

/// Outcome of [`demonstrate_shortage`].
#[derive(Debug, Clone, PartialEq)]
pub struct ShortageReport {
    /// Outcome of the pot that asked for too much water.
    pub outcome: Result<String, TaskError<CookingError>>,
    /// Cups in the supply before the attempt.
    pub water_before: u64,
    /// Cups in the supply after the attempt; equal to `water_before`.
    pub water_after: u64,
}

/// Cooks ramen #1 and #2 concurrently.
///
/// A ticker logs the elapsed time and a checker reports on the pots until
/// both ramen are done, then both are cancelled.
///
/// # Panics
/// Panics if called outside the context of a running runtime.
pub async fn cook_multiple(config: &KitchenConfig) -> KitchenReport {
    let kitchen = Kitchen::new(config.clone());
    let token = task::current_token().unwrap_or_default();

    let (tick, ticks) = (config.tick, config.timer_ticks);
    let ticker = task::spawn(Priority::Background, move |token| elapsed_ticker(token, tick, ticks));

    let interval = config.check_interval;
    let checker = task::spawn(Priority::Background, move |token| status_checker(token, interval));

    let (first, second) = kettle::join!(
        cook_single_ramen(&kitchen, 1, &token),
        cook_single_ramen(&kitchen, 2, &token)
    );

    checker.cancel();
    ticker.cancel();

    // Both loops return normally once they see the request.
    let status_checks = checker.await.unwrap_or_default();
    let ticks = ticker.await.unwrap_or_default();

    info!(ticks, status_checks, "all ramen are ready");

    KitchenReport {
        ramen: vec![first, second],
        water_left: kitchen.water_left().await,
        status_checks,
        ticks,
    }
}

/// Cooks ramen #1 at high and #2 at low priority as plain tasks, and #3
/// and #4 inside a task group.
///
/// # Errors
/// [`GroupClosed`] is never expected here since the group is fresh; it is
/// propagated rather than assumed away.
///
/// # Panics
/// Panics if called outside the context of a running runtime.
pub async fn demonstrate_priorities(config: &KitchenConfig) -> Result<KitchenReport, GroupClosed> {
    let kitchen = Arc::new(Kitchen::new(config.clone()));

    let high = task::spawn(Priority::High, {
        let kitchen = kitchen.clone();
        move |token| async move { cook_ramen(&kitchen, 1, &token).await }
    });

    let low = task::spawn(Priority::Low, {
        let kitchen = kitchen.clone();
        move |token| async move { cook_ramen(&kitchen, 2, &token).await }
    });

    let mut group = TaskGroup::new();
    for ramen in 3..=4 {
        let kitchen = kitchen.clone();
        group.add(Priority::Normal, move |token| async move {
            cook_ramen(&kitchen, ramen, &token).await
        })?;
    }

    let mut outcomes = vec![high.await, low.await];
    outcomes.extend(group.await_all().await);

    for (ramen, out) in (1u32..).zip(&outcomes) {
        match out {
            Ok(served) => info!("{served}"),
            Err(err) => info!(ramen, error = %err, "ramen was not served"),
        }
    }

    Ok(KitchenReport {
        ramen: outcomes,
        water_left: kitchen.water_left().await,
        status_checks: 0,
        ticks: 0,
    })
}

/// Tries to cook a ramen that needs far more water than the kitchen holds.
///
/// The failure is logged and skipped; the supply is left unchanged.
///
/// # Panics
/// Panics if called outside the context of a running runtime.
pub async fn demonstrate_shortage(config: &KitchenConfig) -> ShortageReport {
    let greedy = KitchenConfig {
        cups_per_ramen: config.water_cups.saturating_mul(10).max(1),
        ..config.clone()
    };
    let kitchen = Arc::new(Kitchen::new(greedy));
    let water_before = kitchen.water_left().await;

    let handle = task::spawn(Priority::Normal, {
        let kitchen = kitchen.clone();
        move |token| async move { cook_single_ramen(&kitchen, 5, &token).await }
    });
    let outcome = handle.await;

    ShortageReport {
        outcome,
        water_before,
        water_after: kitchen.water_left().await,
    }
}

/// Logs the elapsed ticks until `ticks` is reached or cancellation is
/// requested. Returns the number of ticks logged.
async fn elapsed_ticker(
    token: CancellationToken,
    tick: Duration,
    ticks: u32,
) -> Result<u32, TaskError<Infallible>> {
    let mut elapsed = 0;

    while elapsed < ticks {
        if timeout(tick, token.cancelled()).await.is_ok() {
            debug!(elapsed, "ticker cancelled");
            break;
        }

        elapsed += 1;
        info!(elapsed, "time passes");
    }

    Ok(elapsed)
}

/// Reports on the stove every `interval` until cancelled. Returns the number
/// of checks made.
async fn status_checker(token: CancellationToken, interval: Duration) -> Result<u32, TaskError<Infallible>> {
    let mut checks = 0;

    while !token.is_cancelled() {
        checks += 1;
        info!(check = checks, "checking on the ramen");

        if timeout(interval, token.cancelled()).await.is_ok() {
            break;
        }
    }

    Ok(checks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kettle::ResourceExhausted;

    fn fast() -> KitchenConfig {
        KitchenConfig::default().scaled(0.001)
    }

    #[kettle::test]
    async fn two_ramen_cook_side_by_side() {
        let report = cook_multiple(&fast()).await;

        assert_eq!(
            report.ramen,
            vec![
                Ok("ramen #1 is ready".to_string()),
                Ok("ramen #2 is ready".to_string()),
            ]
        );
        assert_eq!(report.water_left, 6);
        assert!(report.status_checks >= 1);
        assert!(report.ticks <= fast().timer_ticks);
    }

    #[kettle::test]
    async fn every_priority_gets_served() {
        let report = demonstrate_priorities(&fast()).await.expect("fresh group is open");

        assert_eq!(report.ramen.len(), 4);
        for (ramen, out) in (1..).zip(&report.ramen) {
            assert_eq!(out, &Ok(format!("ramen #{ramen} is ready")));
        }
        assert_eq!(report.water_left, 2);
    }

    #[kettle::test]
    async fn third_pot_runs_dry() {
        let config = KitchenConfig {
            water_cups: 4,
            ..fast()
        };
        let kitchen = Kitchen::new(config);
        let token = CancellationToken::new();

        let (a, b, c) = kettle::join!(
            cook_ramen(&kitchen, 1, &token),
            cook_ramen(&kitchen, 2, &token),
            cook_ramen(&kitchen, 3, &token)
        );

        let failures = [&a, &b, &c].iter().filter(|out| out.is_err()).count();
        assert_eq!(failures, 1);
        assert_eq!(kitchen.water_left().await, 0);
    }

    #[kettle::test]
    async fn shortage_is_skipped() {
        let report = demonstrate_shortage(&fast()).await;

        assert_eq!(
            report.outcome,
            Err(TaskError::Failed(CookingError::OutOfWater(ResourceExhausted {
                requested: 100,
                available: 10,
            })))
        );
        assert_eq!(report.water_before, 10);
        assert_eq!(report.water_after, 10);
    }

    #[kettle::test]
    async fn ticker_stops_on_its_own() {
        let ticks = task::spawn(Priority::Background, |token| {
            elapsed_ticker(token, Duration::from_millis(1), 3)
        })
        .await;

        assert_eq!(ticks, Ok(3));
    }
}
