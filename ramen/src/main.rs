use ramen::{KitchenConfig, TIME_SCALE_VAR, cook_multiple, demonstrate_priorities, demonstrate_shortage};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[kettle::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .init();

    let config = match KitchenConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "ignoring {TIME_SCALE_VAR}, cooking in real time");
            KitchenConfig::default()
        }
    };

    info!("=== cooking two ramen ===");
    let report = cook_multiple(&config).await;
    info!(
        water_left = report.water_left,
        checks = report.status_checks,
        ticks = report.ticks,
        "kitchen closed"
    );

    info!("=== priorities ===");
    match demonstrate_priorities(&config).await {
        Ok(report) => info!(water_left = report.water_left, "all priorities served"),
        Err(err) => warn!(error = %err, "priority demo aborted"),
    }

    info!("=== water shortage ===");
    let shortage = demonstrate_shortage(&config).await;
    info!(
        before = shortage.water_before,
        after = shortage.water_after,
        "shortage handled"
    );
}
