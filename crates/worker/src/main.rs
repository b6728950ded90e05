use std::sync::Arc;

use anyhow::Context;

use tradepost_core::{Clock, SystemClock};
use tradepost_infra::{
    Marketplace, MarketplaceConfig, SchedulerConfig, SweepScheduler, ensure_default_admin,
    seed_demo_data,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tradepost_observability::init();

    let config = MarketplaceConfig::from_env().context("invalid TRADEPOST_* configuration")?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let market = Marketplace::in_memory(config.clone(), clock.clone());

    ensure_default_admin(market.store().as_ref(), market.config(), market.now())
        .context("provisioning the default admin")?;
    if config.seed_demo_data {
        seed_demo_data(&market).context("seeding demo data")?;
    }

    let handle = SweepScheduler::new(market.lifecycle(), clock)
        .spawn(SchedulerConfig::default().with_interval(config.sweep_interval))
        .context("starting the sweep scheduler")?;
    tracing::info!(
        sweep_interval_secs = config.sweep_interval.as_secs(),
        "tradepost worker running; press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c().await.context("listening for Ctrl-C")?;
    tracing::info!("shutdown requested");

    let stats = tokio::task::spawn_blocking(move || {
        let stats = handle.stats();
        handle.shutdown();
        stats
    })
    .await
    .context("stopping the sweep scheduler")?;

    tracing::info!(stats = %serde_json::to_string(&stats)?, "tradepost worker stopped");
    Ok(())
}
