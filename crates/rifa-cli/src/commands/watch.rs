use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use rifa_engine::spawn_sweeper;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Override the configured sweep interval, in seconds.
    #[arg(long)]
    pub interval: Option<u64>,
}

pub async fn run(config_path: &str, args: &WatchArgs) -> anyhow::Result<()> {
    let workspace = super::open(config_path)?;

    let interval = args.interval.unwrap_or(workspace.config.sweep_interval_secs);
    let handle = spawn_sweeper(
        Arc::clone(&workspace.engine.orchestrator),
        Duration::from_secs(interval),
    );

    tracing::info!(interval_secs = interval, "sweeper running, ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    handle.abort();

    super::persist(&workspace)?;
    println!("stopped");
    Ok(())
}
