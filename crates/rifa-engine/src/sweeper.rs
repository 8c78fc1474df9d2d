//! Background reservation-expiry sweep.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;

use crate::orchestrator::SettlementOrchestrator;

/// Spawn the periodic expiry sweep.
///
/// Every `interval`, abandoned purchases past their reservation deadline are
/// unwound: tickets return to the pool and their payments are rejected. The
/// sweep is conditional on both sides, so it can run concurrently with
/// user-facing settlement without clobbering a just-committed sale.
///
/// The task runs until the returned handle is aborted.
pub fn spawn_sweeper(
    orchestrator: Arc<SettlementOrchestrator>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so a fresh engine is not
        // swept before it has served anything.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let swept = orchestrator.sweep_expired(Utc::now());
            if swept > 0 {
                tracing::info!(swept, "expiry sweep released abandoned purchases");
            }
        }
    })
}
