//! Watch mode: re-runs the full pipeline on a fixed interval.
//!
//! A failed run is logged and the loop keeps going; the next tick retries
//! from scratch. The interval has already been floored by `Config` so an
//! aggressive setting cannot hammer the backing sheet API.

use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::pipeline::orchestrator::PipelineOrchestrator;

pub async fn run_forever(orchestrator: PipelineOrchestrator, interval_secs: u64) {
    let interval = Duration::from_secs(interval_secs);
    info!(interval_secs, "watch mode started");

    loop {
        let started = Instant::now();
        match orchestrator.run_all().await {
            Ok(summary) => {
                info!(
                    run_id = %summary.run_id,
                    companies = summary.companies_reconciled,
                    "scheduled run completed"
                );
            }
            Err(e) => {
                error!("scheduled run failed: {e:#}");
            }
        }
        let sleep_for = interval.saturating_sub(started.elapsed());
        tokio::time::sleep(sleep_for).await;
    }
}
