//! Scheduler loop — runs the workflow engine forever on a fixed
//! interval.
//!
//! Best-effort polling: every cycle is isolated, a failed run is logged
//! and the loop continues. No backoff, no jitter, no retry cap — the
//! only failure containment is "next cycle starts fresh".

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::workflow::engine::WorkflowEngine;
use crate::workflow::state::RunStatus;

/// Spawn the background scheduler.
///
/// Returns a `JoinHandle` and a shutdown flag. Set the flag to stop the
/// loop at the next tick.
pub fn spawn_scheduler(
    engine: Arc<WorkflowEngine>,
    poll_interval: Duration,
) -> (JoinHandle<()>, Arc<AtomicBool>) {
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);

    let handle = tokio::spawn(async move {
        info!(
            "Triage scheduler started — one run every {}s",
            poll_interval.as_secs()
        );

        let mut tick = tokio::time::interval(poll_interval);

        loop {
            tick.tick().await;

            if shutdown.load(Ordering::Relaxed) {
                info!("Triage scheduler shutting down");
                return;
            }

            run_cycle(&engine).await;
        }
    });

    (handle, shutdown_flag)
}

/// Execute one workflow run and report its outcome. Never fails.
async fn run_cycle(engine: &WorkflowEngine) {
    match engine.run_once().await {
        Ok(state) => match state.status {
            RunStatus::NoNewEmails => info!("No new emails detected"),
            RunStatus::Sent => info!(sender = %state.sender, "Replied to sender"),
            other => info!(status = other.label(), "Cycle complete"),
        },
        // Fatal to the run only — the message stays unread and will be
        // picked up again next cycle.
        Err(e) => error!("Cycle failed: {e}"),
    }
}
