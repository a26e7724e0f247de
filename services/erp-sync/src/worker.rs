use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info};

use crate::domain::repository::{InventoryGateway, OutboxStore};
use crate::domain::types::ProcessSummary;
use crate::usecase::process::ProcessPendingUseCase;

/// Totals accumulated by a worker over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerTotals {
    pub rounds: u64,
    pub processed: u64,
    pub failed: u64,
    pub round_errors: u64,
}

/// Polling driver: one `process_pending` round per tick until shutdown is signalled.
pub struct OutboxWorker<S, G>
where
    S: OutboxStore,
    G: InventoryGateway,
{
    pub process: ProcessPendingUseCase<S, G>,
    pub batch_size: u64,
    pub poll_interval: Duration,
}

impl<S, G> OutboxWorker<S, G>
where
    S: OutboxStore,
    G: InventoryGateway,
{
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> WorkerTotals {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut totals = WorkerTotals::default();

        info!(
            batch_size = self.batch_size,
            poll_interval_secs = self.poll_interval.as_secs(),
            "outbox worker started"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    match self.process.execute(self.batch_size).await {
                        Ok(summary) => totals.add(&summary),
                        Err(err) => {
                            totals.rounds += 1;
                            totals.round_errors += 1;
                            error!(error = ?err, "outbox processing round failed");
                        }
                    }
                }
            }
        }

        info!(
            rounds = totals.rounds,
            processed = totals.processed,
            failed = totals.failed,
            round_errors = totals.round_errors,
            "outbox worker stopped"
        );
        totals
    }
}

impl WorkerTotals {
    fn add(&mut self, summary: &ProcessSummary) {
        self.rounds += 1;
        self.processed += summary.processed as u64;
        self.failed += summary.failed as u64;
        if summary.is_empty() {
            debug!("no due sagas");
        } else {
            info!(
                processed = summary.processed,
                failed = summary.failed,
                "outbox round finished"
            );
        }
    }
}
