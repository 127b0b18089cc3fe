//! Worker execution loop

use crate::error::{BenchError, BenchResult};
use crate::executor::RequestExecutor;
use crate::metrics::RequestRecord;

use super::pacing::RoundPacer;
use super::state::SharedRunState;
use super::stats::WorkerStats;

use std::sync::Arc;
use tokio::sync::mpsc;

/// Worker executes rounds in a loop: check -> claim -> dispatch -> report -> pause
///
/// A round is one call per validated provider, issued concurrently and
/// sharing a sequence number and start timestamp. Workers coordinate only
/// through [`SharedRunState`].
pub struct Worker {
    /// Unique worker identifier
    id: usize,

    /// One executor per validated provider
    executors: Arc<[RequestExecutor]>,

    /// Shared counter and stop flags
    state: Arc<SharedRunState>,

    /// Channel sender for request records
    records_tx: mpsc::Sender<RequestRecord>,

    /// Inter-round delay
    pacer: RoundPacer,
}

impl Worker {
    /// Create a new worker
    pub fn new(
        id: usize,
        executors: Arc<[RequestExecutor]>,
        state: Arc<SharedRunState>,
        records_tx: mpsc::Sender<RequestRecord>,
        pacer: RoundPacer,
    ) -> Self {
        Self {
            id,
            executors,
            state,
            records_tx,
            pacer,
        }
    }

    /// Run the worker loop
    ///
    /// Returns WorkerStats once the shared state says to stop. Fails only if
    /// the record collector has gone away.
    pub async fn run(self) -> BenchResult<WorkerStats> {
        let mut stats = WorkerStats::new();
        stats.start();

        tracing::debug!(worker_id = self.id, "Worker started");

        loop {
            if self.state.should_stop() {
                tracing::debug!(worker_id = self.id, "Stop flag set, worker stopping");
                break;
            }

            if let Some(reason) = self.state.check_bounds() {
                tracing::debug!(worker_id = self.id, %reason, "Worker reached stop condition");
                break;
            }

            let Some(sequence) = self.state.try_claim() else {
                tracing::debug!(
                    worker_id = self.id,
                    "No more requests to claim, worker stopping"
                );
                break;
            };

            let round_started_at = chrono::Utc::now();
            let records = futures::future::join_all(
                self.executors
                    .iter()
                    .map(|executor| executor.execute(sequence, round_started_at)),
            )
            .await;

            stats.record_round(&records);
            tracing::debug!(
                worker_id = self.id,
                sequence,
                succeeded = records.iter().filter(|r| r.success).count(),
                "Round completed"
            );

            for record in records {
                if self.records_tx.send(record).await.is_err() {
                    stats.stop();
                    return Err(BenchError::orchestration(format!(
                        "record channel closed while worker {} was reporting round {}",
                        self.id, sequence
                    )));
                }
            }

            self.pacer.wait().await;
        }

        stats.stop();
        tracing::debug!(
            worker_id = self.id,
            rounds = stats.rounds,
            succeeded = stats.succeeded,
            failed = stats.failed,
            elapsed_ms = ?stats.elapsed().map(|d| d.as_millis()),
            "Worker finished"
        );

        Ok(stats)
    }

    /// Get the worker ID
    pub fn id(&self) -> usize {
        self.id
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field(
                "providers",
                &self
                    .executors
                    .iter()
                    .map(RequestExecutor::provider)
                    .collect::<Vec<_>>(),
            )
            .field("pacer", &self.pacer)
            .finish()
    }
}
