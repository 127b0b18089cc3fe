//! Orchestrator execution logic

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::channel::ChannelConfig;
use crate::error::{BenchError, BenchResult};
use crate::executor::RequestExecutor;
use crate::metrics::RequestRecord;
use crate::provider::{Provider, ProviderMap};
use crate::worker::{RoundPacer, SharedRunState, TerminationReason, WorkerBuilder, WorkerStats};

use super::aggregator::{aggregate_worker_stats, collect_records, AggregatedStats};

/// Result of a completed load run
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    /// Records per validated provider, ordered by sequence
    pub results: ProviderMap<Vec<RequestRecord>>,
    /// Why the run ended
    pub termination: TerminationReason,
    /// Final value of the shared request counter
    pub requests_issued: u64,
    /// Wall time from start until the last worker exited
    pub elapsed: Duration,
    /// Per-worker totals
    pub workers: AggregatedStats,
}

/// Orchestrator drives the load phase
///
/// Responsible for spawning workers over a fresh [`SharedRunState`], running
/// the record collector and reporting the terminal condition. There is no
/// external cancellation: the run ends only through its bounds.
pub struct Orchestrator {
    /// Number of workers
    pub(crate) concurrency: usize,

    /// Round bound
    pub(crate) max_requests: Option<u64>,

    /// Duration bound
    pub(crate) max_duration: Option<Duration>,

    /// Inter-round delay applied by every worker
    pub(crate) pacer: RoundPacer,

    /// One executor per validated provider (shared across workers)
    pub(crate) executors: Arc<[RequestExecutor]>,

    /// Record channel sizing
    pub(crate) channel_config: ChannelConfig,
}

impl Orchestrator {
    /// Providers the workers will call
    pub fn providers(&self) -> Vec<Provider> {
        self.executors.iter().map(RequestExecutor::provider).collect()
    }

    /// Number of workers
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run the load phase
    ///
    /// Spawns the workers, waits for all of them to exit and returns the
    /// collected records.
    pub async fn run(&self) -> BenchResult<LoadOutcome> {
        let state = Arc::new(SharedRunState::new(self.max_requests, self.max_duration));
        let providers = self.providers();

        if state.is_unbounded() {
            tracing::warn!(
                "Neither maxRequests nor testDuration is set; the run will not stop on its own"
            );
        }

        tracing::info!(
            concurrency = self.concurrency,
            max_requests = ?self.max_requests,
            max_duration = ?self.max_duration,
            round_delay = ?self.pacer.delay(),
            providers = ?providers,
            "Starting load phase"
        );

        let (records_tx, records_rx) = mpsc::channel(self.channel_config.records_buffer);
        let collector =
            tokio::spawn(async move { collect_records(records_rx, &providers).await });

        let mut handles = Vec::with_capacity(self.concurrency);
        for worker_id in 0..self.concurrency {
            let worker = WorkerBuilder::new(worker_id)
                .executors(Arc::clone(&self.executors))
                .state(Arc::clone(&state))
                .records_tx(records_tx.clone())
                .pacer(self.pacer)
                .build()?;

            handles.push(tokio::spawn(worker.run()));
        }
        drop(records_tx);

        // Wait for all workers to complete
        let mut results: Vec<WorkerStats> = Vec::with_capacity(handles.len());
        let mut worker_failures = 0;
        for (idx, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(Ok(stats)) => {
                    tracing::debug!(
                        worker_id = idx,
                        rounds = stats.rounds,
                        failed = stats.failed,
                        "Worker completed"
                    );
                    results.push(stats);
                }
                Ok(Err(e)) => {
                    worker_failures += 1;
                    tracing::error!(worker_id = idx, error = %e, "Worker returned error");
                }
                Err(e) => {
                    worker_failures += 1;
                    tracing::error!(worker_id = idx, error = %e, "Worker task panicked");
                }
            }
        }

        let records = collector
            .await
            .map_err(|e| BenchError::orchestration(format!("record collector failed: {e}")))?;

        // If all workers failed, return an error
        if results.is_empty() && worker_failures > 0 {
            return Err(BenchError::orchestration(format!(
                "All {} workers failed to complete",
                worker_failures
            )));
        }

        let elapsed = state.elapsed();
        let workers = aggregate_worker_stats(&results);
        let outcome = LoadOutcome {
            results: records,
            termination: state.termination_reason(),
            requests_issued: state.requests_issued(),
            elapsed,
            workers,
        };

        tracing::info!(
            elapsed_secs = elapsed.as_secs_f64(),
            rounds = outcome.requests_issued,
            termination = %outcome.termination,
            succeeded = outcome.workers.total_succeeded,
            failed = outcome.workers.total_failed,
            "Load phase completed"
        );

        Ok(outcome)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("concurrency", &self.concurrency)
            .field("max_requests", &self.max_requests)
            .field("max_duration", &self.max_duration)
            .field("pacer", &self.pacer)
            .field("providers", &self.providers())
            .finish()
    }
}
