//! Record collection and worker result aggregation

use std::time::Duration;

use tokio::sync::mpsc;

use crate::metrics::RequestRecord;
use crate::provider::{Provider, ProviderMap};
use crate::worker::WorkerStats;

/// Aggregated statistics from all workers
#[derive(Debug, Clone, Default)]
pub struct AggregatedStats {
    /// Number of workers that completed
    pub total_workers: usize,

    /// Total rounds issued
    pub total_rounds: u64,

    /// Total successful records
    pub total_succeeded: usize,

    /// Total failed records
    pub total_failed: usize,

    /// Maximum duration across all workers
    pub total_duration: Duration,

    /// Overall rounds per second
    pub rounds_per_second: f64,
}

impl AggregatedStats {
    /// Get the total number of records (succeeded + failed)
    pub fn total_records(&self) -> usize {
        self.total_succeeded + self.total_failed
    }

    /// Get the success rate (0.0 - 1.0)
    pub fn success_rate(&self) -> f64 {
        let total = self.total_records();
        if total > 0 {
            self.total_succeeded as f64 / total as f64
        } else {
            0.0
        }
    }
}

/// Aggregate statistics from multiple workers
pub fn aggregate_worker_stats(stats: &[WorkerStats]) -> AggregatedStats {
    if stats.is_empty() {
        return AggregatedStats::default();
    }

    let mut merged = WorkerStats::new();
    for worker in stats {
        merged.merge(worker);
    }

    // Use the maximum elapsed time across all workers
    let total_duration = stats
        .iter()
        .filter_map(|s| s.elapsed())
        .max()
        .unwrap_or(Duration::ZERO);

    let secs = total_duration.as_secs_f64();
    let rounds_per_second = if secs > 0.0 {
        merged.rounds as f64 / secs
    } else {
        0.0
    };

    AggregatedStats {
        total_workers: stats.len(),
        total_rounds: merged.rounds,
        total_succeeded: merged.succeeded,
        total_failed: merged.failed,
        total_duration,
        rounds_per_second,
    }
}

/// Drain the record channel into per-provider collections
///
/// Every provider in `providers` gets a collection, even if it stays empty.
/// Returns once all senders are dropped; each collection is ordered by
/// sequence number.
pub async fn collect_records(
    mut records_rx: mpsc::Receiver<RequestRecord>,
    providers: &[Provider],
) -> ProviderMap<Vec<RequestRecord>> {
    let mut results = ProviderMap::new();
    for &provider in providers {
        results.insert(provider, Vec::new());
    }

    while let Some(record) = records_rx.recv().await {
        match results.get_mut(record.provider) {
            Some(records) => records.push(record),
            None => {
                tracing::warn!(
                    provider = %record.provider,
                    sequence = record.sequence,
                    "Dropping record for inactive provider"
                );
            }
        }
    }

    for provider in Provider::all() {
        if let Some(records) = results.get_mut(*provider) {
            records.sort_by_key(|r| r.sequence);
        }
    }

    results
}
