//! Worker statistics tracking

use std::time::Instant;

use crate::metrics::RequestRecord;

/// Statistics tracked by each worker
#[derive(Debug, Default, Clone)]
pub struct WorkerStats {
    /// Rounds this worker issued
    pub rounds: u64,

    /// Records that succeeded
    pub succeeded: usize,

    /// Records that failed
    pub failed: usize,

    /// Worker start time
    pub started_at: Option<Instant>,

    /// Worker end time
    pub ended_at: Option<Instant>,
}

impl WorkerStats {
    /// Create new empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking (records start time)
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    /// Stop tracking (records end time)
    pub fn stop(&mut self) {
        self.ended_at = Some(Instant::now());
    }

    /// Count one round and its records
    pub fn record_round(&mut self, records: &[RequestRecord]) {
        self.rounds += 1;
        for record in records {
            if record.success {
                self.succeeded += 1;
            } else {
                self.failed += 1;
            }
        }
    }

    /// Records produced (succeeded + failed)
    pub fn total_records(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Successful share of records (0.0 - 1.0)
    pub fn success_rate(&self) -> f64 {
        if self.total_records() == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.total_records() as f64
        }
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> Option<std::time::Duration> {
        self.started_at.map(|start| {
            self.ended_at
                .map(|end| end.duration_since(start))
                .unwrap_or_else(|| start.elapsed())
        })
    }

    /// Merge stats from another worker
    pub fn merge(&mut self, other: &WorkerStats) {
        self.rounds += other.rounds;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
    }
}
