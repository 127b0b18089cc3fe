//! Builder pattern for Worker construction

use crate::error::{BenchError, BenchResult};
use crate::executor::RequestExecutor;
use crate::metrics::RequestRecord;

use super::executor::Worker;
use super::pacing::RoundPacer;
use super::state::SharedRunState;

use std::sync::Arc;
use tokio::sync::mpsc;

/// Builder for creating Worker instances
///
/// # Example
/// ```ignore
/// let worker = WorkerBuilder::new(0)
///     .executors(executors)
///     .state(state)
///     .records_tx(tx)
///     .pacer(RoundPacer::for_concurrency(4, None))
///     .build()?;
/// ```
pub struct WorkerBuilder {
    id: usize,
    executors: Option<Arc<[RequestExecutor]>>,
    state: Option<Arc<SharedRunState>>,
    records_tx: Option<mpsc::Sender<RequestRecord>>,
    pacer: RoundPacer,
}

impl WorkerBuilder {
    /// Create a new builder with the given worker ID
    pub fn new(id: usize) -> Self {
        Self {
            id,
            executors: None,
            state: None,
            records_tx: None,
            pacer: RoundPacer::default(),
        }
    }

    /// Set the per-provider executors
    pub fn executors(mut self, executors: Arc<[RequestExecutor]>) -> Self {
        self.executors = Some(executors);
        self
    }

    /// Set the shared run state
    pub fn state(mut self, state: Arc<SharedRunState>) -> Self {
        self.state = Some(state);
        self
    }

    /// Set the record channel sender
    pub fn records_tx(mut self, tx: mpsc::Sender<RequestRecord>) -> Self {
        self.records_tx = Some(tx);
        self
    }

    /// Set the inter-round pacer
    pub fn pacer(mut self, pacer: RoundPacer) -> Self {
        self.pacer = pacer;
        self
    }

    /// Build the Worker
    ///
    /// # Errors
    /// Returns an error if any required field is missing or no executor was
    /// supplied.
    pub fn build(self) -> BenchResult<Worker> {
        let executors = self
            .executors
            .filter(|executors| !executors.is_empty())
            .ok_or(BenchError::MissingConfig("executors"))?;
        let state = self.state.ok_or(BenchError::MissingConfig("state"))?;
        let records_tx = self
            .records_tx
            .ok_or(BenchError::MissingConfig("records_tx"))?;

        Ok(Worker::new(self.id, executors, state, records_tx, self.pacer))
    }
}
