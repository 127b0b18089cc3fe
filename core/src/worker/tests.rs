//! Integration tests for the Worker module

use super::*;
use crate::error::BenchError;
use crate::executor::RequestExecutor;
use crate::metrics::RequestRecord;
use crate::provider::Provider;
use crate::request::{CompletionRequest, GenerationParams, Prompt};
use crate::response::{CompletionResponse, ResponseHeaders};
use crate::traits::{Completer, CompleterError};

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

// ============================================================================
// Mock Completer
// ============================================================================

struct MockCompleter {
    provider: Provider,
    delay: Option<Duration>,
    fail_every: Option<usize>,
    calls: AtomicUsize,
}

impl MockCompleter {
    fn new(provider: Provider) -> Self {
        Self {
            provider,
            delay: None,
            fail_every: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn with_fail_every(mut self, n: usize) -> Self {
        self.fail_every = Some(n);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Completer for MockCompleter {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn create(
        &self,
        _request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompleterError> {
        let count = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(fail_every) = self.fail_every {
            if count % fail_every == 0 {
                return Err(CompleterError::Status {
                    status: 500,
                    message: "Simulated failure".to_string(),
                });
            }
        }

        Ok(CompletionResponse {
            status: 200,
            headers: ResponseHeaders::new().with("x-processing-ms", "3"),
            body: serde_json::json!({"usage": {"prompt_tokens": 4, "completion_tokens": 6}}),
        })
    }
}

// ============================================================================
// Helper functions
// ============================================================================

fn executor(completer: Arc<MockCompleter>) -> RequestExecutor {
    RequestExecutor::new(
        completer,
        "test-model",
        &Prompt::from("Test message"),
        GenerationParams::default(),
    )
    .expect("Failed to build executor")
}

fn create_test_worker(
    id: usize,
    completers: &[Arc<MockCompleter>],
    state: Arc<SharedRunState>,
    buffer: usize,
) -> (Worker, mpsc::Receiver<RequestRecord>) {
    let (records_tx, records_rx) = mpsc::channel(buffer);
    let executors: Arc<[RequestExecutor]> = completers.iter().cloned().map(executor).collect();

    let worker = WorkerBuilder::new(id)
        .executors(executors)
        .state(state)
        .records_tx(records_tx)
        .pacer(RoundPacer::unpaced())
        .build()
        .expect("Failed to build worker");

    (worker, records_rx)
}

fn drain(rx: &mut mpsc::Receiver<RequestRecord>) -> Vec<RequestRecord> {
    let mut records = Vec::new();
    while let Ok(record) = rx.try_recv() {
        records.push(record);
    }
    records
}

// ============================================================================
// Integration Tests
// ============================================================================

#[tokio::test]
async fn test_worker_run_request_count() {
    let completer = Arc::new(MockCompleter::new(Provider::Proxy));
    let state = Arc::new(SharedRunState::new(Some(5), None));
    let (worker, mut records_rx) =
        create_test_worker(0, &[completer.clone()], Arc::clone(&state), 100);

    let stats = worker.run().await.expect("Worker failed");

    assert_eq!(stats.rounds, 5);
    assert_eq!(stats.succeeded, 5);
    assert_eq!(completer.calls(), 5);
    assert_eq!(state.requests_issued(), 5);
    assert_eq!(state.termination_reason(), TerminationReason::MaxRequests);

    let records = drain(&mut records_rx);
    let sequences: Vec<u64> = records.iter().map(|r| r.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_worker_round_pairs_providers() {
    let direct = Arc::new(MockCompleter::new(Provider::Direct));
    let proxy = Arc::new(MockCompleter::new(Provider::Proxy));
    let state = Arc::new(SharedRunState::new(Some(3), None));
    let (worker, mut records_rx) =
        create_test_worker(0, &[direct.clone(), proxy.clone()], state, 100);

    let stats = worker.run().await.expect("Worker failed");
    assert_eq!(stats.rounds, 3);
    assert_eq!(stats.total_records(), 6);

    let records = drain(&mut records_rx);
    for pair in records.chunks(2) {
        assert_eq!(pair[0].provider, Provider::Direct);
        assert_eq!(pair[1].provider, Provider::Proxy);
        assert_eq!(pair[0].sequence, pair[1].sequence);
        assert_eq!(pair[0].timestamp, pair[1].timestamp);
    }
    assert_eq!(direct.calls(), 3);
    assert_eq!(proxy.calls(), 3);
}

#[tokio::test]
async fn test_worker_round_calls_run_concurrently() {
    let delay = Duration::from_millis(100);
    let direct = Arc::new(MockCompleter::new(Provider::Direct).with_delay(delay));
    let proxy = Arc::new(MockCompleter::new(Provider::Proxy).with_delay(delay));
    let state = Arc::new(SharedRunState::new(Some(1), None));
    let (worker, _records_rx) = create_test_worker(0, &[direct, proxy], state, 10);

    let start = std::time::Instant::now();
    worker.run().await.expect("Worker failed");

    assert!(start.elapsed() < Duration::from_millis(190));
}

#[tokio::test]
async fn test_worker_run_with_errors() {
    let completer = Arc::new(MockCompleter::new(Provider::Proxy).with_fail_every(2));
    let state = Arc::new(SharedRunState::new(Some(5), None));
    let (worker, mut records_rx) = create_test_worker(0, &[completer], state, 100);

    let stats = worker.run().await.expect("Worker failed");

    assert_eq!(stats.total_records(), 5);
    assert_eq!(stats.succeeded, 3);
    assert_eq!(stats.failed, 2);

    let failed: Vec<_> = drain(&mut records_rx)
        .into_iter()
        .filter(|r| !r.success)
        .collect();
    assert_eq!(failed.len(), 2);
    assert!(failed.iter().all(|r| r.status == Some(500)));
}

#[tokio::test]
async fn test_worker_run_duration() {
    let completer =
        Arc::new(MockCompleter::new(Provider::Proxy).with_delay(Duration::from_millis(20)));
    let state = Arc::new(SharedRunState::new(None, Some(Duration::from_millis(100))));
    let (worker, mut records_rx) =
        create_test_worker(0, &[completer], Arc::clone(&state), 1000);

    let drain_handle = tokio::spawn(async move { while records_rx.recv().await.is_some() {} });

    let start = std::time::Instant::now();
    let stats = worker.run().await.expect("Worker failed");
    let elapsed = start.elapsed();
    drain_handle.abort();

    assert!(elapsed >= Duration::from_millis(100));
    assert!(stats.rounds > 0);
    assert_eq!(state.termination_reason(), TerminationReason::TimeLimit);
}

#[tokio::test]
async fn test_worker_exits_when_stop_already_set() {
    let completer = Arc::new(MockCompleter::new(Provider::Proxy));
    let state = Arc::new(SharedRunState::new(None, None));
    state.commit_stop(TerminationReason::TimeLimit);
    let (worker, _records_rx) = create_test_worker(0, &[completer.clone()], state, 10);

    let stats = worker.run().await.expect("Worker failed");

    assert_eq!(stats.rounds, 0);
    assert_eq!(completer.calls(), 0);
}

#[tokio::test]
async fn test_worker_channel_closed() {
    let completer = Arc::new(MockCompleter::new(Provider::Proxy));
    let state = Arc::new(SharedRunState::new(Some(5), None));
    let (worker, records_rx) = create_test_worker(0, &[completer], state, 10);
    drop(records_rx);

    let result = worker.run().await;
    assert!(matches!(result, Err(BenchError::Orchestration(_))));
}

#[tokio::test]
async fn test_workers_never_share_sequence_numbers() {
    let completer = Arc::new(MockCompleter::new(Provider::Proxy));
    let state = Arc::new(SharedRunState::new(Some(200), None));
    let (records_tx, mut records_rx) = mpsc::channel(1000);
    let executors: Arc<[RequestExecutor]> = vec![executor(completer.clone())].into();

    let handles: Vec<_> = (0..8)
        .map(|id| {
            let worker = WorkerBuilder::new(id)
                .executors(Arc::clone(&executors))
                .state(Arc::clone(&state))
                .records_tx(records_tx.clone())
                .pacer(RoundPacer::unpaced())
                .build()
                .expect("Failed to build worker");
            tokio::spawn(worker.run())
        })
        .collect();
    drop(records_tx);

    let mut total_rounds = 0;
    for handle in handles {
        total_rounds += handle.await.unwrap().unwrap().rounds;
    }

    let mut seen = HashSet::new();
    while let Some(record) = records_rx.recv().await {
        assert!(seen.insert(record.sequence), "duplicate sequence");
    }

    assert_eq!(total_rounds, 200);
    assert_eq!(seen.len(), 200);
    assert_eq!(completer.calls(), 200);
    assert_eq!(state.requests_issued(), 200);
}

#[tokio::test(start_paused = true)]
async fn test_worker_paces_rounds() {
    let completer = Arc::new(MockCompleter::new(Provider::Proxy));
    let state = Arc::new(SharedRunState::new(Some(3), None));
    let (records_tx, _records_rx) = mpsc::channel(10);

    let worker = WorkerBuilder::new(0)
        .executors(vec![executor(completer)].into())
        .state(state)
        .records_tx(records_tx)
        .pacer(RoundPacer::new(Duration::from_millis(100)))
        .build()
        .expect("Failed to build worker");

    let start = tokio::time::Instant::now();
    worker.run().await.expect("Worker failed");

    assert!(start.elapsed() >= Duration::from_millis(300));
}
