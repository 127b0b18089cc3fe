//! End-to-end run: validate, probe, drive load, summarize

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::RunConfig;
use crate::error::{BenchError, BenchResult};
use crate::executor::RequestExecutor;
use crate::metrics::{BenchmarkSummary, RequestRecord};
use crate::orchestrator::OrchestratorBuilder;
use crate::preflight::{PreflightReport, PreflightValidator};
use crate::provider::{Provider, ProviderMap};
use crate::traits::Completer;
use crate::worker::TerminationReason;

/// How the load phase ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    /// Which bound ended the run
    pub termination: TerminationReason,
    /// Load phase wall time in seconds
    pub duration_secs: f64,
    /// Rounds issued
    pub rounds: u64,
    /// Workers used
    pub concurrency: usize,
}

/// Everything a finished run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// When the run started
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Configuration used; credentials are never serialized
    pub config: RunConfig,
    /// Per-provider statistics and comparison
    pub summary: BenchmarkSummary,
    /// Load phase details
    pub run: RunInfo,
    /// Preflight outcome
    pub preflight: PreflightReport,
    /// Raw records per provider
    pub results: ProviderMap<Vec<RequestRecord>>,
}

/// Run a complete benchmark
///
/// `completers` must hold one completer per provider active in
/// `config.mode`; extra entries are ignored. Configuration problems and
/// preflight failures abort before the load phase issues any request.
pub async fn run_benchmark(
    config: &RunConfig,
    completers: &ProviderMap<Arc<dyn Completer>>,
) -> BenchResult<BenchmarkReport> {
    config.validate()?;
    let timestamp = chrono::Utc::now();
    let prompt = config
        .prompt
        .as_ref()
        .ok_or(crate::config::ConfigError::MissingPrompt)?;
    let params = config.generation_params();

    let mut probes = Vec::new();
    let mut load = Vec::new();
    for &provider in config.mode.active_providers() {
        let completer = completers
            .get(provider)
            .ok_or(BenchError::MissingCompleter(provider))?;
        probes.push(RequestExecutor::probe(
            Arc::clone(completer),
            &config.model,
            prompt,
            params,
        )?);
        load.push(RequestExecutor::new(
            Arc::clone(completer),
            &config.model,
            prompt,
            params,
        )?);
    }

    tracing::info!(
        mode = %config.mode,
        model = %config.model,
        providers = ?config.mode.active_providers(),
        "Running preflight"
    );
    let preflight = PreflightValidator::new(probes).validate().await?;

    let enabled: Vec<Provider> = preflight.enabled_providers();
    let orchestrator = OrchestratorBuilder::from_config(config)
        .executors(
            load.into_iter()
                .filter(|executor| enabled.contains(&executor.provider())),
        )
        .build()?;

    let outcome = orchestrator.run().await?;
    let summary = BenchmarkSummary::from_results(config.mode, &outcome.results);

    Ok(BenchmarkReport {
        timestamp,
        config: config.clone(),
        summary,
        run: RunInfo {
            termination: outcome.termination,
            duration_secs: outcome.elapsed.as_secs_f64(),
            rounds: outcome.requests_issued,
            concurrency: config.concurrency,
        },
        preflight,
        results: outcome.results,
    })
}
