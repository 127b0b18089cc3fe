//! Builder pattern for Orchestrator construction

use std::sync::Arc;
use std::time::Duration;

use crate::channel::ChannelConfig;
use crate::config::{ConfigError, RunConfig};
use crate::error::{BenchError, BenchResult};
use crate::executor::RequestExecutor;
use crate::worker::RoundPacer;

use super::executor::Orchestrator;

/// Builder for creating an Orchestrator with proper configuration
///
/// # Example
///
/// ```ignore
/// let orchestrator = OrchestratorBuilder::from_config(&config)
///     .executors(executors)
///     .build()?;
///
/// let outcome = orchestrator.run().await?;
/// ```
pub struct OrchestratorBuilder {
    concurrency: usize,
    max_requests: Option<u64>,
    max_duration: Option<Duration>,
    pacer: Option<RoundPacer>,
    executors: Vec<RequestExecutor>,
    channel_config: ChannelConfig,
}

impl OrchestratorBuilder {
    /// Create a new orchestrator builder with one worker and no bounds
    pub fn new() -> Self {
        Self {
            concurrency: 1,
            max_requests: None,
            max_duration: None,
            pacer: None,
            executors: Vec::new(),
            channel_config: ChannelConfig::default(),
        }
    }

    /// Take concurrency, bounds and pacing from a run configuration
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new()
            .concurrency(config.concurrency)
            .max_requests(config.max_requests)
            .max_duration(config.max_duration())
            .pacer(RoundPacer::for_concurrency(
                config.concurrency,
                config.round_delay_ms,
            ))
    }

    /// Set the number of workers
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the round bound
    pub fn max_requests(mut self, max: Option<u64>) -> Self {
        self.max_requests = max;
        self
    }

    /// Set the duration bound
    pub fn max_duration(mut self, max: Option<Duration>) -> Self {
        self.max_duration = max;
        self
    }

    /// Set the inter-round pacer
    ///
    /// Defaults to [`RoundPacer::for_concurrency`] without override.
    pub fn pacer(mut self, pacer: RoundPacer) -> Self {
        self.pacer = Some(pacer);
        self
    }

    /// Add an executor for one validated provider
    pub fn executor(mut self, executor: RequestExecutor) -> Self {
        self.executors.push(executor);
        self
    }

    /// Add executors for several validated providers
    pub fn executors(mut self, executors: impl IntoIterator<Item = RequestExecutor>) -> Self {
        self.executors.extend(executors);
        self
    }

    /// Set the channel configuration
    pub fn channel_config(mut self, config: ChannelConfig) -> Self {
        self.channel_config = config;
        self
    }

    /// Build the orchestrator
    ///
    /// # Errors
    ///
    /// Returns an error if no executor was added or a bound is invalid.
    pub fn build(self) -> BenchResult<Orchestrator> {
        if self.executors.is_empty() {
            return Err(BenchError::MissingConfig("executors"));
        }

        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency("concurrency must be at least 1".into()).into());
        }

        if self.max_requests == Some(0) {
            return Err(ConfigError::InvalidStopCondition("maxRequests must be at least 1".into()).into());
        }

        let pacer = self
            .pacer
            .unwrap_or_else(|| RoundPacer::for_concurrency(self.concurrency, None));

        Ok(Orchestrator {
            concurrency: self.concurrency,
            max_requests: self.max_requests,
            max_duration: self.max_duration,
            pacer,
            executors: Arc::from(self.executors),
            channel_config: self.channel_config,
        })
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
