//! proxy-bench-core: dispatch engine and statistics for proxy latency benchmarks
//!
//! This crate provides everything between a run configuration and a finished
//! report, independent of any HTTP library:
//!
//! - Run configuration, providers and mode selection
//! - The `Completer` capability trait and the request executor around it
//! - Preflight validation
//! - The worker pool with its lock-free shared run state
//! - Aggregate statistics, percentiles and the proxy-versus-direct comparison

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod benchmark;
pub mod channel;
pub mod config;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod orchestrator;
pub mod preflight;
pub mod provider;
pub mod request;
pub mod response;
pub mod traits;
pub mod worker;

pub use benchmark::{run_benchmark, BenchmarkReport, RunInfo};
pub use channel::ChannelConfig;
pub use config::{ConfigError, ProviderEndpoint, RunConfig};
pub use error::*;
pub use executor::RequestExecutor;
pub use metrics::*;
pub use orchestrator::{LoadOutcome, Orchestrator, OrchestratorBuilder};
pub use preflight::{PreflightReport, PreflightStatus, PreflightValidator, ProbeOutcome};
pub use provider::{Mode, Provider, ProviderMap, UnknownMode};
pub use request::*;
pub use response::*;
pub use traits::*;
pub use worker::{RoundPacer, SharedRunState, TerminationReason, Worker, WorkerBuilder, WorkerStats};
