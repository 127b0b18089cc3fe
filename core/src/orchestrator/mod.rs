//! Orchestrator for the load phase
//!
//! The Orchestrator coordinates one load run:
//! - Spawning one worker task per configured concurrency slot
//! - Sharing a lock-free [`SharedRunState`](crate::worker::SharedRunState)
//!   between them
//! - Collecting records from all workers over a bounded channel
//! - Reporting which bound ended the run
//!
//! # Example
//!
//! ```ignore
//! use proxy_bench_core::OrchestratorBuilder;
//!
//! let orchestrator = OrchestratorBuilder::from_config(&config)
//!     .executors(executors)
//!     .build()?;
//!
//! let outcome = orchestrator.run().await?;
//! println!("{} rounds, ended by {}", outcome.requests_issued, outcome.termination);
//! ```

mod aggregator;
mod builder;
mod executor;

pub use aggregator::{aggregate_worker_stats, collect_records, AggregatedStats};
pub use builder::OrchestratorBuilder;
pub use executor::{LoadOutcome, Orchestrator};
