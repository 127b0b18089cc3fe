//! Worker module for driving load rounds
//!
//! The Worker is the core execution unit of a load run, responsible for the
//! simple loop: **check -> claim -> dispatch -> report -> pause**.
//!
//! Each Worker is a tokio task that:
//!
//! 1. Exits when the shared stop flag is set
//! 2. Commits a time-limit or max-requests stop when a bound has fired
//! 3. Claims the next round sequence number from [`SharedRunState`]
//! 4. Calls every validated provider concurrently through a
//!    [`RequestExecutor`](crate::executor::RequestExecutor)
//! 5. Sends the resulting records to the collector via channel
//! 6. Sleeps the [`RoundPacer`] delay and repeats
//!
//! # Example
//!
//! ```ignore
//! use proxy_bench_core::worker::{RoundPacer, SharedRunState, WorkerBuilder};
//!
//! let state = Arc::new(SharedRunState::new(Some(100), None));
//! let worker = WorkerBuilder::new(0)
//!     .executors(executors)
//!     .state(Arc::clone(&state))
//!     .records_tx(tx)
//!     .pacer(RoundPacer::for_concurrency(4, None))
//!     .build()?;
//!
//! let stats = worker.run().await?;
//! println!("Rounds: {}", stats.rounds);
//! ```

mod builder;
mod executor;
mod pacing;
mod state;
mod stats;

pub use builder::WorkerBuilder;
pub use executor::Worker;
pub use pacing::{
    RoundPacer, DEFAULT_ROUND_DELAY, HIGH_CONCURRENCY_ROUND_DELAY, HIGH_CONCURRENCY_THRESHOLD,
};
pub use state::{SharedRunState, TerminationReason};
pub use stats::WorkerStats;

#[cfg(test)]
mod tests;
