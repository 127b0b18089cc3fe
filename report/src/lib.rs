//! Report output for benchmark results
//!
//! This crate turns a finished [`BenchmarkReport`] into:
//!
//! - A console summary (configuration, preflight, per-provider statistics,
//!   comparison)
//! - A pretty-printed JSON file that can be loaded back

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod console;
pub mod error;
pub mod json;

pub use console::{error_breakdown, render_report, ConsoleReport};
pub use error::ReportError;
pub use json::{load_report, report_file_name, write_report};

#[doc(no_inline)]
pub use proxy_bench_core::BenchmarkReport;
