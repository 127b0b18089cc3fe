//! JSON persistence of finished runs

use std::fs;
use std::path::{Path, PathBuf};

use proxy_bench_core::BenchmarkReport;

use crate::error::ReportError;

/// File name a report is saved under: `benchmark-<mode>-<YYYYmmdd-HHMMSS>.json`
pub fn report_file_name(report: &BenchmarkReport) -> String {
    format!(
        "benchmark-{}-{}.json",
        report.config.mode.id(),
        report.timestamp.format("%Y%m%d-%H%M%S")
    )
}

/// Write `report` as pretty-printed JSON into `dir`, creating it if needed.
///
/// Returns the path written. Credentials are never part of the output.
pub fn write_report(
    report: &BenchmarkReport,
    dir: impl AsRef<Path>,
) -> Result<PathBuf, ReportError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| ReportError::io("creating", dir, e))?;

    let path = dir.join(report_file_name(report));
    let json = serde_json::to_string_pretty(report)?;
    fs::write(&path, json).map_err(|e| ReportError::io("writing", &path, e))?;

    tracing::info!(path = %path.display(), "Saved report");
    Ok(path)
}

/// Read a report previously saved with [`write_report`].
pub fn load_report(path: impl AsRef<Path>) -> Result<BenchmarkReport, ReportError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|e| ReportError::io("reading", path, e))?;
    Ok(serde_json::from_str(&json)?)
}
