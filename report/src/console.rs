//! Plain-text rendering of a finished run

use std::collections::BTreeMap;
use std::fmt;

use proxy_bench_core::{
    AggregateStatistics, BenchmarkReport, ComparisonSummary, PreflightReport, Prompt, Provider,
    RequestRecord, RunConfig, RunInfo,
};

const WIDTH: usize = 70;

/// Render `report` the way the binary prints it.
pub fn render_report(report: &BenchmarkReport) -> String {
    ConsoleReport(report).to_string()
}

/// [`fmt::Display`] adapter over a [`BenchmarkReport`]
pub struct ConsoleReport<'a>(pub &'a BenchmarkReport);

impl fmt::Display for ConsoleReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;

        banner(f, "PROXY LATENCY BENCHMARK")?;
        write_config(f, &report.config, report)?;
        writeln!(f)?;
        write_preflight(f, &report.preflight)?;
        writeln!(f)?;
        write_run(f, &report.run)?;

        for (provider, stats) in report.summary.statistics.iter() {
            writeln!(f)?;
            rule(f, provider.display_name())?;
            let records = report
                .results
                .get(provider)
                .map(Vec::as_slice)
                .unwrap_or_default();
            write_statistics(f, stats, records)?;
        }

        if let Some(comparison) = &report.summary.comparison {
            writeln!(f)?;
            banner(f, "COMPARISON (proxy vs direct)")?;
            write_comparison(f, comparison)?;
        }

        writeln!(f, "{}", "=".repeat(WIDTH))
    }
}

fn banner(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "{}", "=".repeat(WIDTH))?;
    writeln!(f, "{title}")?;
    writeln!(f, "{}", "=".repeat(WIDTH))
}

fn rule(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "{}", "-".repeat(WIDTH))?;
    writeln!(f, "{title}")?;
    writeln!(f, "{}", "-".repeat(WIDTH))
}

fn write_config(
    f: &mut fmt::Formatter<'_>,
    config: &RunConfig,
    report: &BenchmarkReport,
) -> fmt::Result {
    writeln!(f, "Mode:          {}", config.mode)?;
    writeln!(f, "Model:         {}", config.model)?;
    writeln!(f, "Prompt:        {}", describe_prompt(config.prompt.as_ref()))?;
    writeln!(
        f,
        "Generation:    max_tokens={} temperature={}",
        config.max_tokens, config.temperature
    )?;
    writeln!(f, "Concurrency:   {}", config.concurrency)?;
    writeln!(
        f,
        "Max requests:  {}",
        config
            .max_requests
            .map_or_else(|| "unbounded".to_string(), |n| n.to_string())
    )?;
    writeln!(
        f,
        "Test duration: {}",
        config
            .test_duration
            .map_or_else(|| "unbounded".to_string(), |s| format!("{s}s"))
    )?;
    for &provider in config.mode.active_providers() {
        if let Some(endpoint) = config.endpoint(provider) {
            writeln!(
                f,
                "{:<15}{}",
                format!("{}:", provider.display_name()),
                endpoint.base_url
            )?;
        }
    }
    writeln!(f, "Started:       {}", report.timestamp.to_rfc3339())
}

fn describe_prompt(prompt: Option<&Prompt>) -> String {
    match prompt {
        None => "(none)".to_string(),
        Some(Prompt::Text(text)) => {
            let count = text.chars().count();
            if count > 60 {
                let head: String = text.chars().take(57).collect();
                format!("{head:?}... ({count} chars)")
            } else {
                format!("{text:?}")
            }
        }
        Some(Prompt::Messages(messages)) => format!("{} messages", messages.len()),
    }
}

fn write_preflight(f: &mut fmt::Formatter<'_>, preflight: &PreflightReport) -> fmt::Result {
    writeln!(f, "Preflight:     {}", preflight.status)?;
    for (provider, outcome) in preflight.outcomes.iter() {
        let record = &outcome.record;
        if outcome.passed {
            writeln!(
                f,
                "  {:<12} ok    {} ms  processing {}",
                provider.display_name(),
                record.total_time_ms,
                format_optional_ms(record.processing_time_ms)
            )?;
        } else {
            writeln!(
                f,
                "  {:<12} FAIL  {}",
                provider.display_name(),
                record.error.as_deref().unwrap_or("unknown error")
            )?;
        }
    }
    for warning in &preflight.warnings {
        writeln!(f, "  warning: {warning}")?;
    }
    Ok(())
}

fn write_run(f: &mut fmt::Formatter<'_>, run: &RunInfo) -> fmt::Result {
    let rate = if run.duration_secs > 0.0 {
        run.rounds as f64 / run.duration_secs
    } else {
        0.0
    };
    writeln!(
        f,
        "Run:           {} rounds in {:.2}s ({:.2} rounds/s, {})",
        run.rounds, run.duration_secs, rate, run.termination
    )
}

fn write_statistics(
    f: &mut fmt::Formatter<'_>,
    stats: &AggregateStatistics,
    records: &[RequestRecord],
) -> fmt::Result {
    writeln!(
        f,
        "Requests:        {} (success {}, failure {})",
        stats.count, stats.success_count, stats.failure_count
    )?;
    writeln!(
        f,
        "Success rate:    {:.2}%  (failure {:.2}%)",
        stats.success_rate, stats.failure_rate
    )?;
    writeln!(
        f,
        "Latency (ms):    avg {:.2}  median {:.2}  p95 {:.2}  p99 {:.2}",
        stats.avg_total_time_ms,
        stats.median_total_time_ms,
        stats.p95_total_time_ms,
        stats.p99_total_time_ms
    )?;
    writeln!(
        f,
        "Range (ms):      min {:.2}  max {:.2}",
        stats.min_total_time_ms, stats.max_total_time_ms
    )?;

    if stats.has_processing_time() {
        writeln!(
            f,
            "Processing (ms): avg {:.2}  ({} samples)",
            stats.avg_processing_time_ms, stats.processing_time_samples
        )?;
        writeln!(f, "Network (ms):    avg {:.2}", stats.avg_network_latency_ms)?;
    } else {
        writeln!(f, "Processing (ms): n/a")?;
        writeln!(f, "Network (ms):    n/a")?;
    }

    writeln!(
        f,
        "Tokens:          prompt {}  completion {}  total {}  (avg {:.2}/request)",
        stats.total_prompt_tokens, stats.total_completion_tokens, stats.total_tokens, stats.avg_tokens
    )?;

    let errors = error_breakdown(records);
    if !errors.is_empty() {
        let joined = errors
            .iter()
            .map(|(kind, count)| format!("{kind} {count}"))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(f, "Errors:          {joined}")?;
    }
    Ok(())
}

/// Failed records counted by error category
pub fn error_breakdown(records: &[RequestRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records.iter().filter(|r| !r.success) {
        let kind = record
            .error_kind
            .map_or_else(|| "unknown".to_string(), |k| k.to_string());
        *counts.entry(kind).or_insert(0) += 1;
    }
    counts
}

fn write_comparison(f: &mut fmt::Formatter<'_>, comparison: &ComparisonSummary) -> fmt::Result {
    writeln!(
        f,
        "Latency overhead:   {:+.2} ms ({})",
        comparison.latency_overhead_ms,
        comparison
            .latency_overhead_percent
            .map_or_else(|| "n/a".to_string(), |p| format!("{p:+.2}%"))
    )?;
    writeln!(f, "P95 overhead:       {:+.2} ms", comparison.p95_overhead_ms)?;
    writeln!(
        f,
        "Network difference: {}",
        comparison
            .network_latency_difference_ms
            .map_or_else(|| "n/a".to_string(), |d| format!("{d:+.2} ms"))
    )?;
    writeln!(
        f,
        "Success rate diff:  {:+.2} pp",
        comparison.success_rate_difference
    )
}

fn format_optional_ms(value: Option<f64>) -> String {
    match value {
        Some(ms) => format!("{ms:.1} ms"),
        None => "n/a".to_string(),
    }
}
