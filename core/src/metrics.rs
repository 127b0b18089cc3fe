//! Request records, aggregate statistics and percentile calculation

use crate::error::ErrorKind;
use crate::provider::{Mode, Provider, ProviderMap};
use crate::response::TokenUsage;
use serde::{Deserialize, Serialize};

/// Outcome of one network attempt against one provider
///
/// Immutable once created. Records of the same round share `sequence` and
/// `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    /// Provider the request was sent to
    pub provider: Provider,
    /// Round sequence number (0 for preflight probes)
    pub sequence: u64,
    /// Round start
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Wall time from dispatch to completion, whole milliseconds
    pub total_time_ms: u64,
    /// Upstream processing time reported in the response headers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<f64>,
    /// `total_time_ms - processing_time_ms`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_latency_ms: Option<f64>,
    /// Whether the call succeeded
    pub success: bool,
    /// Error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Heuristic error category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// HTTP status, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Token usage (zero on failure)
    pub usage: TokenUsage,
}

impl RequestRecord {
    /// Record a successful call
    pub fn success(
        provider: Provider,
        sequence: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
        total_time_ms: u64,
    ) -> Self {
        Self {
            provider,
            sequence,
            timestamp,
            total_time_ms,
            processing_time_ms: None,
            network_latency_ms: None,
            success: true,
            error: None,
            error_kind: None,
            status: None,
            usage: TokenUsage::default(),
        }
    }

    /// Record a failed call, classifying the error message
    pub fn failure(
        provider: Provider,
        sequence: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
        total_time_ms: u64,
        error: impl Into<String>,
    ) -> Self {
        let error = error.into();
        Self {
            provider,
            sequence,
            timestamp,
            total_time_ms,
            processing_time_ms: None,
            network_latency_ms: None,
            success: false,
            error_kind: Some(ErrorKind::classify(&error)),
            error: Some(error),
            status: None,
            usage: TokenUsage::default(),
        }
    }

    /// Attach the upstream processing time and derive network latency
    pub fn with_processing_time(mut self, processing_time_ms: Option<f64>) -> Self {
        self.processing_time_ms = processing_time_ms;
        self.network_latency_ms = processing_time_ms.map(|p| self.total_time_ms as f64 - p);
        self
    }

    /// Attach token usage
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Attach the HTTP status
    pub fn with_status(mut self, status: Option<u16>) -> Self {
        self.status = status;
        self
    }
}

/// Aggregate statistics for one provider over one run
///
/// Timing fields are computed over successful records only. All times are in
/// milliseconds; rates are percentages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateStatistics {
    /// Total attempts
    pub count: usize,
    /// Successful attempts
    pub success_count: usize,
    /// Failed attempts
    pub failure_count: usize,
    /// Successful share of attempts (0 - 100)
    pub success_rate: f64,
    /// Failed share of attempts (0 - 100)
    pub failure_rate: f64,
    /// Mean total time
    pub avg_total_time_ms: f64,
    /// Mean upstream processing time over records that carry it
    pub avg_processing_time_ms: f64,
    /// Mean network latency over records that carry it
    pub avg_network_latency_ms: f64,
    /// Median total time
    pub median_total_time_ms: f64,
    /// 95th percentile total time
    pub p95_total_time_ms: f64,
    /// 99th percentile total time
    pub p99_total_time_ms: f64,
    /// Fastest total time
    pub min_total_time_ms: f64,
    /// Slowest total time
    pub max_total_time_ms: f64,
    /// Number of successful records carrying a processing time
    pub processing_time_samples: usize,
    /// Prompt tokens over all successful records
    pub total_prompt_tokens: u64,
    /// Completion tokens over all successful records
    pub total_completion_tokens: u64,
    /// Total tokens over all successful records
    pub total_tokens: u64,
    /// Mean total tokens per successful record
    pub avg_tokens: f64,
}

impl AggregateStatistics {
    /// Reduce a provider's records
    pub fn from_records(records: &[RequestRecord]) -> Self {
        let count = records.len();
        let successes: Vec<&RequestRecord> = records.iter().filter(|r| r.success).collect();
        let success_count = successes.len();
        let failure_count = count - success_count;

        if success_count == 0 {
            return Self {
                count,
                failure_count,
                failure_rate: 100.0,
                ..Self::default()
            };
        }

        let success_rate = success_count as f64 / count as f64 * 100.0;

        let mut totals: Vec<f64> = successes.iter().map(|r| r.total_time_ms as f64).collect();
        totals.sort_by(f64::total_cmp);

        let processing: Vec<f64> = successes
            .iter()
            .filter_map(|r| r.processing_time_ms)
            .collect();
        let network: Vec<f64> = successes
            .iter()
            .filter_map(|r| r.network_latency_ms)
            .collect();

        let usage = successes
            .iter()
            .fold(TokenUsage::default(), |acc, r| acc + r.usage);

        Self {
            count,
            success_count,
            failure_count,
            success_rate,
            failure_rate: 100.0 - success_rate,
            avg_total_time_ms: mean(&totals),
            avg_processing_time_ms: mean(&processing),
            avg_network_latency_ms: mean(&network),
            median_total_time_ms: percentile(&totals, 50.0),
            p95_total_time_ms: percentile(&totals, 95.0),
            p99_total_time_ms: percentile(&totals, 99.0),
            min_total_time_ms: totals[0],
            max_total_time_ms: totals[totals.len() - 1],
            processing_time_samples: processing.len(),
            total_prompt_tokens: usage.prompt,
            total_completion_tokens: usage.completion,
            total_tokens: usage.total,
            avg_tokens: usage.total as f64 / success_count as f64,
        }
    }

    /// Whether any record carried an upstream processing time
    pub fn has_processing_time(&self) -> bool {
        self.processing_time_samples > 0
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Calculate percentile `p` (0 - 100) from sorted values using linear interpolation
///
/// Returns 0 for an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let idx = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = idx.floor() as usize;
    let upper = idx.ceil() as usize;
    let frac = idx - lower as f64;

    if upper >= sorted.len() {
        sorted[sorted.len() - 1]
    } else if lower == upper {
        sorted[lower]
    } else {
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

/// Proxy-versus-direct comparison
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    /// Proxy mean total time minus direct mean total time
    pub latency_overhead_ms: f64,
    /// Overhead relative to the direct mean; `None` when either mean is zero
    pub latency_overhead_percent: Option<f64>,
    /// Proxy P95 minus direct P95
    pub p95_overhead_ms: f64,
    /// Proxy mean network latency minus direct; `None` without processing samples on both sides
    pub network_latency_difference_ms: Option<f64>,
    /// Proxy success rate minus direct success rate (percentage points)
    pub success_rate_difference: f64,
}

impl ComparisonSummary {
    /// Compare proxy statistics against direct statistics
    pub fn compare(direct: &AggregateStatistics, proxy: &AggregateStatistics) -> Self {
        let latency_overhead_ms = proxy.avg_total_time_ms - direct.avg_total_time_ms;

        let latency_overhead_percent =
            if direct.avg_total_time_ms == 0.0 || proxy.avg_total_time_ms == 0.0 {
                None
            } else {
                Some(latency_overhead_ms / direct.avg_total_time_ms * 100.0)
            };

        let network_latency_difference_ms =
            if direct.has_processing_time() && proxy.has_processing_time() {
                Some(proxy.avg_network_latency_ms - direct.avg_network_latency_ms)
            } else {
                None
            };

        Self {
            latency_overhead_ms,
            latency_overhead_percent,
            p95_overhead_ms: proxy.p95_total_time_ms - direct.p95_total_time_ms,
            network_latency_difference_ms,
            success_rate_difference: proxy.success_rate - direct.success_rate,
        }
    }
}

/// Per-provider statistics plus the optional comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSummary {
    /// Run mode
    pub mode: Mode,
    /// Statistics per active provider
    pub statistics: ProviderMap<AggregateStatistics>,
    /// Present in comparison mode when both providers have statistics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonSummary>,
}

impl BenchmarkSummary {
    /// Summarize per-provider results
    pub fn from_results(mode: Mode, results: &ProviderMap<Vec<RequestRecord>>) -> Self {
        let statistics = results.map(|_, records| AggregateStatistics::from_records(records));

        let comparison = match (mode, &statistics.direct, &statistics.proxy) {
            (Mode::Comparison, Some(direct), Some(proxy)) => {
                Some(ComparisonSummary::compare(direct, proxy))
            }
            _ => None,
        };

        Self {
            mode,
            statistics,
            comparison,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(provider: Provider, total: u64, processing: Option<f64>) -> RequestRecord {
        RequestRecord::success(provider, 1, chrono::Utc::now(), total)
            .with_processing_time(processing)
            .with_status(Some(200))
    }

    fn failed(provider: Provider, total: u64) -> RequestRecord {
        RequestRecord::failure(provider, 1, chrono::Utc::now(), total, "HTTP 429: slow down")
            .with_status(Some(429))
    }

    // =========================================================================
    // Percentile tests
    // =========================================================================

    #[test]
    fn test_percentile_interpolation() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        assert!((percentile(&values, 50.0) - 5.5).abs() < 1e-9);
        assert!((percentile(&values, 95.0) - 9.55).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_integral_index() {
        let values = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        assert_eq!(percentile(&values, 50.0), 30.0);
        assert_eq!(percentile(&values, 25.0), 20.0);
    }

    #[test]
    fn test_percentile_single_value() {
        for p in [0.0, 1.0, 50.0, 95.0, 99.0, 100.0] {
            assert_eq!(percentile(&[42.0], p), 42.0);
        }
    }

    #[test]
    fn test_percentile_bounds() {
        let values = vec![3.0, 7.0, 11.0, 19.0];
        assert_eq!(percentile(&values, 0.0), 3.0);
        assert_eq!(percentile(&values, 100.0), 19.0);
    }

    #[test]
    fn test_percentile_empty() {
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    // =========================================================================
    // Aggregate statistics tests
    // =========================================================================

    #[test]
    fn test_network_latency_average() {
        let records = vec![
            ok(Provider::Direct, 1000, Some(800.0)),
            ok(Provider::Direct, 1206, Some(800.0)),
        ];
        assert_eq!(records[0].network_latency_ms, Some(200.0));
        assert_eq!(records[1].network_latency_ms, Some(406.0));

        let stats = AggregateStatistics::from_records(&records);
        assert_eq!(stats.avg_network_latency_ms, 303.0);
        assert_eq!(stats.avg_processing_time_ms, 800.0);
        assert_eq!(stats.avg_total_time_ms, 1103.0);
        assert_eq!(stats.processing_time_samples, 2);
    }

    #[test]
    fn test_zero_successes() {
        let records = vec![failed(Provider::Proxy, 120), failed(Provider::Proxy, 80)];
        let stats = AggregateStatistics::from_records(&records);

        assert_eq!(stats.count, 2);
        assert_eq!(stats.success_count, 0);
        assert_eq!(stats.failure_count, 2);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.failure_rate, 100.0);
        assert_eq!(stats.avg_total_time_ms, 0.0);
        assert_eq!(stats.median_total_time_ms, 0.0);
        assert_eq!(stats.max_total_time_ms, 0.0);
    }

    #[test]
    fn test_empty_collection() {
        let stats = AggregateStatistics::from_records(&[]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.failure_rate, 100.0);
        assert_eq!(stats.success_rate, 0.0);
    }

    #[test]
    fn test_mixed_outcomes() {
        let records = vec![
            ok(Provider::Direct, 100, None).with_usage(TokenUsage::new(10, 20)),
            ok(Provider::Direct, 300, Some(250.0)).with_usage(TokenUsage::new(10, 40)),
            failed(Provider::Direct, 5000),
            ok(Provider::Direct, 200, None).with_usage(TokenUsage::new(10, 30)),
        ];
        let stats = AggregateStatistics::from_records(&records);

        assert_eq!(stats.count, 4);
        assert_eq!(stats.success_count, 3);
        assert_eq!(stats.success_rate, 75.0);
        assert_eq!(stats.failure_rate, 25.0);
        assert_eq!(stats.min_total_time_ms, 100.0);
        assert_eq!(stats.max_total_time_ms, 300.0);
        assert_eq!(stats.median_total_time_ms, 200.0);
        assert_eq!(stats.avg_total_time_ms, 200.0);
        assert_eq!(stats.avg_processing_time_ms, 250.0);
        assert_eq!(stats.avg_network_latency_ms, 50.0);
        assert_eq!(stats.processing_time_samples, 1);
        assert_eq!(stats.total_tokens, 120);
        assert_eq!(stats.total_prompt_tokens, 30);
        assert_eq!(stats.avg_tokens, 40.0);
    }

    #[test]
    fn test_descending_totals_are_sorted() {
        let records: Vec<RequestRecord> = (1..=5)
            .rev()
            .map(|i| ok(Provider::Proxy, i * 100, None))
            .collect();
        let stats = AggregateStatistics::from_records(&records);

        assert_eq!(stats.min_total_time_ms, 100.0);
        assert_eq!(stats.max_total_time_ms, 500.0);
        assert_eq!(stats.median_total_time_ms, 300.0);
        assert!((stats.p95_total_time_ms - 480.0).abs() < 1e-9);
    }

    #[test]
    fn test_failure_record_is_classified() {
        let record = failed(Provider::Proxy, 10);
        assert!(!record.success);
        assert_eq!(record.error_kind, Some(ErrorKind::RateLimit));
        assert_eq!(record.usage, TokenUsage::default());
        assert_eq!(record.network_latency_ms, None);
    }

    #[test]
    fn test_statistics_serde_roundtrip() {
        let records = vec![
            ok(Provider::Proxy, 101, Some(33.3)),
            ok(Provider::Proxy, 257, Some(91.7)),
            ok(Provider::Proxy, 199, None),
            failed(Provider::Proxy, 13),
        ];
        let stats = AggregateStatistics::from_records(&records);
        let json = serde_json::to_string(&stats).unwrap();
        let back: AggregateStatistics = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stats);
    }

    // =========================================================================
    // Comparison tests
    // =========================================================================

    #[test]
    fn test_comparison_overhead() {
        let direct = AggregateStatistics::from_records(&[
            ok(Provider::Direct, 1000, Some(800.0)),
            ok(Provider::Direct, 1000, Some(800.0)),
        ]);
        let proxy = AggregateStatistics::from_records(&[
            ok(Provider::Proxy, 1200, Some(800.0)),
            ok(Provider::Proxy, 1300, Some(800.0)),
            failed(Provider::Proxy, 50),
            failed(Provider::Proxy, 50),
        ]);

        let cmp = ComparisonSummary::compare(&direct, &proxy);
        assert_eq!(cmp.latency_overhead_ms, 250.0);
        assert_eq!(cmp.latency_overhead_percent, Some(25.0));
        assert_eq!(cmp.network_latency_difference_ms, Some(250.0));
        assert_eq!(cmp.success_rate_difference, -50.0);
    }

    #[test]
    fn test_comparison_zero_average_sentinel() {
        let direct = AggregateStatistics::from_records(&[failed(Provider::Direct, 10)]);
        let proxy = AggregateStatistics::from_records(&[ok(Provider::Proxy, 300, None)]);

        let cmp = ComparisonSummary::compare(&direct, &proxy);
        assert_eq!(cmp.latency_overhead_percent, None);
        assert_eq!(cmp.network_latency_difference_ms, None);

        let json = serde_json::to_value(&cmp).unwrap();
        assert!(json["latency_overhead_percent"].is_null());
    }

    #[test]
    fn test_summary_comparison_only_in_comparison_mode() {
        let results = ProviderMap::new()
            .with(Provider::Direct, vec![ok(Provider::Direct, 100, None)])
            .with(Provider::Proxy, vec![ok(Provider::Proxy, 150, None)]);

        let summary = BenchmarkSummary::from_results(Mode::Comparison, &results);
        assert!(summary.comparison.is_some());

        let proxy_only = ProviderMap::new().with(Provider::Proxy, vec![ok(Provider::Proxy, 150, None)]);
        let summary = BenchmarkSummary::from_results(Mode::Loadtest, &proxy_only);
        assert!(summary.comparison.is_none());
        assert_eq!(summary.statistics.providers(), vec![Provider::Proxy]);
    }
}
