//! Preflight validation: one probe per active provider before the load phase

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, BenchResult, ProbeFailure};
use crate::executor::RequestExecutor;
use crate::metrics::RequestRecord;
use crate::provider::{Provider, ProviderMap};

/// Overall preflight verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreflightStatus {
    /// Every active provider answered
    Pass,
    /// Some, but not all, providers failed
    PartialFail,
    /// Every active provider failed
    AllFail,
}

impl std::fmt::Display for PreflightStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreflightStatus::Pass => write!(f, "PASS"),
            PreflightStatus::PartialFail => write!(f, "PARTIAL_FAIL"),
            PreflightStatus::AllFail => write!(f, "ALL_FAIL"),
        }
    }
}

/// Probe result for one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// Whether the probe succeeded
    pub passed: bool,
    /// Whether the probe response carried a processing-time header
    pub processing_time_available: bool,
    /// The probe's request record
    pub record: RequestRecord,
}

impl From<RequestRecord> for ProbeOutcome {
    fn from(record: RequestRecord) -> Self {
        Self {
            passed: record.success,
            processing_time_available: record.processing_time_ms.is_some(),
            record,
        }
    }
}

/// Result of probing every active provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreflightReport {
    /// Overall verdict
    pub status: PreflightStatus,
    /// One outcome per active provider
    pub outcomes: ProviderMap<ProbeOutcome>,
    /// Non-fatal findings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl PreflightReport {
    /// Whether `provider` is active and passed its probe
    pub fn is_enabled(&self, provider: Provider) -> bool {
        self.outcomes.get(provider).is_some_and(|o| o.passed)
    }

    /// Providers that are active and passed, in report order
    pub fn enabled_providers(&self) -> Vec<Provider> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.passed)
            .map(|(provider, _)| provider)
            .collect()
    }

    /// Probe failures, in report order
    pub fn failures(&self) -> Vec<ProbeFailure> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| !outcome.passed)
            .map(|(provider, outcome)| ProbeFailure {
                provider,
                message: outcome
                    .record
                    .error
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string()),
            })
            .collect()
    }

    /// Turn a failing verdict into the matching fatal error
    pub fn into_result(self) -> BenchResult<Self> {
        match self.status {
            PreflightStatus::Pass => Ok(self),
            PreflightStatus::AllFail => Err(BenchError::AllProvidersUnreachable {
                failures: self.failures(),
            }),
            PreflightStatus::PartialFail => Err(BenchError::PartialProviderFailure {
                failures: self.failures(),
                passed: self.enabled_providers(),
            }),
        }
    }
}

/// Probes every active provider once, concurrently
#[derive(Debug)]
pub struct PreflightValidator {
    executors: Vec<RequestExecutor>,
}

impl PreflightValidator {
    /// Create a validator over one probe executor per active provider
    ///
    /// Build the executors with [`RequestExecutor::probe`] so text prompts
    /// are shortened.
    pub fn new(executors: Vec<RequestExecutor>) -> Self {
        Self { executors }
    }

    /// Run every probe and classify the outcome without failing
    pub async fn probe(&self) -> PreflightReport {
        let started_at = chrono::Utc::now();
        let records = futures::future::join_all(
            self.executors
                .iter()
                .map(|executor| executor.execute(0, started_at)),
        )
        .await;

        let mut outcomes = ProviderMap::new();
        let mut warnings = Vec::new();
        for record in records {
            let provider = record.provider;
            let outcome = ProbeOutcome::from(record);

            if outcome.passed {
                tracing::info!(
                    provider = %provider,
                    total_time_ms = outcome.record.total_time_ms,
                    processing_time_ms = ?outcome.record.processing_time_ms,
                    "Preflight probe passed"
                );
                if !outcome.processing_time_available {
                    let warning = format!(
                        "{} returned no processing-time header; network latency cannot be derived",
                        provider.display_name()
                    );
                    tracing::warn!(provider = %provider, "{warning}");
                    warnings.push(warning);
                }
            } else {
                tracing::error!(
                    provider = %provider,
                    error = ?outcome.record.error,
                    "Preflight probe failed"
                );
            }

            outcomes.insert(provider, outcome);
        }

        let total = outcomes.len();
        let failed = outcomes.iter().filter(|(_, o)| !o.passed).count();
        let status = if failed == 0 {
            PreflightStatus::Pass
        } else if failed == total {
            PreflightStatus::AllFail
        } else {
            PreflightStatus::PartialFail
        };

        PreflightReport {
            status,
            outcomes,
            warnings,
        }
    }

    /// Run every probe, failing unless all of them passed
    ///
    /// # Errors
    ///
    /// [`BenchError::AllProvidersUnreachable`] when every probe failed,
    /// [`BenchError::PartialProviderFailure`] when only some did.
    pub async fn validate(&self) -> BenchResult<PreflightReport> {
        if self.executors.is_empty() {
            return Err(BenchError::MissingConfig("preflight executors"));
        }

        let report = self.probe().await;
        tracing::info!(status = %report.status, "Preflight finished");
        report.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{CompletionRequest, GenerationParams, Prompt};
    use crate::response::{CompletionResponse, ResponseHeaders};
    use crate::traits::{Completer, CompleterError};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct ProbeStub {
        provider: Provider,
        fail: bool,
        processing_header: bool,
    }

    #[async_trait]
    impl Completer for ProbeStub {
        fn provider(&self) -> Provider {
            self.provider
        }

        async fn create(
            &self,
            _request: &CompletionRequest,
        ) -> Result<CompletionResponse, CompleterError> {
            if self.fail {
                return Err(CompleterError::Status {
                    status: 401,
                    message: "invalid api key".into(),
                });
            }
            let mut headers = ResponseHeaders::new();
            if self.processing_header {
                headers.insert("openai-processing-ms", "120");
            }
            Ok(CompletionResponse {
                status: 200,
                headers,
                body: serde_json::json!({}),
            })
        }
    }

    fn probe(provider: Provider, fail: bool, processing_header: bool) -> RequestExecutor {
        RequestExecutor::probe(
            Arc::new(ProbeStub {
                provider,
                fail,
                processing_header,
            }),
            "m",
            &Prompt::from("hello"),
            GenerationParams::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_all_pass() {
        let validator = PreflightValidator::new(vec![
            probe(Provider::Direct, false, true),
            probe(Provider::Proxy, false, true),
        ]);
        let report = validator.validate().await.unwrap();

        assert_eq!(report.status, PreflightStatus::Pass);
        assert_eq!(
            report.enabled_providers(),
            vec![Provider::Direct, Provider::Proxy]
        );
        assert!(report.warnings.is_empty());
        assert_eq!(report.outcomes.direct.unwrap().record.sequence, 0);
    }

    #[tokio::test]
    async fn test_partial_failure() {
        let validator = PreflightValidator::new(vec![
            probe(Provider::Direct, false, true),
            probe(Provider::Proxy, true, false),
        ]);
        let err = validator.validate().await.unwrap_err();

        match err {
            BenchError::PartialProviderFailure { failures, passed } => {
                assert_eq!(passed, vec![Provider::Direct]);
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].provider, Provider::Proxy);
                assert!(failures[0].message.contains("401"));
            }
            other => panic!("Expected PartialProviderFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_all_fail() {
        let validator = PreflightValidator::new(vec![
            probe(Provider::Direct, true, false),
            probe(Provider::Proxy, true, false),
        ]);
        let err = validator.validate().await.unwrap_err();
        assert!(matches!(
            err,
            BenchError::AllProvidersUnreachable { ref failures } if failures.len() == 2
        ));
    }

    #[tokio::test]
    async fn test_single_provider_failure_is_all_fail() {
        let validator = PreflightValidator::new(vec![probe(Provider::Proxy, true, false)]);
        let report = validator.probe().await;
        assert_eq!(report.status, PreflightStatus::AllFail);
        assert!(!report.is_enabled(Provider::Proxy));
    }

    #[tokio::test]
    async fn test_missing_processing_time_warns() {
        let validator = PreflightValidator::new(vec![probe(Provider::Proxy, false, false)]);
        let report = validator.validate().await.unwrap();

        assert_eq!(report.status, PreflightStatus::Pass);
        assert!(report.is_enabled(Provider::Proxy));
        assert!(!report.is_enabled(Provider::Direct));
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("Proxy API"));
        assert!(!report.outcomes.proxy.unwrap().processing_time_available);
    }

    #[tokio::test]
    async fn test_no_executors() {
        let err = PreflightValidator::new(vec![]).validate().await.unwrap_err();
        assert!(matches!(err, BenchError::MissingConfig(_)));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(PreflightStatus::PartialFail.to_string(), "PARTIAL_FAIL");
    }
}
