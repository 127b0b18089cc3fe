//! Error types for proxy-bench-core

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::provider::Provider;

/// Category of a failed request
///
/// Assigned by substring matching on the error message. This is a best-effort
/// heuristic kept as supplementary metadata on the request record; it is not
/// authoritative and may misclassify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Upstream rejected the request with a rate limit (HTTP 429 and friends)
    RateLimit,
    /// The request or connection timed out
    Timeout,
    /// The endpoint refused the TCP connection
    ConnectionRefused,
    /// Anything else
    Unknown,
}

impl ErrorKind {
    /// Classify an error message
    pub fn classify(message: &str) -> Self {
        let message = message.to_lowercase();

        if has_status_token(&message, "429")
            || message.contains("rate limit")
            || message.contains("rate_limit")
            || message.contains("too many requests")
        {
            ErrorKind::RateLimit
        } else if message.contains("timeout")
            || message.contains("timed out")
            || message.contains("etimedout")
        {
            ErrorKind::Timeout
        } else if message.contains("econnrefused") || message.contains("connection refused") {
            ErrorKind::ConnectionRefused
        } else {
            ErrorKind::Unknown
        }
    }
}

/// Whether `code` appears as a standalone token, not inside an id or number
fn has_status_token(message: &str, code: &str) -> bool {
    message
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| token == code)
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::RateLimit => write!(f, "rate_limit"),
            ErrorKind::Timeout => write!(f, "timeout"),
            ErrorKind::ConnectionRefused => write!(f, "connection_refused"),
            ErrorKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// A provider whose preflight probe failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeFailure {
    /// Provider that failed
    pub provider: Provider,
    /// Error message reported by the completer
    pub message: String,
}

impl std::fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.provider, self.message)
    }
}

fn join_failures(failures: &[ProbeFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn join_providers(providers: &[Provider]) -> String {
    providers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Core error type
#[derive(Error, Debug)]
pub enum BenchError {
    /// Invalid run configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A required collaborator was not supplied
    #[error("missing required configuration: {0}")]
    MissingConfig(&'static str),

    /// No completer was supplied for an active provider
    #[error("no completer configured for active provider {0}")]
    MissingCompleter(Provider),

    /// Every active provider failed its preflight probe
    #[error("all providers unreachable: {}", join_failures(.failures))]
    AllProvidersUnreachable {
        /// One entry per failed provider
        failures: Vec<ProbeFailure>,
    },

    /// Some, but not all, active providers failed their preflight probe
    #[error(
        "preflight failed for {} (passed: {})",
        join_failures(.failures),
        join_providers(.passed)
    )]
    PartialProviderFailure {
        /// Providers whose probe failed
        failures: Vec<ProbeFailure>,
        /// Providers whose probe succeeded
        passed: Vec<Provider>,
    },

    /// Worker pool coordination failed
    #[error("orchestration error: {0}")]
    Orchestration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BenchError {
    /// Build an orchestration error
    pub fn orchestration(message: impl Into<String>) -> Self {
        BenchError::Orchestration(message.into())
    }

    /// Whether this error was raised by preflight validation
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            BenchError::AllProvidersUnreachable { .. } | BenchError::PartialProviderFailure { .. }
        )
    }
}

/// Result type alias
pub type BenchResult<T> = std::result::Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_rate_limit() {
        assert_eq!(
            ErrorKind::classify("HTTP 429 Too Many Requests"),
            ErrorKind::RateLimit
        );
        assert_eq!(
            ErrorKind::classify("Rate limit reached for requests"),
            ErrorKind::RateLimit
        );
    }

    #[test]
    fn test_classify_ignores_429_inside_ids() {
        assert_eq!(
            ErrorKind::classify("HTTP 500: upstream failed (request id req_84291a)"),
            ErrorKind::Unknown
        );
        assert_eq!(
            ErrorKind::classify("invalid response body: trace 14290"),
            ErrorKind::Unknown
        );
        assert_eq!(
            ErrorKind::classify("upstream returned status=429"),
            ErrorKind::RateLimit
        );
    }

    #[test]
    fn test_classify_timeout() {
        assert_eq!(
            ErrorKind::classify("request timed out after 60s"),
            ErrorKind::Timeout
        );
        assert_eq!(ErrorKind::classify("ETIMEDOUT"), ErrorKind::Timeout);
    }

    #[test]
    fn test_classify_connection_refused() {
        assert_eq!(
            ErrorKind::classify("connect ECONNREFUSED 127.0.0.1:8080"),
            ErrorKind::ConnectionRefused
        );
        assert_eq!(
            ErrorKind::classify("error trying to connect: Connection refused (os error 111)"),
            ErrorKind::ConnectionRefused
        );
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(
            ErrorKind::classify("HTTP 500 internal server error"),
            ErrorKind::Unknown
        );
        assert_eq!(ErrorKind::classify(""), ErrorKind::Unknown);
    }

    #[test]
    fn test_error_kind_serialization() {
        let json = serde_json::to_string(&ErrorKind::ConnectionRefused).unwrap();
        assert_eq!(json, "\"connection_refused\"");
        assert_eq!(ErrorKind::RateLimit.to_string(), "rate_limit");
    }

    #[test]
    fn test_partial_failure_message_names_providers() {
        let err = BenchError::PartialProviderFailure {
            failures: vec![ProbeFailure {
                provider: Provider::Proxy,
                message: "HTTP 502".into(),
            }],
            passed: vec![Provider::Direct],
        };
        let msg = err.to_string();
        assert!(msg.contains("proxy"));
        assert!(msg.contains("HTTP 502"));
        assert!(msg.contains("direct"));
        assert!(err.is_preflight());
    }
}
