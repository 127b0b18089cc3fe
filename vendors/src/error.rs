//! Error types for proxy-bench-vendors

use proxy_bench_core::Provider;
use thiserror::Error;

use crate::config::ConfigValidationError;

/// Failures building completers
#[derive(Debug, Error)]
pub enum VendorError {
    /// The configuration has no endpoint for an active provider.
    #[error("no endpoint configured for {0}")]
    MissingEndpoint(Provider),

    /// The endpoint failed validation.
    #[error("invalid endpoint for {provider}: {source}")]
    InvalidEndpoint {
        /// Provider whose endpoint is invalid
        provider: Provider,
        /// What was wrong
        #[source]
        source: ConfigValidationError,
    },

    /// A configured header cannot be sent.
    #[error("invalid header {name:?}: {message}")]
    InvalidHeader {
        /// Header name as configured
        name: String,
        /// Why it was rejected
        message: String,
    },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
