//! Endpoint validation and URL construction

use std::time::Duration;

use proxy_bench_core::ProviderEndpoint;
use thiserror::Error;

/// Path appended to the base URL for chat completions
pub const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Endpoint validation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// A required configuration field is missing.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A timeout value is out of acceptable range.
    #[error("invalid timeout: {0:?} (expected between 1s and 1h)")]
    InvalidTimeout(Duration),

    /// The base URL is not an absolute http(s) URL.
    #[error("invalid base URL {0:?}: must start with http:// or https://")]
    InvalidBaseUrl(String),
}

/// Check an endpoint before building a client for it.
pub fn validate_endpoint(endpoint: &ProviderEndpoint) -> Result<(), ConfigValidationError> {
    let base_url = endpoint.base_url.trim();
    if base_url.is_empty() {
        return Err(ConfigValidationError::MissingField("baseUrl"));
    }
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigValidationError::InvalidBaseUrl(base_url.to_string()));
    }

    if endpoint
        .api_key
        .as_deref()
        .map_or(true, |key| key.trim().is_empty())
    {
        return Err(ConfigValidationError::MissingField("apiKey"));
    }

    if endpoint.request_timeout < Duration::from_secs(1)
        || endpoint.request_timeout > Duration::from_secs(3600)
    {
        return Err(ConfigValidationError::InvalidTimeout(
            endpoint.request_timeout,
        ));
    }

    Ok(())
}

/// Build the chat-completions URL for a base URL.
///
/// Trailing slashes are ignored and a base URL that already names the
/// endpoint is used as-is.
pub fn chat_completions_url(base_url: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    if base.ends_with(CHAT_COMPLETIONS_PATH) {
        base.to_string()
    } else {
        format!("{base}{CHAT_COMPLETIONS_PATH}")
    }
}
