//! OpenAI-compatible chat-completions client
//!
//! Both the direct API and the proxy speak the same wire format, so one
//! client type serves either provider; only the endpoint differs.

use std::time::Duration;

use async_trait::async_trait;
use proxy_bench_core::{
    CompleterError, Completer, CompletionRequest, CompletionResponse, Provider, ProviderEndpoint,
    ResponseHeaders,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;

use crate::config::{chat_completions_url, validate_endpoint};
use crate::error::VendorError;
use crate::http::{HttpClientPool, HttpConfig};

/// Maximum characters of an error body carried into a record
const ERROR_SNIPPET_CHARS: usize = 200;

/// Chat-completions client for one provider
#[derive(Clone)]
pub struct HttpCompleter {
    provider: Provider,
    url: String,
    headers: HeaderMap,
    request_timeout: Duration,
    pool: HttpClientPool,
}

impl std::fmt::Debug for HttpCompleter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // headers carry the bearer token
        f.debug_struct("HttpCompleter")
            .field("provider", &self.provider)
            .field("url", &self.url)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl HttpCompleter {
    /// Build a client for `provider` from its endpoint.
    ///
    /// `pool_size` should match the worker count.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is invalid, a header cannot be
    /// encoded, or the HTTP client cannot be built.
    pub fn new(
        provider: Provider,
        endpoint: &ProviderEndpoint,
        pool_size: usize,
    ) -> Result<Self, VendorError> {
        validate_endpoint(endpoint).map_err(|source| VendorError::InvalidEndpoint {
            provider,
            source,
        })?;

        let headers = build_headers(endpoint)?;
        let http_config = HttpConfig::default()
            .with_request_timeout(endpoint.request_timeout)
            .with_pool_max_idle(pool_size.max(1));
        let pool = HttpClientPool::new(&http_config)?;

        Ok(Self {
            provider,
            url: chat_completions_url(&endpoint.base_url),
            headers,
            request_timeout: endpoint.request_timeout,
            pool,
        })
    }

    /// Full chat-completions URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Completer for HttpCompleter {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn create(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompleterError> {
        let response = self
            .pool
            .client()
            .post(&self.url)
            .headers(self.headers.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| map_transport_error(e, self.request_timeout))?;

        let status = response.status();
        let headers = convert_headers(response.headers());

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CompleterError::Status {
                status: status.as_u16(),
                message: error_message(&text, status.canonical_reason()),
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| map_transport_error(e, self.request_timeout))?;

        Ok(CompletionResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

/// Authorization, content type and any configured extra headers
fn build_headers(endpoint: &ProviderEndpoint) -> Result<HeaderMap, VendorError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if let Some(key) = endpoint.api_key.as_deref() {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", key.trim())).map_err(|e| {
            VendorError::InvalidHeader {
                name: AUTHORIZATION.to_string(),
                message: e.to_string(),
            }
        })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    for (name, value) in &endpoint.headers {
        let invalid = |message: String| VendorError::InvalidHeader {
            name: name.clone(),
            message,
        };
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}

/// Copy response headers into the transport-neutral map
///
/// Values that are not valid visible ASCII are skipped.
pub fn convert_headers(headers: &HeaderMap) -> ResponseHeaders {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

/// Map a reqwest failure onto the completer error taxonomy
pub fn map_transport_error(err: reqwest::Error, timeout: Duration) -> CompleterError {
    if err.is_timeout() {
        CompleterError::Timeout(timeout)
    } else if err.is_connect() {
        if is_connection_refused(&err) {
            CompleterError::ConnectionRefused(err.to_string())
        } else {
            CompleterError::Connect(err.to_string())
        }
    } else if err.is_decode() || err.is_body() {
        CompleterError::Decode(err.to_string())
    } else {
        CompleterError::Transport(err.to_string())
    }
}

/// Whether an `io::Error` of kind `ConnectionRefused` sits in the source chain
fn is_connection_refused(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        current = e.source();
    }
    false
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Human-readable message for a non-success response
///
/// Prefers the `error.message` field of an OpenAI-style error body, then a
/// snippet of the raw body, then the reason phrase.
fn error_message(body: &str, reason: Option<&str>) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        return snippet(&parsed.error.message);
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        reason.unwrap_or("unknown error").to_string()
    } else {
        snippet(trimmed)
    }
}

fn snippet(text: &str) -> String {
    if text.chars().count() <= ERROR_SNIPPET_CHARS {
        text.to_string()
    } else {
        let cut: String = text.chars().take(ERROR_SNIPPET_CHARS).collect();
        format!("{cut}...")
    }
}
