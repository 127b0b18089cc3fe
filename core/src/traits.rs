//! Core traits for completer clients
//!
//! The trait is defined in core so the dispatch engine never depends on a
//! transport library. Implementations live in the vendors crate; tests use
//! in-memory stubs.

use crate::provider::Provider;
use crate::request::CompletionRequest;
use crate::response::CompletionResponse;
use async_trait::async_trait;
use std::time::Duration;

/// Chat-completion capability
///
/// One call performs exactly one network request: no retries, no backoff.
#[async_trait]
pub trait Completer: Send + Sync {
    /// Provider this completer talks to
    fn provider(&self) -> Provider;

    /// Perform one chat-completion call
    async fn create(&self, request: &CompletionRequest)
        -> Result<CompletionResponse, CompleterError>;
}

/// Completer failures
///
/// The display text is what gets classified into an
/// [`ErrorKind`](crate::ErrorKind), so variants keep the wording transports
/// commonly use ("timed out", "connection refused", the HTTP status code).
#[derive(Debug, thiserror::Error)]
pub enum CompleterError {
    /// Upstream answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Body snippet or reason phrase
        message: String,
    },

    /// Request timed out
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The endpoint actively refused the TCP connection
    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    /// Could not connect for another reason (DNS, TLS, unreachable host)
    #[error("connect error: {0}")]
    Connect(String),

    /// Other transport failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Response body could not be decoded
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl CompleterError {
    /// HTTP status, when the upstream answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            CompleterError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
