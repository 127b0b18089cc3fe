//! proxy-bench-vendors: HTTP chat-completion clients
//!
//! Implements the core [`Completer`] trait over reqwest for the
//! OpenAI-compatible wire format spoken by both the direct API and the proxy.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod http;
pub mod openai;

use std::sync::Arc;

use proxy_bench_core::{Completer, ProviderMap, RunConfig};

pub use config::{chat_completions_url, validate_endpoint, ConfigValidationError};
pub use error::VendorError;
pub use http::{HttpClientPool, HttpConfig};
pub use openai::HttpCompleter;

/// Build one completer per provider active in `config.mode`.
///
/// Providers outside the mode get no completer, so an unused endpoint
/// never needs credentials.
///
/// # Errors
///
/// Fails on the first active provider whose endpoint is missing or invalid.
pub fn build_completers(config: &RunConfig) -> Result<ProviderMap<Arc<dyn Completer>>, VendorError> {
    let mut completers = ProviderMap::new();

    for &provider in config.mode.active_providers() {
        let endpoint = config
            .endpoint(provider)
            .ok_or(VendorError::MissingEndpoint(provider))?;
        let completer = HttpCompleter::new(provider, endpoint, config.concurrency)?;

        tracing::debug!(
            provider = %provider,
            url = %completer.url(),
            "Built completer"
        );
        completers.insert(provider, Arc::new(completer) as Arc<dyn Completer>);
    }

    Ok(completers)
}
