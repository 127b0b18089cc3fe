//! Request executor: one timed completer call into one request record

use std::sync::Arc;
use std::time::Instant;

use crate::config::ConfigError;
use crate::metrics::RequestRecord;
use crate::provider::Provider;
use crate::request::{CompletionRequest, GenerationParams, Prompt, PROBE_PROMPT_CHARS};
use crate::traits::Completer;

/// Wraps a [`Completer`] with timing, header extraction and outcome
/// classification
///
/// The request is normalized once at construction, so an unusable prompt is
/// rejected before any network activity. Cloning is cheap.
#[derive(Clone)]
pub struct RequestExecutor {
    provider: Provider,
    completer: Arc<dyn Completer>,
    request: Arc<CompletionRequest>,
}

impl RequestExecutor {
    /// Create an executor for the completer's provider
    pub fn new(
        completer: Arc<dyn Completer>,
        model: &str,
        prompt: &Prompt,
        params: GenerationParams,
    ) -> Result<Self, ConfigError> {
        let request = CompletionRequest::new(model, prompt, params)?;
        Ok(Self {
            provider: completer.provider(),
            completer,
            request: Arc::new(request),
        })
    }

    /// Create an executor for preflight probes
    ///
    /// Text prompts are shortened to [`PROBE_PROMPT_CHARS`] characters.
    pub fn probe(
        completer: Arc<dyn Completer>,
        model: &str,
        prompt: &Prompt,
        params: GenerationParams,
    ) -> Result<Self, ConfigError> {
        Self::new(
            completer,
            model,
            &prompt.truncated(PROBE_PROMPT_CHARS),
            params,
        )
    }

    /// Provider this executor targets
    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// The normalized request sent on every call
    pub fn request(&self) -> &CompletionRequest {
        &self.request
    }

    /// Perform one call and record its outcome
    ///
    /// Never fails: transport and application errors are captured in the
    /// returned record.
    pub async fn execute(
        &self,
        sequence: u64,
        round_started_at: chrono::DateTime<chrono::Utc>,
    ) -> RequestRecord {
        let start = Instant::now();
        let result = self.completer.create(&self.request).await;
        let total_time_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(response) => {
                tracing::trace!(
                    provider = %self.provider,
                    sequence,
                    status = response.status,
                    headers = ?response.headers,
                    "Response headers"
                );

                let processing_time_ms = response.processing_time_ms();
                if processing_time_ms.is_none() {
                    tracing::trace!(
                        provider = %self.provider,
                        sequence,
                        "No processing time header found"
                    );
                }

                RequestRecord::success(self.provider, sequence, round_started_at, total_time_ms)
                    .with_processing_time(processing_time_ms)
                    .with_usage(response.usage())
                    .with_status(Some(response.status))
            }
            Err(e) => {
                tracing::warn!(
                    provider = %self.provider,
                    sequence,
                    total_time_ms,
                    error = %e,
                    "Request failed"
                );

                RequestRecord::failure(
                    self.provider,
                    sequence,
                    round_started_at,
                    total_time_ms,
                    e.to_string(),
                )
                .with_status(e.status())
            }
        }
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("provider", &self.provider)
            .field("model", &self.request.model)
            .field("messages", &self.request.messages.len())
            .finish()
    }
}
