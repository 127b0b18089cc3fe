//! Run configuration types

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::BenchResult;
use crate::provider::{Mode, Provider};
use crate::request::{GenerationParams, Prompt};

/// Default direct endpoint
pub const DEFAULT_DIRECT_BASE_URL: &str = "https://api.openai.com/v1";

fn default_direct_base_url() -> String {
    DEFAULT_DIRECT_BASE_URL.to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_max_tokens() -> u32 {
    GenerationParams::default().max_tokens
}

fn default_temperature() -> f32 {
    GenerationParams::default().temperature
}

fn default_concurrency() -> usize {
    1
}

/// Endpoint and credential material for one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderEndpoint {
    /// Base URL, e.g. `https://api.openai.com/v1`
    pub base_url: String,

    /// API key; falls back to the provider's environment variable
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Extra headers sent with every request (proxy auth, routing keys)
    #[serde(default, skip_serializing)]
    pub headers: BTreeMap<String, String>,

    /// Per-request timeout enforced by the completer
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl ProviderEndpoint {
    /// Create an endpoint with default timeout and no credentials
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            headers: BTreeMap::new(),
            request_timeout: default_request_timeout(),
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Add an extra header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.trim().is_empty())
    }
}

impl Default for ProviderEndpoint {
    fn default() -> Self {
        Self::new(default_direct_base_url())
    }
}

/// Run configuration
///
/// Created once at startup and read-only for the rest of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfig {
    /// Which providers take part
    pub mode: Mode,

    /// Model identifier sent to both providers
    pub model: String,

    /// Prompt sent on every request
    #[serde(default)]
    pub prompt: Option<Prompt>,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Number of concurrent workers
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Stop after this many rounds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_requests: Option<u64>,

    /// Stop after this many seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_duration: Option<u64>,

    /// Override for the delay between a worker's rounds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_delay_ms: Option<u64>,

    /// Direct API endpoint
    #[serde(default = "ProviderEndpoint::default")]
    pub direct: ProviderEndpoint,

    /// Proxy endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProviderEndpoint>,
}

impl RunConfig {
    /// Create a config with defaults for everything but mode, model and prompt
    pub fn new(mode: Mode, model: impl Into<String>, prompt: impl Into<Prompt>) -> Self {
        Self {
            mode,
            model: model.into(),
            prompt: Some(prompt.into()),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            concurrency: default_concurrency(),
            max_requests: None,
            test_duration: None,
            round_delay_ms: None,
            direct: ProviderEndpoint::default(),
            proxy: None,
        }
    }

    /// Parse, resolve credentials from the environment, and validate
    pub fn from_json_str(json: &str) -> BenchResult<Self> {
        let mut config: RunConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.resolve_env_credentials();
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> BenchResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&json)
    }

    /// Set the concurrency level
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the request-count bound
    pub fn with_max_requests(mut self, max: u64) -> Self {
        self.max_requests = Some(max);
        self
    }

    /// Set the duration bound in seconds
    pub fn with_test_duration(mut self, secs: u64) -> Self {
        self.test_duration = Some(secs);
        self
    }

    /// Set the inter-round delay
    pub fn with_round_delay_ms(mut self, ms: u64) -> Self {
        self.round_delay_ms = Some(ms);
        self
    }

    /// Set the direct endpoint
    pub fn with_direct(mut self, endpoint: ProviderEndpoint) -> Self {
        self.direct = endpoint;
        self
    }

    /// Set the proxy endpoint
    pub fn with_proxy(mut self, endpoint: ProviderEndpoint) -> Self {
        self.proxy = Some(endpoint);
        self
    }

    /// Generation parameters
    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    /// Duration bound, if configured
    pub fn max_duration(&self) -> Option<Duration> {
        self.test_duration.map(Duration::from_secs)
    }

    /// Endpoint for a provider
    pub fn endpoint(&self, provider: Provider) -> Option<&ProviderEndpoint> {
        match provider {
            Provider::Direct => Some(&self.direct),
            Provider::Proxy => self.proxy.as_ref(),
        }
    }

    /// Whether neither stopping bound is set
    pub fn is_unbounded(&self) -> bool {
        self.max_requests.is_none() && self.test_duration.is_none()
    }

    /// Fill missing API keys from `DIRECT_API_KEY` / `PROXY_API_KEY`
    pub fn resolve_env_credentials(&mut self) {
        if !self.direct.has_api_key() {
            if let Ok(key) = std::env::var(Provider::Direct.api_key_env()) {
                self.direct.api_key = Some(key);
            }
        }
        if let Some(proxy) = self.proxy.as_mut() {
            if !proxy.has_api_key() {
                if let Ok(key) = std::env::var(Provider::Proxy.api_key_env()) {
                    proxy.api_key = Some(key);
                }
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let prompt = self.prompt.as_ref().ok_or(ConfigError::MissingPrompt)?;
        prompt.to_messages()?;

        if self.model.trim().is_empty() {
            return Err(ConfigError::MissingField("model"));
        }

        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(
                "concurrency must be at least 1".into(),
            ));
        }

        if self.max_requests == Some(0) {
            return Err(ConfigError::InvalidStopCondition(
                "maxRequests must be at least 1".into(),
            ));
        }

        if self.test_duration == Some(0) {
            return Err(ConfigError::InvalidStopCondition(
                "testDuration must be at least 1 second".into(),
            ));
        }

        for &provider in self.mode.active_providers() {
            let endpoint = self
                .endpoint(provider)
                .ok_or(ConfigError::MissingEndpoint(provider))?;
            if endpoint.base_url.trim().is_empty() {
                return Err(ConfigError::MissingEndpoint(provider));
            }
            if !endpoint.has_api_key() {
                return Err(ConfigError::MissingCredential(provider));
            }
        }

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("cannot read {path}: {message}")]
    Read {
        /// File path
        path: String,
        /// Underlying error
        message: String,
    },

    /// The config file is not valid JSON for this schema
    #[error("invalid config: {0}")]
    Parse(String),

    /// No prompt configured
    #[error("prompt is required")]
    MissingPrompt,

    /// Prompt message list is empty
    #[error("prompt message list must not be empty")]
    EmptyMessages,

    /// A required scalar field is empty
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Active provider has no endpoint
    #[error("missing endpoint for {0} provider")]
    MissingEndpoint(Provider),

    /// Active provider has no API key
    #[error(
        "missing API key for {0} provider (set it in the config or via {env})",
        env = .0.api_key_env()
    )]
    MissingCredential(Provider),

    /// Invalid concurrency value
    #[error("invalid concurrency: {0}")]
    InvalidConcurrency(String),

    /// Invalid stop condition
    #[error("invalid stop condition: {0}")]
    InvalidStopCondition(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchError;

    fn comparison_config() -> RunConfig {
        RunConfig::new(Mode::Comparison, "gpt-4o-mini", "Hello")
            .with_direct(ProviderEndpoint::default().with_api_key("sk-direct"))
            .with_proxy(ProviderEndpoint::new("https://proxy.local/v1").with_api_key("pk-proxy"))
            .with_max_requests(10)
    }

    #[test]
    fn test_valid_comparison_config() {
        assert!(comparison_config().validate().is_ok());
    }

    #[test]
    fn test_missing_prompt() {
        let mut config = comparison_config();
        config.prompt = None;
        assert_eq!(config.validate(), Err(ConfigError::MissingPrompt));
    }

    #[test]
    fn test_empty_message_prompt() {
        let mut config = comparison_config();
        config.prompt = Some(Prompt::Messages(vec![]));
        assert_eq!(config.validate(), Err(ConfigError::EmptyMessages));
    }

    #[test]
    fn test_zero_concurrency() {
        let config = comparison_config().with_concurrency(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConcurrency(_))
        ));
    }

    #[test]
    fn test_zero_bounds_rejected() {
        let config = comparison_config().with_max_requests(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidStopCondition(_))
        ));

        let config = comparison_config().with_test_duration(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidStopCondition(_))
        ));
    }

    #[test]
    fn test_comparison_requires_direct_credential() {
        let config = comparison_config().with_direct(ProviderEndpoint::default());
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingCredential(Provider::Direct))
        );
    }

    #[test]
    fn test_missing_credential_names_env_var() {
        let message = ConfigError::MissingCredential(Provider::Proxy).to_string();
        assert_eq!(
            message,
            "missing API key for proxy provider (set it in the config or via PROXY_API_KEY)"
        );
    }

    #[test]
    fn test_comparison_requires_proxy_endpoint() {
        let mut config = comparison_config();
        config.proxy = None;
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingEndpoint(Provider::Proxy))
        );
    }

    #[test]
    fn test_loadtest_ignores_direct_credential() {
        let config = RunConfig::new(Mode::Loadtest, "gpt-4o-mini", "Hello")
            .with_proxy(ProviderEndpoint::new("https://proxy.local/v1").with_api_key("pk"))
            .with_test_duration(30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unbounded_config_is_allowed() {
        let mut config = comparison_config();
        config.max_requests = None;
        assert!(config.is_unbounded());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_json_config() {
        let json = r#"{
            "mode": "comparison",
            "model": "gpt-4o-mini",
            "prompt": [{"role": "user", "content": "Ping"}],
            "maxTokens": 50,
            "temperature": 0.2,
            "concurrency": 4,
            "maxRequests": 100,
            "testDuration": 60,
            "direct": {"baseUrl": "https://api.openai.com/v1", "apiKey": "sk-1"},
            "proxy": {
                "baseUrl": "https://proxy.local/v1",
                "apiKey": "pk-1",
                "headers": {"x-proxy-route": "eu"},
                "requestTimeout": "30s"
            }
        }"#;
        let config = RunConfig::from_json_str(json).unwrap();
        assert_eq!(config.mode, Mode::Comparison);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.max_requests, Some(100));
        assert_eq!(config.max_duration(), Some(Duration::from_secs(60)));
        assert_eq!(config.generation_params().max_tokens, 50);
        let proxy = config.proxy.as_ref().unwrap();
        assert_eq!(proxy.request_timeout, Duration::from_secs(30));
        assert_eq!(proxy.headers.get("x-proxy-route").map(String::as_str), Some("eu"));
        assert_eq!(config.direct.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_unknown_mode_fails_fast() {
        let json = r#"{"mode": "soak", "model": "m", "prompt": "p"}"#;
        let err = RunConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, BenchError::Config(ConfigError::Parse(_))));
        assert!(err.to_string().contains("soak"));
    }

    #[test]
    fn test_missing_prompt_in_json() {
        let json = r#"{
            "mode": "loadtest",
            "model": "m",
            "maxRequests": 5,
            "proxy": {"baseUrl": "https://proxy.local/v1", "apiKey": "pk"}
        }"#;
        let err = RunConfig::from_json_str(json).unwrap_err();
        assert!(matches!(
            err,
            BenchError::Config(ConfigError::MissingPrompt)
        ));
    }

    #[test]
    fn test_serialization_redacts_credentials() {
        let config = comparison_config()
            .with_proxy(
                ProviderEndpoint::new("https://proxy.local/v1")
                    .with_api_key("pk-secret")
                    .with_header("x-proxy-key", "hidden"),
            );
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-direct"));
        assert!(!json.contains("pk-secret"));
        assert!(!json.contains("hidden"));
        assert!(json.contains("\"maxRequests\":10"));
        assert!(json.contains("\"requestTimeout\":\"1m\""));
    }

    #[test]
    fn test_missing_file() {
        let err = RunConfig::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, BenchError::Config(ConfigError::Read { .. })));
    }
}
