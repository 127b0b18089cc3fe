//! Completion responses, header views and token usage

use serde::{Deserialize, Serialize};

/// Header names probed, in order, for an upstream processing time
pub const PROCESSING_TIME_HEADERS: &[&str] = &[
    "openai-processing-ms",
    "OpenAI-Processing-Ms",
    "x-processing-ms",
    "X-Processing-Ms",
    "x-processing-time",
    "X-Processing-Time",
    "x-processing-time-ms",
    "processing-time-ms",
    "processing-time",
    "x-upstream-processing-ms",
];

/// Transport-agnostic view of response headers
///
/// Keeps names exactly as the transport reported them so lookups can be
/// case-sensitive; [`ResponseHeaders::iter`] enumerates everything for
/// case-insensitive scans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHeaders {
    entries: Vec<(String, String)>,
}

impl ResponseHeaders {
    /// Create an empty header set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Case-sensitive lookup of the first header named `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Enumerate all headers in arrival order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Number of headers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no headers
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ResponseHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Parse a header value as a positive number of milliseconds
fn parse_positive_ms(value: &str) -> Option<f64> {
    let value = value.trim();
    let value = value.strip_suffix("ms").unwrap_or(value).trim();
    value
        .parse::<f64>()
        .ok()
        .filter(|ms| ms.is_finite() && *ms > 0.0)
}

fn looks_like_processing_time(name: &str) -> bool {
    let name = name.to_lowercase();
    (name.contains("processing") || name.contains("time"))
        && (name.contains("ms") || name.contains("time"))
}

/// Extract the upstream-reported processing time in milliseconds
///
/// First probes [`PROCESSING_TIME_HEADERS`] by exact name, then falls back to
/// scanning every header whose name mentions processing time. The first
/// positive numeric value wins. Returns `None` when nothing usable is found.
pub fn extract_processing_time(headers: &ResponseHeaders) -> Option<f64> {
    PROCESSING_TIME_HEADERS
        .iter()
        .filter_map(|name| headers.get(name))
        .find_map(parse_positive_ms)
        .or_else(|| {
            headers
                .iter()
                .filter(|(name, _)| looks_like_processing_time(name))
                .find_map(|(_, value)| parse_positive_ms(value))
        })
}

/// Token usage reported by the upstream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens
    pub prompt: u64,
    /// Completion tokens
    pub completion: u64,
    /// Total tokens
    pub total: u64,
}

impl TokenUsage {
    /// Create usage from prompt and completion counts
    pub fn new(prompt: u64, completion: u64) -> Self {
        Self {
            prompt,
            completion,
            total: prompt + completion,
        }
    }

    /// Read the `usage` object of a response body
    ///
    /// Supports both OpenAI (prompt_tokens/completion_tokens) and
    /// Anthropic (input_tokens/output_tokens) naming conventions. Missing
    /// fields are zero; a missing total is derived from the parts.
    pub fn from_body(body: &serde_json::Value) -> Self {
        let Some(usage) = body.get("usage") else {
            return Self::default();
        };

        let prompt = usage
            .get("prompt_tokens")
            .or_else(|| usage.get("input_tokens"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        let completion = usage
            .get("completion_tokens")
            .or_else(|| usage.get("output_tokens"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        let total = usage
            .get("total_tokens")
            .and_then(|v| v.as_u64())
            .unwrap_or(prompt + completion);

        Self {
            prompt,
            completion,
            total,
        }
    }
}

impl std::ops::Add for TokenUsage {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            prompt: self.prompt + rhs.prompt,
            completion: self.completion + rhs.completion,
            total: self.total + rhs.total,
        }
    }
}

/// Successful completer response: body plus raw transport metadata
#[derive(Debug, Clone, Default)]
pub struct CompletionResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: ResponseHeaders,
    /// Decoded JSON body
    pub body: serde_json::Value,
}

impl CompletionResponse {
    /// Token usage carried in the body
    pub fn usage(&self) -> TokenUsage {
        TokenUsage::from_body(&self.body)
    }

    /// Upstream processing time carried in the headers
    pub fn processing_time_ms(&self) -> Option<f64> {
        extract_processing_time(&self.headers)
    }
}
