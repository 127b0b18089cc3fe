//! Request types for chat-completion calls

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Maximum characters kept from a text prompt for preflight probes
pub const PROBE_PROMPT_CHARS: usize = 100;

/// Chat message (OpenAI-compatible format)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message role (system, user, assistant)
    pub role: Role,
    /// Message text
    pub content: String,
}

impl Message {
    /// Create a new text message
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message (instructions)
    System,
    /// User message (input)
    User,
    /// Assistant message (output)
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Configured prompt: a single utterance or a full conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prompt {
    /// Sent as one user message
    Text(String),
    /// Sent verbatim
    Messages(Vec<Message>),
}

impl Prompt {
    /// Normalize into the message sequence sent on the wire
    pub fn to_messages(&self) -> Result<Vec<Message>, ConfigError> {
        match self {
            Prompt::Text(text) => Ok(vec![Message::user(text.clone())]),
            Prompt::Messages(messages) if messages.is_empty() => Err(ConfigError::EmptyMessages),
            Prompt::Messages(messages) => Ok(messages.clone()),
        }
    }

    /// Shortened copy for preflight probes
    ///
    /// Text prompts keep at most `max_chars` characters; message sequences
    /// are returned unchanged.
    pub fn truncated(&self, max_chars: usize) -> Prompt {
        match self {
            Prompt::Text(text) => Prompt::Text(text.chars().take(max_chars).collect()),
            Prompt::Messages(messages) => Prompt::Messages(messages.clone()),
        }
    }
}

impl From<&str> for Prompt {
    fn from(text: &str) -> Self {
        Prompt::Text(text.to_string())
    }
}

impl From<String> for Prompt {
    fn from(text: String) -> Self {
        Prompt::Text(text)
    }
}

impl From<Vec<Message>> for Prompt {
    fn from(messages: Vec<Message>) -> Self {
        Prompt::Messages(messages)
    }
}

/// Generation parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 100,
            temperature: 0.7,
        }
    }
}

/// A single chat-completion call as handed to a [`Completer`](crate::traits::Completer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,
    /// Conversation
    pub messages: Vec<Message>,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl CompletionRequest {
    /// Build a request from a prompt, normalizing it into messages
    pub fn new(
        model: impl Into<String>,
        prompt: &Prompt,
        params: GenerationParams,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            model: model.into(),
            messages: prompt.to_messages()?,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        })
    }
}
