//! Error types shared across the agent.
//!
//! Configuration problems are fatal before any network call. Platform errors
//! carry enough shape for the retry wrapper to classify them; model errors are
//! per-conversation and never abort a run.

use thiserror::Error;

/// Errors raised by the Twitter platform client.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// HTTP 429. `reset_in_secs` comes from `x-rate-limit-reset` when present.
    #[error("rate limited by Twitter API")]
    RateLimited { reset_in_secs: Option<u64> },

    /// HTTP 5xx.
    #[error("Twitter server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Any other non-success response, or an `errors` payload with no data.
    #[error("Twitter API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("request failed: {0}")]
    Request(String),

    #[error("failed to parse Twitter response: {0}")]
    Decode(String),

    /// Retry budget spent on rate-limit responses.
    #[error("rate limit exceeded after {attempts} attempts")]
    RateLimitExceeded { attempts: u32 },

    /// Retry budget spent on server errors.
    #[error("Twitter unavailable after {attempts} attempts: {message}")]
    TransientServiceError { attempts: u32, message: String },
}

impl PlatformError {
    /// Map a non-success HTTP status to the matching variant.
    pub fn from_status(status: u16, body: &str, reset_in_secs: Option<u64>) -> Self {
        let message = truncate(body, 200);
        match status {
            429 => PlatformError::RateLimited { reset_in_secs },
            500..=599 => PlatformError::Server { status, message },
            _ => PlatformError::Api { status, message },
        }
    }
}

/// Error returned by a language-model call.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ModelError {
    pub message: String,
    pub status: Option<u16>,
}

impl ModelError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }
}

impl From<String> for ModelError {
    fn from(message: String) -> Self {
        ModelError::new(message)
    }
}

/// Invalid or missing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("configuration error: {0}")]
pub struct ConfigError(pub String);

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        ConfigError(message.into())
    }
}

/// Top-level error for tools and runs.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("generation failed: {0}")]
    Generation(#[from] ModelError),
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}
