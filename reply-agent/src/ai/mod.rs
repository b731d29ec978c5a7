pub mod openai;

pub use openai::OpenAIClient;

use crate::error::ModelError;
use crate::retry::{RetryClass, Retryable};
use async_trait::async_trait;

/// Default system prompt sent with every query
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that can answer questions and provide information.";

/// Text-in, text-out language model
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn query(&self, prompt: &str) -> Result<String, ModelError>;
}

impl Retryable for ModelError {
    fn retry_class(&self) -> Option<RetryClass> {
        match self.status {
            Some(429) => Some(RetryClass::RateLimit),
            Some(502 | 503 | 504) => Some(RetryClass::Transient),
            _ => None,
        }
    }

    fn exhausted(self, _class: RetryClass, attempts: u32) -> Self {
        ModelError {
            message: format!("{} (gave up after {} attempts)", self.message, attempts),
            status: self.status,
        }
    }
}
