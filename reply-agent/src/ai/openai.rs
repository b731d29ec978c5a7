use super::{DEFAULT_SYSTEM_PROMPT, LanguageModel};
use crate::error::{ModelError, truncate};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o";

/// Models that reject a `system` role message
const NO_SYSTEM_ROLE_MODELS: &[&str] = &["o1-preview", "o1-mini"];

#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    auth_headers: header::HeaderMap,
    endpoint: String,
    model: String,
    max_tokens: Option<u32>,
    temperature: f32,
    system_prompt: String,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct OpenAICompletionRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAICompletionResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}

impl OpenAIClient {
    pub fn new(api_key: &str, endpoint: Option<&str>, model: Option<&str>) -> Result<Self, ModelError> {
        let endpoint = completions_endpoint(endpoint.unwrap_or(DEFAULT_ENDPOINT));

        let mut auth_headers = header::HeaderMap::new();
        auth_headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        // Local relays may not need a key
        if !api_key.is_empty() {
            let auth_value = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| ModelError::new(format!("Invalid API key format: {}", e)))?;
            auth_headers.insert(header::AUTHORIZATION, auth_value);
        }

        let model = match model {
            Some(m) if !m.is_empty() => m.to_string(),
            _ => DEFAULT_MODEL.to_string(),
        };

        Ok(Self {
            client: crate::http::shared_client().clone(),
            auth_headers,
            endpoint,
            model,
            max_tokens: None,
            temperature: 0.0,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            retry: RetryPolicy {
                max_retries: 3,
                base_wait: Duration::from_secs(2),
                label: "[OPENAI]",
            },
        })
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: Option<&str>) -> Self {
        if let Some(prompt) = system_prompt.filter(|p| !p.trim().is_empty()) {
            self.system_prompt = prompt.to_string();
        }
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send_once(&self, request: &OpenAICompletionRequest) -> Result<String, ModelError> {
        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.auth_headers.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| ModelError::new(format!("OpenAI API request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ModelError::new(format!("Failed to read OpenAI response: {}", e)))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<OpenAIErrorResponse>(&body) {
                Ok(error_response) => format!("OpenAI API error: {}", error_response.error.message),
                Err(_) => format!(
                    "OpenAI API returned error status: {}, body: {}",
                    status,
                    truncate(&body, 200)
                ),
            };
            return Err(ModelError::with_status(message, status.as_u16()));
        }

        Ok(body)
    }
}

/// Accept either a base URL (`https://host/v1`) or the full completions endpoint.
fn completions_endpoint(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        trimmed.to_string()
    } else {
        format!("{}/chat/completions", trimmed)
    }
}

fn build_messages(model: &str, system_prompt: &str, prompt: &str) -> Vec<OpenAIMessage> {
    if NO_SYSTEM_ROLE_MODELS.contains(&model) {
        vec![OpenAIMessage {
            role: "user".to_string(),
            content: format!("System Instruction: {} \n Instruction:{}", system_prompt, prompt),
        }]
    } else {
        vec![
            OpenAIMessage {
                role: "system".to_string(),
                content: system_prompt.to_string(),
            },
            OpenAIMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            },
        ]
    }
}

fn parse_completion(body: &str) -> Result<String, ModelError> {
    let response: OpenAICompletionResponse = serde_json::from_str(body).map_err(|e| {
        ModelError::new(format!(
            "Failed to parse OpenAI response: {} - body: {}",
            e,
            truncate(body, 200)
        ))
    })?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ModelError::new("OpenAI API returned no choices"))?;

    log::debug!("[OPENAI] finish_reason: {:?}", choice.finish_reason);

    Ok(choice.message.content.unwrap_or_default())
}

#[async_trait]
impl LanguageModel for OpenAIClient {
    async fn query(&self, prompt: &str) -> Result<String, ModelError> {
        let request = OpenAICompletionRequest {
            model: self.model.clone(),
            messages: build_messages(&self.model, &self.system_prompt, prompt),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        log::info!(
            "[OPENAI] Sending request to {} with model {} ({} prompt chars)",
            self.endpoint,
            self.model,
            prompt.chars().count()
        );

        let request = &request;
        let body = self
            .retry
            .run("chat completion", move || self.send_once(request))
            .await?;

        log::debug!("[OPENAI] Raw response:\n{}", body);

        parse_completion(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_endpoint() {
        assert_eq!(
            completions_endpoint("https://api.fireworks.ai/inference/v1"),
            "https://api.fireworks.ai/inference/v1/chat/completions"
        );
        assert_eq!(
            completions_endpoint("https://api.openai.com/v1/chat/completions/"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_build_messages_with_system_role() {
        let messages = build_messages("gpt-4o", "be brief", "hello");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, "be brief");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "hello");
    }

    #[test]
    fn test_build_messages_without_system_role() {
        let messages = build_messages("o1-mini", "be brief", "hello");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        assert!(messages[0].content.contains("be brief"));
        assert!(messages[0].content.ends_with("hello"));
    }

    #[test]
    fn test_parse_completion() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "gm"}, "finish_reason": "stop"}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "gm");

        let err = parse_completion(r#"{"choices": []}"#).unwrap_err();
        assert!(err.message.contains("no choices"));
    }

    #[test]
    fn test_client_defaults() {
        let client = OpenAIClient::new("", None, None).unwrap();
        assert_eq!(client.model(), "gpt-4o");
        assert_eq!(client.endpoint, DEFAULT_ENDPOINT);
        assert!(!client.auth_headers.contains_key(header::AUTHORIZATION));

        let client = OpenAIClient::new("sk-test", Some("http://localhost:8000/v1"), Some("llama"))
            .unwrap()
            .with_system_prompt(Some("  "));
        assert_eq!(client.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert!(client.auth_headers.contains_key(header::AUTHORIZATION));
    }
}
