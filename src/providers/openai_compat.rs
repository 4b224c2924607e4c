//! OpenAI-compatible provider
//!
//! Works with any API that implements the OpenAI chat completions format
//! (OpenAI itself, Groq, vLLM, LM Studio, ...).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};
use crate::conversation::{Message, Role};

use super::{CompletionProvider, CompletionRequest, ProviderError};

/// OpenAI-compatible chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.as_str().to_string(),
            content: msg.content.clone(),
        }
    }
}

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Error response from API
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// OpenAI-compatible provider configuration
#[derive(Debug, Clone)]
pub struct OpenAICompatConfig {
    /// Base URL for the API (e.g., https://api.openai.com/v1)
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Upper bound on reply length, if any
    pub max_tokens: Option<u32>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl OpenAICompatConfig {
    /// Provider settings from the application config.
    ///
    /// Fails with `ConfigError::MissingCredential` when no API key is set.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key()?.to_string(),
            model: config.openai_model.clone(),
            max_tokens: Some(config.max_tokens).filter(|&n| n > 0),
            timeout_secs: config.timeout_secs,
        })
    }
}

/// OpenAI-compatible API provider
pub struct OpenAICompatProvider {
    config: OpenAICompatConfig,
    client: Client,
}

impl OpenAICompatProvider {
    /// Create a new provider with the given configuration
    pub fn new(config: OpenAICompatConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn build_request(&self, request: &CompletionRequest) -> ChatCompletionRequest {
        let system = ChatMessage {
            role: Role::System.as_str().to_string(),
            content: request.system.clone(),
        };

        let messages = std::iter::once(system)
            .chain(request.messages.iter().map(ChatMessage::from))
            .collect();

        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            temperature: request.temperature,
            max_tokens: self.config.max_tokens,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAICompatProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let body = self.build_request(request);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(parse_error(status, &text));
        }

        parse_completion(&text)
    }
}

fn parse_completion(body: &str) -> Result<String, ProviderError> {
    let completion: ChatCompletionResponse = serde_json::from_str(body).map_err(|e| {
        ProviderError::InvalidResponse(format!("Failed to parse response: {} - Body: {}", e, body))
    })?;

    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".to_string()))?;

    choice
        .message
        .content
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| ProviderError::InvalidResponse("Empty content in response".to_string()))
}

/// Prefer the API's own `{error:{message}}`, else the raw body
fn parse_error(status: StatusCode, body: &str) -> ProviderError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());

    ProviderError::Api {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAICompatProvider {
        OpenAICompatProvider::new(OpenAICompatConfig {
            base_url: "http://localhost:9".to_string(),
            api_key: "sk-test".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: Some(500),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_config_requires_key() {
        let config = Config::default();
        assert!(matches!(
            OpenAICompatConfig::from_config(&config),
            Err(ConfigError::MissingCredential)
        ));

        let config = Config {
            openai_api_key: Some("sk-test".into()),
            openai_base_url: "https://example.com/v1/".into(),
            ..Config::default()
        };
        let provider_config = OpenAICompatConfig::from_config(&config).unwrap();
        assert_eq!(provider_config.base_url, "https://example.com/v1");
        assert_eq!(provider_config.max_tokens, Some(500));
    }

    #[test]
    fn test_request_prepends_system_message() {
        let request = CompletionRequest {
            system: "be a tarot reader".into(),
            messages: vec![Message::assistant("hello"), Message::user("tarot")],
            temperature: 0.7,
        };

        let body = serde_json::to_value(provider().build_request(&request)).unwrap();
        let roles: Vec<&str> = body["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, ["system", "assistant", "user"]);
        assert_eq!(body["messages"][0]["content"], "be a tarot reader");
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["model"], "gpt-3.5-turbo");
    }

    #[test]
    fn test_parse_completion() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Your stars look bright."}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "Your stars look bright.");

        let err = parse_completion(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[test]
    fn test_missing_content_is_invalid() {
        for body in [
            r#"{"choices":[{"message":{"content":null}}]}"#,
            r#"{"choices":[{"message":{"role":"assistant"}}]}"#,
            r#"{"choices":[{"message":{"content":"  "}}]}"#,
        ] {
            let err = parse_completion(body).unwrap_err();
            assert!(matches!(err, ProviderError::InvalidResponse(_)), "{body}");
        }
    }

    #[test]
    fn test_error_body_message() {
        let body = r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#;
        let err = parse_error(StatusCode::TOO_MANY_REQUESTS, body);

        match &err {
            ProviderError::Api { status, message } => {
                assert_eq!(*status, 429);
                assert_eq!(message, "Rate limit reached");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.to_string(), "API error (429): Rate limit reached");
    }

    #[test]
    fn test_error_body_not_json() {
        let err = parse_error(StatusCode::BAD_GATEWAY, "upstream connect error");

        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream connect error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
