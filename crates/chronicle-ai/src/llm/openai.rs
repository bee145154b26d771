//! OpenAI-compatible chat completions provider (OpenRouter and custom endpoints)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AiError, Result};
use crate::http_client::{build_http_client, response_to_error};
use crate::llm::client::{
    CompletionRequest, CompletionResponse, FinishReason, LlmClient, Role, TokenUsage,
};

/// OpenAI-compatible client
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    provider: String,
}

impl OpenAIClient {
    /// Create a new client against the OpenAI API
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_http_client(None)?,
            api_key: api_key.into(),
            model: "gpt-3.5-turbo".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            provider: "openai".to_string(),
        })
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set custom base URL (for API-compatible services)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(&url.into());
        self
    }

    /// Name reported by `provider()` and used in error messages
    pub fn with_provider_name(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies)
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

/// Accept both `https://host/v1` and `https://host/v1/chat/completions`.
fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    trimmed
        .strip_suffix("/chat/completions")
        .unwrap_or(trimmed)
        .to_string()
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[async_trait]
impl LlmClient for OpenAIClient {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let messages: Vec<OpenAIMessage> = request
            .messages
            .into_iter()
            .map(|m| OpenAIMessage {
                role: match m.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                content: m.content,
            })
            .collect();

        let body = OpenAIRequest {
            model: self.model.clone(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        tracing::debug!(
            provider = %self.provider,
            model = %self.model,
            messages = body.messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(response_to_error(response, &self.provider).await);
        }

        let data: OpenAIResponse = response.json().await?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AiError::Llm(format!("No response from {}", self.provider)))?;

        let finish_reason = choice
            .finish_reason
            .as_deref()
            .map(FinishReason::from_provider)
            .unwrap_or(FinishReason::Stop);

        let usage = data.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(CompletionResponse {
            content: choice.message.content,
            finish_reason,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::Message;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("https://example.com/v1/"),
            "https://example.com/v1"
        );
        assert_eq!(
            normalize_base_url("https://example.com/v1/chat/completions"),
            "https://example.com/v1"
        );
    }

    #[tokio::test]
    async fn test_complete_sends_bearer_and_model() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "openai/gpt-3.5-turbo",
                "max_tokens": 128,
                "messages": [
                    {"role": "system", "content": "persona"},
                    {"role": "user", "content": "hello"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "message": {"role": "assistant", "content": "Hi!"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 3, "completion_tokens": 1, "total_tokens": 4}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAIClient::new("sk-test")
            .unwrap()
            .with_model("openai/gpt-3.5-turbo")
            .with_base_url(format!("{}/api/v1", server.uri()))
            .with_provider_name("openrouter");

        let response = client
            .complete(
                CompletionRequest::new(vec![Message::system("persona"), Message::user("hello")])
                    .with_max_tokens(128),
            )
            .await
            .unwrap();

        assert_eq!(client.provider(), "openrouter");
        assert_eq!(response.content.as_deref(), Some("Hi!"));
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(
            response.usage,
            Some(TokenUsage {
                prompt_tokens: 3,
                completion_tokens: 1,
                total_tokens: 4,
            })
        );
    }

    #[tokio::test]
    async fn test_error_status_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAIClient::new("sk-test")
            .unwrap()
            .with_base_url(server.uri())
            .with_provider_name("openai-compatible");

        let err = client
            .complete(CompletionRequest::new(vec![Message::user("hello")]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AiError::LlmHttp { status: 429, ref provider, .. } if provider == "openai-compatible"
        ));
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let client = OpenAIClient::new("sk-test")
            .unwrap()
            .with_base_url(server.uri());

        let err = client
            .complete(CompletionRequest::new(vec![Message::user("hello")]))
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Llm(_)));
    }
}
