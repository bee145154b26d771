//! LLM client factory: routes a provider configuration to a concrete client

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AiError, Result};
use crate::http_client::build_http_client;
use crate::llm::gemini::GEMINI_DEFAULT_MODEL;
use crate::llm::{GeminiClient, LlmClient, OpenAIClient};

const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    Gemini,
    OpenRouter,
    OpenAICompatible,
}

impl LlmProvider {
    pub const ALL: [LlmProvider; 3] = [Self::Gemini, Self::OpenRouter, Self::OpenAICompatible];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenRouter => "openrouter",
            Self::OpenAICompatible => "openai-compatible",
        }
    }

    /// Model used when the configuration does not name one.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => GEMINI_DEFAULT_MODEL,
            Self::OpenRouter => "openai/gpt-3.5-turbo",
            Self::OpenAICompatible => "gpt-3.5-turbo",
        }
    }

    /// Environment variable conventionally holding this provider's API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
            Self::OpenAICompatible => "OPENAI_API_KEY",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmProvider {
    type Err = AiError;

    fn from_str(tag: &str) -> Result<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openrouter" => Ok(Self::OpenRouter),
            "openai-compatible" | "openaicompatible" | "openai_compatible" => {
                Ok(Self::OpenAICompatible)
            }
            _ => Err(AiError::UnsupportedProvider(tag.to_string())),
        }
    }
}

/// Credentials for the text generation backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationCredentials {
    #[serde(default)]
    pub api_key: Option<String>,
}

impl GenerationCredentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
        }
    }

    /// The API key, if present and not blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// Caller-supplied provider configuration, passed into every generating call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_provider: String,
    #[serde(default)]
    pub credentials: GenerationCredentials,
    #[serde(default)]
    pub model: Option<String>,
    /// Base URL, required for `openai-compatible`.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ProviderConfig {
    pub fn new(api_provider: impl Into<String>) -> Self {
        Self {
            api_provider: api_provider.into(),
            credentials: GenerationCredentials::default(),
            model: None,
            endpoint: None,
            timeout_secs: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.credentials = GenerationCredentials::new(api_key);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Parse the provider tag.
    pub fn provider(&self) -> Result<LlmProvider> {
        self.api_provider.parse()
    }

    /// Check the configuration without building a client: the provider tag is
    /// known, an API key is present and, where needed, an endpoint is set.
    pub fn validate(&self) -> Result<LlmProvider> {
        let provider = self.provider()?;
        if self.credentials.api_key().is_none() {
            return Err(AiError::MissingCredentials(provider.to_string()));
        }
        if provider == LlmProvider::OpenAICompatible && self.endpoint().is_none() {
            return Err(AiError::InvalidConfig(
                "openai-compatible provider requires an endpoint".to_string(),
            ));
        }
        Ok(provider)
    }

    /// Model name, falling back to the provider default.
    pub fn model_or_default(&self, provider: LlmProvider) -> String {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|model| !model.is_empty())
            .unwrap_or(provider.default_model())
            .to_string()
    }

    fn endpoint(&self) -> Option<&str> {
        self.endpoint
            .as_deref()
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
    }
}

pub trait LlmClientFactory: Send + Sync {
    /// Build a client for `config`. Configuration errors are returned before
    /// any request is made.
    fn create_client(&self, config: &ProviderConfig) -> Result<Arc<dyn LlmClient>>;

    fn supported_providers(&self) -> Vec<LlmProvider> {
        LlmProvider::ALL.to_vec()
    }
}

/// Routes by provider tag and builds a fresh client on every call.
#[derive(Debug, Clone, Default)]
pub struct DefaultLlmClientFactory;

impl DefaultLlmClientFactory {
    pub fn new() -> Self {
        Self
    }
}

impl LlmClientFactory for DefaultLlmClientFactory {
    fn create_client(&self, config: &ProviderConfig) -> Result<Arc<dyn LlmClient>> {
        let provider = config.validate()?;
        let api_key = config
            .credentials
            .api_key()
            .ok_or_else(|| AiError::MissingCredentials(provider.to_string()))?;
        let model = config.model_or_default(provider);
        let http = build_http_client(config.timeout_secs.map(Duration::from_secs))?;

        tracing::debug!(provider = %provider, model = %model, "Creating LLM client");

        match provider {
            LlmProvider::Gemini => {
                let mut client = GeminiClient::new(api_key)?
                    .with_model(model)
                    .with_http_client(http);
                if let Some(endpoint) = config.endpoint() {
                    client = client.with_base_url(endpoint);
                }
                Ok(Arc::new(client))
            }
            LlmProvider::OpenRouter => {
                let client = OpenAIClient::new(api_key)?
                    .with_model(model)
                    .with_base_url(config.endpoint().unwrap_or(OPENROUTER_BASE_URL))
                    .with_provider_name(provider.as_str())
                    .with_http_client(http);
                Ok(Arc::new(client))
            }
            LlmProvider::OpenAICompatible => {
                let endpoint = config.endpoint().ok_or_else(|| {
                    AiError::InvalidConfig(
                        "openai-compatible provider requires an endpoint".to_string(),
                    )
                })?;
                let client = OpenAIClient::new(api_key)?
                    .with_model(model)
                    .with_base_url(endpoint)
                    .with_provider_name(provider.as_str())
                    .with_http_client(http);
                Ok(Arc::new(client))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_tags_parse_case_insensitively() {
        assert_eq!("Gemini".parse::<LlmProvider>().unwrap(), LlmProvider::Gemini);
        assert_eq!(
            " openrouter ".parse::<LlmProvider>().unwrap(),
            LlmProvider::OpenRouter
        );
        assert_eq!(
            "OpenAI-Compatible".parse::<LlmProvider>().unwrap(),
            LlmProvider::OpenAICompatible
        );
        assert!(matches!(
            "claude".parse::<LlmProvider>(),
            Err(AiError::UnsupportedProvider(tag)) if tag == "claude"
        ));
    }

    #[test]
    fn test_unknown_provider_is_rejected_before_credentials() {
        let factory = DefaultLlmClientFactory::new();
        let err = factory
            .create_client(&ProviderConfig::new("mystery"))
            .err()
            .unwrap();
        assert!(matches!(err, AiError::UnsupportedProvider(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_missing_or_blank_key_is_rejected() {
        let factory = DefaultLlmClientFactory::new();

        let err = factory
            .create_client(&ProviderConfig::new("gemini"))
            .err()
            .unwrap();
        assert!(matches!(err, AiError::MissingCredentials(ref p) if p == "gemini"));

        let err = factory
            .create_client(&ProviderConfig::new("openrouter").with_api_key("   "))
            .err()
            .unwrap();
        assert!(matches!(err, AiError::MissingCredentials(_)));
    }

    #[test]
    fn test_openai_compatible_requires_endpoint() {
        let factory = DefaultLlmClientFactory::new();
        let err = factory
            .create_client(&ProviderConfig::new("openai-compatible").with_api_key("sk"))
            .err()
            .unwrap();
        assert!(matches!(err, AiError::InvalidConfig(_)));
    }

    #[test]
    fn test_routes_to_provider_with_default_models() {
        let factory = DefaultLlmClientFactory::new();

        let gemini = factory
            .create_client(&ProviderConfig::new("gemini").with_api_key("g-key"))
            .unwrap();
        assert_eq!(gemini.provider(), "gemini");
        assert_eq!(gemini.model(), GEMINI_DEFAULT_MODEL);

        let openrouter = factory
            .create_client(&ProviderConfig::new("openrouter").with_api_key("or-key"))
            .unwrap();
        assert_eq!(openrouter.provider(), "openrouter");
        assert_eq!(openrouter.model(), "openai/gpt-3.5-turbo");

        let compatible = factory
            .create_client(
                &ProviderConfig::new("openai-compatible")
                    .with_api_key("sk")
                    .with_endpoint("http://localhost:8080/v1")
                    .with_model("llama-3"),
            )
            .unwrap();
        assert_eq!(compatible.provider(), "openai-compatible");
        assert_eq!(compatible.model(), "llama-3");
    }

    #[test]
    fn test_provider_config_deserializes_with_defaults() {
        let config: ProviderConfig = serde_json::from_value(serde_json::json!({
            "api_provider": "gemini",
            "credentials": {"api_key": "abc"}
        }))
        .unwrap();

        assert_eq!(config.validate().unwrap(), LlmProvider::Gemini);
        assert!(config.model.is_none());
        assert!(config.timeout_secs.is_none());
    }
}
