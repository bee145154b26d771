//! Error types for the AI module

use thiserror::Error;

/// AI module error types
#[derive(Error, Debug)]
pub enum AiError {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("{provider} API error ({status}): {message}")]
    LlmHttp {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("{provider} returned an empty response")]
    EmptyResponse { provider: String },

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Missing credentials for provider {0}")]
    MissingCredentials(String),

    #[error("Invalid provider configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AiError {
    /// True for errors raised while resolving configuration, before any
    /// request has been sent.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedProvider(_) | Self::MissingCredentials(_) | Self::InvalidConfig(_)
        )
    }
}

/// Result type alias for AI operations
pub type Result<T> = std::result::Result<T, AiError>;
