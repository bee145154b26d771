//! Chronicle AI - text generation adapters
//!
//! This crate provides:
//! - The `LlmClient` capability used for summaries and regenerated replies
//! - Provider clients (Gemini, OpenRouter, OpenAI-compatible endpoints)
//! - Pure routing from a caller-supplied `ProviderConfig` to a client
//!
//! Nothing here retries; a failed call surfaces as an `AiError` and the caller
//! decides what to do with it.

pub mod error;
mod http_client;
pub mod llm;

pub use error::{AiError, Result};
pub use llm::{
    CompletionRequest, CompletionResponse, DefaultLlmClientFactory, FinishReason,
    GeminiClient, GenerationCredentials, LlmClient, LlmClientFactory, LlmProvider, Message,
    OpenAIClient, ProviderConfig, Role, TokenUsage,
};

#[cfg(any(test, feature = "test-utils"))]
pub use llm::{MockLlmClient, MockLlmClientFactory, MockStep, MockStepKind};
