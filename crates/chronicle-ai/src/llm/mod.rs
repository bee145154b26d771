//! LLM module - provider clients behind a single generation capability

mod client;
mod factory;
mod gemini;
#[cfg(any(test, feature = "test-utils"))]
mod mock_client;
mod openai;

pub use client::{
    CompletionRequest, CompletionResponse, FinishReason, LlmClient, Message, Role, TokenUsage,
};
pub use factory::{
    DefaultLlmClientFactory, GenerationCredentials, LlmClientFactory, LlmProvider, ProviderConfig,
};
pub use gemini::GeminiClient;
#[cfg(any(test, feature = "test-utils"))]
pub use mock_client::{MockLlmClient, MockLlmClientFactory, MockStep, MockStepKind};
pub use openai::OpenAIClient;
