//! LLM Provider implementations
//!
//! All real providers go through the `genai` crate, which handles the
//! provider-specific protocols and tool calling. Providers not native to genai
//! (OpenRouter, Mistral) are routed via genai's `ServiceTargetResolver` using
//! the OpenAI-compatible protocol.
//!
//! The `MockProvider` backs tests and the `mock` provider id.

mod error;
mod genai_adapter;
mod genai_provider;
mod mock;
mod traits;

pub use error::{ProviderError, ProviderResult};
pub use genai_adapter::{is_genai_native, is_genai_supported, ProviderConfig};
pub use genai_provider::GenaiProvider;
pub use mock::{MockMode, MockProvider, MockReply, RecordedRequest};
pub use traits::{ChatOptions, Provider, ProviderModelConfig};

use crate::logging::Logger;
use std::sync::Arc;

/// Create a provider for the given provider ID
///
/// `mock` gives an echo provider; everything else goes through genai, with
/// unknown ids treated as OpenAI-compatible endpoints.
pub fn create_provider(provider_id: &str, logger: Arc<dyn Logger>) -> Arc<dyn Provider> {
    match provider_id.to_lowercase().as_str() {
        "mock" => Arc::new(MockProvider::echo(logger)),
        _ => Arc::new(GenaiProvider::new(provider_id, logger)),
    }
}

/// List all supported provider IDs
pub fn supported_providers() -> Vec<&'static str> {
    vec![
        "openai",
        "anthropic",
        "gemini",
        "ollama",
        "groq",
        "xai",
        "deepseek",
        "cohere",
        "fireworks",
        "together",
        "openrouter",
        "mistral",
        "mock",
    ]
}
