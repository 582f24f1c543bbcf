//! GenaiProvider - Unified provider using the genai crate
//!
//! Handles all genai-supported providers (OpenAI, Anthropic, Gemini, etc.)
//! plus OpenAI-compatible ones routed through the ServiceTargetResolver.

use async_trait::async_trait;
use std::sync::Arc;

use crate::logging::Logger;
use crate::types::{CatalogEntry, ConversationMessage, ModelResponse};

use super::error::{ProviderError, ProviderResult};
use super::genai_adapter::{
    build_chat_request, create_client, from_genai_response, is_genai_supported, map_genai_error,
    to_genai_options, ProviderConfig,
};
use super::traits::{ChatOptions, Provider, ProviderModelConfig};

/// Unified provider using genai for all supported LLM APIs
pub struct GenaiProvider {
    provider_id: String,
    logger: Arc<dyn Logger>,
}

impl GenaiProvider {
    pub fn new(provider_id: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self {
            provider_id: provider_id.into(),
            logger,
        }
    }

    /// Check if this provider can handle the given provider ID
    pub fn supports(provider_id: &str) -> bool {
        is_genai_supported(provider_id)
    }

    /// Extract model name from a model string (e.g., "openai/gpt-4" -> "gpt-4")
    pub fn extract_model_name(model: &str) -> &str {
        model.split('/').nth(1).unwrap_or(model)
    }
}

#[async_trait]
impl Provider for GenaiProvider {
    fn name(&self) -> &str {
        &self.provider_id
    }

    fn requires_api_key(&self) -> bool {
        !matches!(self.provider_id.as_str(), "ollama")
    }

    async fn chat(
        &self,
        messages: &[ConversationMessage],
        tools: &[CatalogEntry],
        model_config: &ProviderModelConfig,
        options: &ChatOptions,
    ) -> ProviderResult<ModelResponse> {
        if self.requires_api_key() && model_config.api_key.is_none() {
            return Err(ProviderError::missing_api_key(&self.provider_id));
        }

        let model_name = Self::extract_model_name(&model_config.model);
        self.logger.debug(&format!(
            "[GenaiProvider] chat: provider={}, model={}, messages={}, tools={}",
            self.provider_id,
            model_name,
            messages.len(),
            tools.len()
        ));

        let client = create_client(&ProviderConfig::new(&self.provider_id, model_config));

        let chat_req = build_chat_request(messages, tools)?;

        let genai_options = to_genai_options(options);

        let response = client
            .exec_chat(model_name, chat_req, Some(&genai_options))
            .await
            .map_err(|e| {
                self.logger
                    .error(&format!("[GenaiProvider] request failed: {}", e));
                map_genai_error(&self.provider_id, e)
            })?;

        let converted = from_genai_response(&response);
        self.logger.debug(&format!(
            "[GenaiProvider] reply: text={}, tool_calls={}",
            converted.text.is_some(),
            converted.tool_calls.len()
        ));
        Ok(converted)
    }
}
