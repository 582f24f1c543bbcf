//! Mock provider for testing
//!
//! Provides deterministic, configurable replies without network dependencies.
//! Useful for the tool loop, the session hub and the CLI's `mock` provider.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use super::error::{ProviderError, ProviderResult};
use super::traits::{ChatOptions, Provider, ProviderModelConfig};
use crate::logging::Logger;
use crate::types::{CatalogEntry, ConversationMessage, MessageRole, ModelResponse, ToolRequest};

/// One canned reply
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Final text
    Text(String),
    /// Tool calls
    ToolCalls(Vec<ToolRequest>),
    /// Neither text nor tool calls
    Empty,
    /// Transport failure
    Fail(String),
}

/// Mock response mode
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Echo back the last user message
    Echo,
    /// Play replies in order; running out is an error
    Script(Vec<MockReply>),
    /// Give the same reply every time
    Repeat(MockReply),
}

impl Default for MockMode {
    fn default() -> Self {
        MockMode::Echo
    }
}

/// What one `chat` call received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<ConversationMessage>,
    pub tool_names: Vec<String>,
}

/// Mock LLM provider for testing
pub struct MockProvider {
    mode: MockMode,
    script: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<RecordedRequest>>,
    delay_ms: u64,
    logger: Arc<dyn Logger>,
}

impl MockProvider {
    pub fn new(mode: MockMode, logger: Arc<dyn Logger>) -> Self {
        let script = match &mode {
            MockMode::Script(replies) => replies.iter().cloned().collect(),
            _ => VecDeque::new(),
        };
        Self {
            mode,
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
            delay_ms: 0,
            logger,
        }
    }

    /// Create an echo provider (echoes back user message)
    pub fn echo(logger: Arc<dyn Logger>) -> Self {
        Self::new(MockMode::Echo, logger)
    }

    /// Create a fixed response provider
    pub fn fixed(response: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::new(MockMode::Repeat(MockReply::Text(response.into())), logger)
    }

    /// Create a scripted provider
    pub fn scripted(replies: Vec<MockReply>, logger: Arc<dyn Logger>) -> Self {
        Self::new(MockMode::Script(replies), logger)
    }

    /// Create an error-producing provider
    pub fn error(message: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::new(MockMode::Repeat(MockReply::Fail(message.into())), logger)
    }

    /// Delay every reply
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Number of `chat` calls so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn last_user_message(messages: &[ConversationMessage]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role() == MessageRole::User)
            .and_then(|m| m.text())
            .filter(|t| !t.is_empty())
            .unwrap_or("Hello from MockProvider!")
            .to_string()
    }

    fn next_reply(&self, messages: &[ConversationMessage]) -> ProviderResult<MockReply> {
        match &self.mode {
            MockMode::Echo => Ok(MockReply::Text(format!(
                "Echo: {}",
                Self::last_user_message(messages)
            ))),
            MockMode::Repeat(reply) => Ok(reply.clone()),
            MockMode::Script(_) => self
                .script
                .lock()
                .pop_front()
                .ok_or_else(|| ProviderError::Other("Mock script exhausted".to_string())),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn requires_api_key(&self) -> bool {
        false
    }

    async fn chat(
        &self,
        messages: &[ConversationMessage],
        tools: &[CatalogEntry],
        _model: &ProviderModelConfig,
        _options: &ChatOptions,
    ) -> ProviderResult<ModelResponse> {
        self.requests.lock().push(RecordedRequest {
            messages: messages.to_vec(),
            tool_names: tools.iter().map(|t| t.name.clone()).collect(),
        });

        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }

        let reply = self.next_reply(messages)?;
        self.logger
            .debug(&format!("[MockProvider] replying with {:?}", reply));

        match reply {
            MockReply::Text(text) => Ok(ModelResponse::text(text)),
            MockReply::ToolCalls(calls) => Ok(ModelResponse::tool_calls(calls)),
            MockReply::Empty => Ok(ModelResponse::default()),
            MockReply::Fail(message) => Err(ProviderError::Other(format!("Mock error: {}", message))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;

    fn test_config() -> ProviderModelConfig {
        ProviderModelConfig::new("mock-echo")
    }

    #[tokio::test]
    async fn test_echo_mode() {
        let provider = MockProvider::echo(NoOpLogger::shared());
        let messages = vec![ConversationMessage::user("Hello, world!")];

        let response = provider
            .chat(&messages, &[], &test_config(), &ChatOptions::default())
            .await
            .unwrap();

        assert_eq!(response.text.as_deref(), Some("Echo: Hello, world!"));
        assert!(response.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn test_script_plays_in_order_then_errors() {
        let provider = MockProvider::scripted(
            vec![
                MockReply::ToolCalls(vec![ToolRequest::new("c1", "a__x", "{}")]),
                MockReply::Text("done".to_string()),
            ],
            NoOpLogger::shared(),
        );
        let messages = vec![ConversationMessage::user("go")];
        let opts = ChatOptions::default();

        let first = provider.chat(&messages, &[], &test_config(), &opts).await.unwrap();
        assert_eq!(first.tool_calls.len(), 1);
        let second = provider.chat(&messages, &[], &test_config(), &opts).await.unwrap();
        assert_eq!(second.text.as_deref(), Some("done"));
        assert!(provider.chat(&messages, &[], &test_config(), &opts).await.is_err());
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_error_mode() {
        let provider = MockProvider::error("Test error message", NoOpLogger::shared());
        let err = provider
            .chat(&[], &[], &test_config(), &ChatOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Test error message"));
    }

    #[tokio::test]
    async fn test_records_tool_names() {
        let provider = MockProvider::fixed("ok", NoOpLogger::shared());
        let tools = vec![CatalogEntry {
            name: "a__search".to_string(),
            description: "search".to_string(),
            parameters: serde_json::json!({"type": "object", "properties": {}}),
        }];
        provider
            .chat(&[], &tools, &test_config(), &ChatOptions::default())
            .await
            .unwrap();

        let requests = provider.requests();
        assert_eq!(requests[0].tool_names, vec!["a__search".to_string()]);
    }
}
