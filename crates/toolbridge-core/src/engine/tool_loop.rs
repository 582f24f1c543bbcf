//! The LLM/tool state machine for one turn
//!
//! ```text
//!            user message appended
//!                     │
//!                     ▼
//!   ┌──────────► AwaitingModel ── final text ──► Done
//!   │                 │    └─── neither / LLM failure ──► Error
//!   │            tool calls
//!   │                 ▼
//!   └──────── DispatchingTools ── round limit ──► Error
//! ```

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::logging::Logger;
use crate::mcp::{BackendPool, ToolContent};
use crate::providers::{ChatOptions, Provider, ProviderModelConfig};
use crate::tools::ToolCatalog;
use crate::types::{AssistantReply, ConversationMessage, ToolFailureKind, ToolOutcome, ToolRequest};

use super::conversation::Conversation;
use super::error::{TurnError, TurnResult};

/// Default cap on tool-dispatch rounds per turn
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 10;

/// Per-turn limits and request options
#[derive(Debug, Clone)]
pub struct LoopOptions {
    /// Tool-dispatch rounds allowed before the turn fails
    pub max_tool_rounds: usize,
    pub chat: ChatOptions,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            chat: ChatOptions::default(),
        }
    }
}

impl LoopOptions {
    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }
}

/// Where the loop is
#[derive(Debug)]
pub enum LoopState {
    AwaitingModel,
    DispatchingTools(Vec<ToolRequest>),
    Done(String),
    Error(TurnError),
}

/// Decode a tool call's argument payload
///
/// Empty text and `null` mean no arguments; anything but an object is
/// rejected.
pub fn parse_arguments(raw: &str) -> Option<Map<String, Value>> {
    if raw.trim().is_empty() {
        return Some(Map::new());
    }
    match serde_json::from_str::<Value>(raw).ok()? {
        Value::Object(map) => Some(map),
        Value::Null => Some(Map::new()),
        _ => None,
    }
}

/// Runs turns against one provider and model
#[derive(Clone)]
pub struct ToolLoop {
    provider: Arc<dyn Provider>,
    model: ProviderModelConfig,
    options: LoopOptions,
    logger: Arc<dyn Logger>,
}

impl ToolLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: ProviderModelConfig,
        options: LoopOptions,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            provider,
            model,
            options,
            logger,
        }
    }

    pub fn options(&self) -> &LoopOptions {
        &self.options
    }

    /// Run one turn to a final answer
    ///
    /// On any fatal outcome the conversation is rolled back to where it was
    /// before `text` was appended, so a retry starts clean.
    pub async fn run_turn(
        &self,
        conversation: &mut Conversation,
        catalog: &ToolCatalog,
        pool: &BackendPool,
        text: &str,
    ) -> TurnResult<String> {
        let checkpoint = conversation.checkpoint();
        conversation.append(ConversationMessage::user(text));

        let result = self.drive(conversation, catalog, pool).await;
        if let Err(e) = &result {
            self.logger
                .warn(&format!("[ToolLoop] Turn failed, rolling back: {}", e));
            conversation.rollback(checkpoint);
        }
        result
    }

    async fn drive(
        &self,
        conversation: &mut Conversation,
        catalog: &ToolCatalog,
        pool: &BackendPool,
    ) -> TurnResult<String> {
        let mut rounds = 0;
        let mut state = LoopState::AwaitingModel;

        loop {
            state = match state {
                LoopState::AwaitingModel => self.ask_model(conversation, catalog).await,
                LoopState::DispatchingTools(calls) => {
                    if rounds >= self.options.max_tool_rounds {
                        LoopState::Error(TurnError::LoopLimitExceeded {
                            limit: self.options.max_tool_rounds,
                        })
                    } else {
                        rounds += 1;
                        for call in &calls {
                            let outcome = self.dispatch(call, catalog, pool).await;
                            conversation.append(ConversationMessage::tool(call, outcome));
                        }
                        LoopState::AwaitingModel
                    }
                }
                LoopState::Done(text) => return Ok(text),
                LoopState::Error(e) => return Err(e),
            };
        }
    }

    async fn ask_model(&self, conversation: &mut Conversation, catalog: &ToolCatalog) -> LoopState {
        self.logger.debug(&format!(
            "[ToolLoop] LLM request: {} messages, {} tools",
            conversation.len(),
            catalog.len()
        ));

        let response = match self
            .provider
            .chat(
                conversation.snapshot(),
                catalog.entries(),
                &self.model,
                &self.options.chat,
            )
            .await
        {
            Ok(response) => response,
            Err(e) => return LoopState::Error(e.into()),
        };

        match response.into_reply() {
            Some(AssistantReply::FinalText { text }) => {
                conversation.append(ConversationMessage::assistant(AssistantReply::FinalText {
                    text: text.clone(),
                }));
                LoopState::Done(text)
            }
            Some(AssistantReply::ToolRequests { calls }) => {
                self.logger.info(&format!(
                    "[ToolLoop] Model requested {} tool call(s)",
                    calls.len()
                ));
                conversation.append(ConversationMessage::assistant(AssistantReply::ToolRequests {
                    calls: calls.clone(),
                }));
                LoopState::DispatchingTools(calls)
            }
            None => LoopState::Error(TurnError::MalformedReply),
        }
    }

    /// Execute one tool call; every failure becomes a tool error outcome
    async fn dispatch(&self, call: &ToolRequest, catalog: &ToolCatalog, pool: &BackendPool) -> ToolOutcome {
        let Some(arguments) = parse_arguments(&call.arguments) else {
            self.logger.warn(&format!(
                "[ToolLoop] Invalid arguments for {}: {}",
                call.name, call.arguments
            ));
            return ToolOutcome::error(ToolFailureKind::InvalidArguments, "Invalid arguments JSON")
                .with_details(call.arguments.clone());
        };

        let Some(route) = catalog.resolve(&call.name) else {
            self.logger
                .warn(&format!("[ToolLoop] Unknown tool requested: {}", call.name));
            return ToolOutcome::error(
                ToolFailureKind::UnknownTool,
                format!("Tool '{}' is not mapped to any connected server", call.name),
            );
        };

        let Some(backend) = pool.get(&route.backend_id) else {
            return ToolOutcome::error(
                ToolFailureKind::BackendUnavailable,
                format!(
                    "Server '{}' for tool '{}' is not connected",
                    route.backend_id, call.name
                ),
            );
        };

        self.logger.info(&format!(
            "[ToolLoop] Calling {} on '{}'",
            route.tool_name, route.backend_id
        ));
        match backend.call_tool(&route.tool_name, arguments).await {
            Ok(contents) => ToolOutcome::success(ToolContent::render(&contents)),
            Err(e) => {
                self.logger
                    .warn(&format!("[ToolLoop] Tool {} failed: {}", call.name, e));
                ToolOutcome::error(
                    ToolFailureKind::ExecutionFailed,
                    format!("Tool execution failed: {}", e),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::mcp::{MockBackend, MockConnector};
    use crate::providers::{MockProvider, MockReply};
    use crate::types::{BackendDescriptor, MessageRole, ToolDescriptor};
    use serde_json::json;

    struct Fixture {
        pool: BackendPool,
        catalog: ToolCatalog,
        weather: MockBackend,
    }

    async fn fixture() -> Fixture {
        let logger = NoOpLogger::shared();
        let weather = MockBackend::new()
            .with_tool(ToolDescriptor::new("get_weather"))
            .with_result("get_weather", "22C")
            .with_tool(ToolDescriptor::new("explode"))
            .with_failure("explode", "backend crashed");
        let connector = MockConnector::new().with_backend("A", weather.clone());
        let backends = vec![BackendDescriptor::new("A", "Weather", "http://a/mcp")];

        let mut pool = BackendPool::new(logger.clone());
        pool.connect_all(&connector, &backends).await;
        let catalog = ToolCatalog::aggregate(&pool, &backends, &logger).await;
        Fixture {
            pool,
            catalog,
            weather,
        }
    }

    fn tool_loop(provider: Arc<MockProvider>, options: LoopOptions) -> ToolLoop {
        ToolLoop::new(
            provider,
            ProviderModelConfig::new("mock"),
            options,
            NoOpLogger::shared(),
        )
    }

    fn calls(list: &[(&str, &str, &str)]) -> MockReply {
        MockReply::ToolCalls(
            list.iter()
                .map(|(id, name, args)| ToolRequest::new(*id, *name, *args))
                .collect(),
        )
    }

    fn tool_payload(message: &ConversationMessage) -> Value {
        match message {
            ConversationMessage::Tool { outcome, .. } => {
                serde_json::from_str(&outcome.payload()).unwrap()
            }
            other => panic!("expected tool message, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(parse_arguments(""), Some(Map::new()));
        assert_eq!(parse_arguments("null"), Some(Map::new()));
        assert_eq!(
            parse_arguments(r#"{"city":"Oslo"}"#).unwrap()["city"],
            json!("Oslo")
        );
        assert_eq!(parse_arguments("[1,2]"), None);
        assert_eq!(parse_arguments("{broken"), None);
    }

    #[tokio::test]
    async fn test_plain_answer() {
        let f = fixture().await;
        let provider = Arc::new(MockProvider::fixed("hi there", NoOpLogger::shared()));
        let engine = tool_loop(provider, LoopOptions::default());
        let mut conversation = Conversation::new();

        let answer = engine
            .run_turn(&mut conversation, &f.catalog, &f.pool, "hello")
            .await
            .unwrap();

        assert_eq!(answer, "hi there");
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.snapshot()[0].role(), MessageRole::User);
        assert_eq!(conversation.snapshot()[1].text(), Some("hi there"));
    }

    #[tokio::test]
    async fn test_weather_round_trip() {
        let f = fixture().await;
        let provider = Arc::new(MockProvider::scripted(
            vec![
                calls(&[("call_1", "A__get_weather", r#"{"city":"Oslo"}"#)]),
                MockReply::Text("It is 22C".to_string()),
            ],
            NoOpLogger::shared(),
        ));
        let engine = tool_loop(provider.clone(), LoopOptions::default());
        let mut conversation = Conversation::new();

        let answer = engine
            .run_turn(&mut conversation, &f.catalog, &f.pool, "what's the weather")
            .await
            .unwrap();

        assert_eq!(answer, "It is 22C");
        assert_eq!(conversation.len(), 4);
        assert_eq!(tool_payload(&conversation.snapshot()[2]), json!({"result": "22C"}));

        let backend_calls = f.weather.calls();
        assert_eq!(backend_calls.len(), 1);
        assert_eq!(backend_calls[0].tool, "get_weather");
        assert_eq!(backend_calls[0].arguments["city"], json!("Oslo"));

        // The second request saw the tool result
        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(
            requests[0].tool_names,
            vec!["A__get_weather".to_string(), "A__explode".to_string()]
        );
    }

    #[tokio::test]
    async fn test_results_appended_in_call_order() {
        let f = fixture().await;
        let provider = Arc::new(MockProvider::scripted(
            vec![
                calls(&[
                    ("c1", "A__get_weather", "{}"),
                    ("c2", "B__search", "{}"),
                    ("c3", "A__get_weather", "not json"),
                    ("c4", "A__explode", ""),
                ]),
                MockReply::Text("done".to_string()),
            ],
            NoOpLogger::shared(),
        ));
        let engine = tool_loop(provider, LoopOptions::default());
        let mut conversation = Conversation::new();

        engine
            .run_turn(&mut conversation, &f.catalog, &f.pool, "go")
            .await
            .unwrap();

        let tool_messages: Vec<&ConversationMessage> = conversation
            .snapshot()
            .iter()
            .filter(|m| m.role() == MessageRole::Tool)
            .collect();
        let ids: Vec<&str> = tool_messages
            .iter()
            .map(|m| match m {
                ConversationMessage::Tool { call_id, .. } => call_id.as_str(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(ids, vec!["c1", "c2", "c3", "c4"]);

        assert_eq!(tool_payload(tool_messages[0])["result"], "22C");

        let unknown = tool_payload(tool_messages[1]);
        assert_eq!(unknown["kind"], "unknown_tool");
        assert!(unknown["error"].as_str().unwrap().contains("B__search"));

        let invalid = tool_payload(tool_messages[2]);
        assert_eq!(invalid["kind"], "invalid_arguments");
        assert_eq!(invalid["details"], "not json");

        assert_eq!(tool_payload(tool_messages[3])["kind"], "execution_failed");

        // Only the well-formed, routable calls reached the backend
        assert_eq!(f.weather.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_unconnected_backend_reports_unavailable() {
        let logger = NoOpLogger::shared();
        let pool = BackendPool::new(logger.clone());
        let mut catalog = ToolCatalog::new();
        catalog.add(
            &BackendDescriptor::new("gone", "", "http://gone/mcp"),
            ToolDescriptor::new("ping"),
            &logger,
        );
        let provider = Arc::new(MockProvider::scripted(
            vec![
                calls(&[("c1", "gone__ping", "{}")]),
                MockReply::Text("sorry".to_string()),
            ],
            logger.clone(),
        ));
        let engine = tool_loop(provider, LoopOptions::default());
        let mut conversation = Conversation::new();

        engine
            .run_turn(&mut conversation, &catalog, &pool, "ping")
            .await
            .unwrap();

        assert_eq!(
            tool_payload(&conversation.snapshot()[2])["kind"],
            "backend_unavailable"
        );
    }

    #[tokio::test]
    async fn test_transport_failure_rolls_back() {
        let f = fixture().await;
        let provider = Arc::new(MockProvider::scripted(
            vec![
                MockReply::Text("first answer".to_string()),
                calls(&[("c1", "A__get_weather", "{}")]),
                MockReply::Fail("network down".to_string()),
            ],
            NoOpLogger::shared(),
        ));
        let engine = tool_loop(provider, LoopOptions::default());
        let mut conversation = Conversation::new();

        engine
            .run_turn(&mut conversation, &f.catalog, &f.pool, "one")
            .await
            .unwrap();
        let err = engine
            .run_turn(&mut conversation, &f.catalog, &f.pool, "two")
            .await
            .unwrap_err();

        assert!(matches!(err, TurnError::Transport(_)));
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.last().and_then(|m| m.text()), Some("first answer"));
    }

    #[tokio::test]
    async fn test_malformed_reply_is_not_appended() {
        let f = fixture().await;
        let provider = Arc::new(MockProvider::new(
            crate::providers::MockMode::Repeat(MockReply::Empty),
            NoOpLogger::shared(),
        ));
        let engine = tool_loop(provider.clone(), LoopOptions::default());
        let mut conversation = Conversation::new();

        let err = engine
            .run_turn(&mut conversation, &f.catalog, &f.pool, "hello")
            .await
            .unwrap_err();

        assert!(matches!(err, TurnError::MalformedReply));
        assert!(conversation.is_empty());
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_loop_limit() {
        let f = fixture().await;
        let provider = Arc::new(MockProvider::new(
            crate::providers::MockMode::Repeat(calls(&[("c", "A__get_weather", "{}")])),
            NoOpLogger::shared(),
        ));
        let engine = tool_loop(provider.clone(), LoopOptions::default().with_max_tool_rounds(2));
        let mut conversation = Conversation::new();

        let err = engine
            .run_turn(&mut conversation, &f.catalog, &f.pool, "loop forever")
            .await
            .unwrap_err();

        assert!(matches!(err, TurnError::LoopLimitExceeded { limit: 2 }));
        assert_eq!(provider.call_count(), 3);
        assert_eq!(f.weather.calls().len(), 2);
        assert!(conversation.is_empty());
    }

    #[tokio::test]
    async fn test_empty_catalog_sends_no_tools() {
        let logger = NoOpLogger::shared();
        let pool = BackendPool::new(logger.clone());
        let catalog = ToolCatalog::new();
        let provider = Arc::new(MockProvider::echo(logger));
        let engine = tool_loop(provider.clone(), LoopOptions::default());
        let mut conversation = Conversation::new();

        let answer = engine
            .run_turn(&mut conversation, &catalog, &pool, "hi")
            .await
            .unwrap();

        assert_eq!(answer, "Echo: hi");
        assert!(provider.requests()[0].tool_names.is_empty());
    }
}
