//! Adapter between toolbridge types and genai types
//!
//! Conversation history, catalog entries and options are converted into
//! genai's request types; genai's one-shot chat response is converted back
//! into a [`ModelResponse`] for the tool loop to classify.

use std::future::Future;
use std::pin::Pin;

use genai::chat::{
    ChatMessage as GenaiMessage, ChatOptions as GenaiOptions, ChatRequest, ChatResponse,
    Tool as GenaiTool, ToolCall as GenaiToolCall, ToolResponse as GenaiToolResponse,
};
use genai::resolver::{AuthData, AuthResolver, Endpoint, ServiceTargetResolver};
use genai::{adapter::AdapterKind, Client, ModelIden, ServiceTarget};
use serde_json::{json, Value};

use crate::types::{
    AssistantReply, CatalogEntry, ConversationMessage, ModelResponse, ToolRequest,
};

use super::error::{ProviderError, ProviderResult};
use super::traits::{ChatOptions, ProviderModelConfig};

// ============================================================================
// Message Conversion: toolbridge -> genai
// ============================================================================

/// Convert one outgoing tool request into genai's tool call
///
/// The model's raw argument text is sent back as parsed JSON when it parses,
/// and as a JSON string otherwise, so the model sees what it produced.
pub fn to_genai_tool_call(request: &ToolRequest) -> ProviderResult<GenaiToolCall> {
    let arguments = serde_json::from_str::<Value>(&request.arguments)
        .unwrap_or_else(|_| Value::String(request.arguments.clone()));

    let call = serde_json::from_value(json!({
        "call_id": request.id,
        "fn_name": request.name,
        "fn_arguments": arguments,
    }))?;
    Ok(call)
}

/// Convert one history entry into a genai message
pub fn to_genai_message(msg: &ConversationMessage) -> ProviderResult<GenaiMessage> {
    let converted = match msg {
        ConversationMessage::User { content } => GenaiMessage::user(content.clone()),
        ConversationMessage::Assistant {
            reply: AssistantReply::FinalText { text },
        } => GenaiMessage::assistant(text.clone()),
        ConversationMessage::Assistant {
            reply: AssistantReply::ToolRequests { calls },
        } => {
            let calls = calls
                .iter()
                .map(to_genai_tool_call)
                .collect::<ProviderResult<Vec<_>>>()?;
            GenaiMessage::from(calls)
        }
        ConversationMessage::Tool {
            call_id, outcome, ..
        } => GenaiMessage::from(GenaiToolResponse::new(call_id.clone(), outcome.payload())),
    };
    Ok(converted)
}

/// Convert the full history
pub fn to_genai_messages(messages: &[ConversationMessage]) -> ProviderResult<Vec<GenaiMessage>> {
    messages.iter().map(to_genai_message).collect()
}

/// Build the request for one model round
///
/// With an empty catalog the request carries no tools at all. Otherwise the
/// tools go out without a tool-choice override, leaving the model to decide.
pub fn build_chat_request(
    messages: &[ConversationMessage],
    tools: &[CatalogEntry],
) -> ProviderResult<ChatRequest> {
    let request = ChatRequest::new(to_genai_messages(messages)?);
    if tools.is_empty() {
        return Ok(request);
    }
    Ok(request.with_tools(to_genai_tools(tools)))
}

// ============================================================================
// Tool Conversion: toolbridge -> genai
// ============================================================================

/// Convert a catalog entry to a genai tool
pub fn to_genai_tool(entry: &CatalogEntry) -> GenaiTool {
    GenaiTool::new(entry.name.clone())
        .with_description(entry.description.clone())
        .with_schema(entry.parameters.clone())
}

/// Convert the catalog to genai tools
pub fn to_genai_tools(entries: &[CatalogEntry]) -> Vec<GenaiTool> {
    entries.iter().map(to_genai_tool).collect()
}

// ============================================================================
// Options Conversion: toolbridge -> genai
// ============================================================================

/// Convert chat options to genai options
pub fn to_genai_options(options: &ChatOptions) -> GenaiOptions {
    let mut genai_opts = GenaiOptions::default();

    if let Some(temp) = options.temperature {
        genai_opts = genai_opts.with_temperature(temp as f64);
    }

    if let Some(max_tokens) = options.max_tokens {
        genai_opts = genai_opts.with_max_tokens(max_tokens);
    }

    genai_opts
}

// ============================================================================
// Response Conversion: genai -> toolbridge
// ============================================================================

/// Convert a genai tool call into a tool request
///
/// Arguments are kept in encoded form; string payloads are passed through
/// untouched so malformed JSON survives until dispatch.
pub fn from_genai_tool_call(tc: &GenaiToolCall) -> ToolRequest {
    let arguments = match &tc.fn_arguments {
        Value::String(raw) => raw.clone(),
        other => other.to_string(),
    };
    ToolRequest::new(tc.call_id.clone(), tc.fn_name.clone(), arguments)
}

/// Convert a genai chat response into a raw model response
pub fn from_genai_response(response: &ChatResponse) -> ModelResponse {
    ModelResponse {
        text: response.first_text().map(|s| s.to_string()),
        tool_calls: response
            .tool_calls()
            .into_iter()
            .map(from_genai_tool_call)
            .collect(),
    }
}

// ============================================================================
// Client Creation
// ============================================================================

/// Provider configuration for routing
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider identifier (e.g., "openai", "openrouter")
    pub provider: String,
    /// API key for authentication
    pub api_key: Option<String>,
    /// Custom API base URL
    pub api_base: Option<String>,
}

impl ProviderConfig {
    pub fn new(provider: impl Into<String>, model: &ProviderModelConfig) -> Self {
        Self {
            provider: provider.into(),
            api_key: model.api_key.clone(),
            api_base: model.api_base.clone(),
        }
    }
}

/// Create a genai Client with explicit auth and endpoint resolution
///
/// The key is resolved by the caller (see `secrets`); when none is given,
/// genai's own lookup is left to decide, which suits keyless local servers.
pub fn create_client(config: &ProviderConfig) -> Client {
    let explicit_key = config.api_key.clone();

    let auth_resolver = AuthResolver::from_resolver_async_fn(
        move |_model_iden: ModelIden| -> Pin<Box<dyn Future<Output = genai::resolver::Result<Option<AuthData>>> + Send>> {
            let key = explicit_key.clone();
            Box::pin(async move { Ok(key.map(AuthData::from_single)) })
        },
    );

    let target_provider = config.provider.to_lowercase();
    let target_api_base = config.api_base.clone();

    let target_resolver = ServiceTargetResolver::from_resolver_fn(
        move |target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
            let ServiceTarget { ref model, .. } = target;

            let (endpoint, adapter_kind) = match target_provider.as_str() {
                "openrouter" => (
                    Endpoint::from_static("https://openrouter.ai/api/v1/"),
                    AdapterKind::OpenAI,
                ),
                "mistral" => (
                    Endpoint::from_static("https://api.mistral.ai/v1/"),
                    AdapterKind::OpenAI,
                ),
                _ => match &target_api_base {
                    // Custom base: keep the model's adapter, swap the endpoint
                    Some(base) => (Endpoint::from_owned(base.clone()), model.adapter_kind),
                    None => return Ok(target),
                },
            };

            let endpoint = match &target_api_base {
                Some(base) => Endpoint::from_owned(base.clone()),
                None => endpoint,
            };
            let resolved_model = ModelIden::new(adapter_kind, model.model_name.clone());

            Ok(ServiceTarget {
                endpoint,
                auth: target.auth,
                model: resolved_model,
            })
        },
    );

    Client::builder()
        .with_auth_resolver(auth_resolver)
        .with_service_target_resolver(target_resolver)
        .build()
}

/// Check if a provider is natively supported by genai
pub fn is_genai_native(provider: &str) -> bool {
    matches!(
        provider.to_lowercase().as_str(),
        "openai"
            | "anthropic"
            | "gemini"
            | "ollama"
            | "groq"
            | "xai"
            | "deepseek"
            | "cohere"
            | "fireworks"
            | "together"
    )
}

/// Check if a provider can be handled by genai (native or via OpenAI-compat)
pub fn is_genai_supported(provider: &str) -> bool {
    is_genai_native(provider)
        || matches!(provider.to_lowercase().as_str(), "openrouter" | "mistral")
}

/// Map a genai error onto a provider error
pub(crate) fn map_genai_error(provider: &str, err: genai::Error) -> ProviderError {
    ProviderError::request(provider, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolOutcome;

    #[test]
    fn test_tool_call_arguments_pass_through() {
        let tc: GenaiToolCall = serde_json::from_value(json!({
            "call_id": "call_1",
            "fn_name": "weather__forecast",
            "fn_arguments": {"city": "Oslo"}
        }))
        .unwrap();
        let request = from_genai_tool_call(&tc);
        assert_eq!(request.id, "call_1");
        assert_eq!(request.name, "weather__forecast");
        let args: Value = serde_json::from_str(&request.arguments).unwrap();
        assert_eq!(args, json!({"city": "Oslo"}));
    }

    #[test]
    fn test_string_arguments_stay_raw() {
        let tc: GenaiToolCall = serde_json::from_value(json!({
            "call_id": "call_2",
            "fn_name": "a__b",
            "fn_arguments": "{not json"
        }))
        .unwrap();
        assert_eq!(from_genai_tool_call(&tc).arguments, "{not json");
    }

    #[test]
    fn test_outgoing_malformed_arguments_sent_as_string() {
        let call = to_genai_tool_call(&ToolRequest::new("c", "a__b", "{oops")).unwrap();
        assert_eq!(call.fn_arguments, Value::String("{oops".to_string()));

        let call = to_genai_tool_call(&ToolRequest::new("c", "a__b", r#"{"x":1}"#)).unwrap();
        assert_eq!(call.fn_arguments, json!({"x": 1}));
    }

    #[test]
    fn test_history_conversion() {
        let call = ToolRequest::new("call_1", "a__search", "{}");
        let history = vec![
            ConversationMessage::user("find it"),
            ConversationMessage::assistant(AssistantReply::ToolRequests {
                calls: vec![call.clone()],
            }),
            ConversationMessage::tool(&call, ToolOutcome::success("found")),
            ConversationMessage::assistant(AssistantReply::FinalText {
                text: "done".to_string(),
            }),
        ];
        assert_eq!(to_genai_messages(&history).unwrap().len(), 4);
    }

    #[test]
    fn test_request_carries_tools_only_when_present() {
        let history = vec![ConversationMessage::user("hi")];

        let bare = build_chat_request(&history, &[]).unwrap();
        assert!(bare.tools.is_none());
        assert_eq!(bare.messages.len(), 1);

        let entry = CatalogEntry {
            name: "weather__forecast".to_string(),
            description: "Forecast".to_string(),
            parameters: json!({"type": "object", "properties": {}}),
        };
        let with_tools = build_chat_request(&history, &[entry]).unwrap();
        assert_eq!(with_tools.tools.map(|t| t.len()), Some(1));
    }

    #[test]
    fn test_provider_support() {
        assert!(is_genai_supported("openai"));
        assert!(is_genai_supported("OpenRouter"));
        assert!(!is_genai_native("mistral"));
        assert!(!is_genai_supported("mock"));
    }
}
