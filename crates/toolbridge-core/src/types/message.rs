//! Conversation message types

use serde::{Deserialize, Serialize};

use super::tool::{ToolOutcome, ToolRequest};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

/// A well-formed assistant reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssistantReply {
    /// Final answer for the turn
    FinalText { text: String },
    /// One or more tool calls to dispatch before asking the model again
    ToolRequests { calls: Vec<ToolRequest> },
}

/// A raw reply as returned by a provider, before classification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelResponse {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolRequest>,
}

impl ModelResponse {
    /// A reply carrying only text
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    /// A reply carrying tool calls
    pub fn tool_calls(calls: Vec<ToolRequest>) -> Self {
        Self {
            text: None,
            tool_calls: calls,
        }
    }

    /// Classify the reply; `None` if it carries neither tool calls nor text
    ///
    /// Tool calls take precedence over any accompanying text.
    pub fn into_reply(self) -> Option<AssistantReply> {
        if !self.tool_calls.is_empty() {
            return Some(AssistantReply::ToolRequests {
                calls: self.tool_calls,
            });
        }
        match self.text {
            Some(text) if !text.is_empty() => Some(AssistantReply::FinalText { text }),
            _ => None,
        }
    }
}

/// One entry of the conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ConversationMessage {
    User {
        content: String,
    },
    Assistant {
        reply: AssistantReply,
    },
    Tool {
        /// ID of the tool call this message answers
        #[serde(rename = "tool_call_id")]
        call_id: String,
        /// Catalog name of the called tool
        name: String,
        outcome: ToolOutcome,
    },
}

impl ConversationMessage {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        ConversationMessage::User {
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(reply: AssistantReply) -> Self {
        ConversationMessage::Assistant { reply }
    }

    /// Create a tool result message answering `call`
    pub fn tool(call: &ToolRequest, outcome: ToolOutcome) -> Self {
        ConversationMessage::Tool {
            call_id: call.id.clone(),
            name: call.name.clone(),
            outcome,
        }
    }

    pub fn role(&self) -> MessageRole {
        match self {
            ConversationMessage::User { .. } => MessageRole::User,
            ConversationMessage::Assistant { .. } => MessageRole::Assistant,
            ConversationMessage::Tool { .. } => MessageRole::Tool,
        }
    }

    /// Get the text content for user messages and final assistant replies
    pub fn text(&self) -> Option<&str> {
        match self {
            ConversationMessage::User { content } => Some(content),
            ConversationMessage::Assistant {
                reply: AssistantReply::FinalText { text },
            } => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_roles() {
        let user = ConversationMessage::user("Hello");
        assert_eq!(user.role(), MessageRole::User);
        assert_eq!(user.text(), Some("Hello"));

        let asst = ConversationMessage::assistant(AssistantReply::FinalText {
            text: "Hi there!".to_string(),
        });
        assert_eq!(asst.role(), MessageRole::Assistant);
        assert_eq!(asst.text(), Some("Hi there!"));

        let call = ToolRequest::new("call_1", "a__search", "{}");
        let tool = ConversationMessage::tool(&call, ToolOutcome::success("found"));
        assert_eq!(tool.role(), MessageRole::Tool);
        assert_eq!(tool.text(), None);
    }

    #[test]
    fn test_tool_calls_take_precedence() {
        let response = ModelResponse {
            text: Some("let me check".to_string()),
            tool_calls: vec![ToolRequest::new("call_1", "a__search", "{}")],
        };
        assert!(matches!(
            response.into_reply(),
            Some(AssistantReply::ToolRequests { calls }) if calls.len() == 1
        ));
    }

    #[test]
    fn test_empty_response_is_malformed() {
        assert_eq!(ModelResponse::default().into_reply(), None);
        assert_eq!(ModelResponse::text("").into_reply(), None);
    }

    #[test]
    fn test_message_serialization() {
        let msg = ConversationMessage::user("Hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("\"content\":\"Hello\""));

        let call = ToolRequest::new("call_9", "b__lookup", "{}");
        let json = serde_json::to_string(&ConversationMessage::tool(&call, ToolOutcome::success("x"))).unwrap();
        assert!(json.contains("\"tool_call_id\":\"call_9\""));
    }
}
