//! Front-end events and the notifications sent back

use serde::{Deserialize, Serialize};

use crate::types::BackendDescriptor;

/// An inbound event from one session's front end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    Connect,
    Disconnect,
    RequestServerList,
    Initialize {
        #[serde(default)]
        selected_server_ids: Vec<String>,
    },
    SendMessage {
        #[serde(default)]
        message: String,
    },
    ResetConversation,
}

/// An outbound notification to one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notification {
    Status {
        message: String,
    },
    Error {
        message: String,
    },
    AvailableServers {
        servers: Vec<BackendDescriptor>,
    },
    McpInitialized {
        message: String,
        tools_available: bool,
        connected_servers: usize,
        total_tools: usize,
    },
    NewMessage {
        sender: String,
        text: String,
    },
    ConversationReset,
}

impl Notification {
    pub fn status(message: impl Into<String>) -> Self {
        Notification::Status {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notification::Error {
            message: message.into(),
        }
    }

    /// Event name as seen by the front end
    pub fn name(&self) -> &'static str {
        match self {
            Notification::Status { .. } => "status",
            Notification::Error { .. } => "error",
            Notification::AvailableServers { .. } => "available_servers",
            Notification::McpInitialized { .. } => "mcp_initialized",
            Notification::NewMessage { .. } => "new_message",
            Notification::ConversationReset => "conversation_reset",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"event":"initialize","selected_server_ids":["a","b"]}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::Initialize {
                selected_server_ids: vec!["a".to_string(), "b".to_string()]
            }
        );

        let event: ClientEvent = serde_json::from_str(r#"{"event":"send_message"}"#).unwrap();
        assert_eq!(event, ClientEvent::SendMessage { message: String::new() });
    }

    #[test]
    fn test_notification_name_matches_tag() {
        let notification = Notification::NewMessage {
            sender: "bot".to_string(),
            text: "hi".to_string(),
        };
        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["event"], notification.name());
        assert_eq!(
            serde_json::to_value(Notification::ConversationReset).unwrap()["event"],
            "conversation_reset"
        );
    }
}
