//! Tool/function calling types

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A tool as advertised by one backend's manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Backend-native tool name
    pub name: String,
    /// Human description, if the backend supplied one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the input parameters, if any
    #[serde(rename = "inputSchema", default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

impl ToolDescriptor {
    /// Create a new tool descriptor
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the input schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }
}

/// LLM-facing tool definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Catalog name (`{backend_id}__{tool_name}`)
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// Normalized parameter schema
    pub parameters: Value,
}

/// Tool call requested by the LLM
///
/// `arguments` is the encoded argument payload exactly as the model produced
/// it; it is only decoded at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Unique identifier for this tool call
    pub id: String,
    /// Catalog name of the tool being called
    pub name: String,
    /// Encoded argument payload
    pub arguments: String,
}

impl ToolRequest {
    /// Create a new tool request
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// Why a tool call produced no result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolFailureKind {
    /// The argument payload did not decode to an object
    InvalidArguments,
    /// The catalog name does not map to any backend
    UnknownTool,
    /// The owning backend has no live connection
    BackendUnavailable,
    /// The backend raised or flagged an error
    ExecutionFailed,
}

/// Structured reason for a failed tool call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFailure {
    pub kind: ToolFailureKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Outcome of a tool call, fed back to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success { text: String },
    Error(ToolFailure),
}

impl ToolOutcome {
    /// Create a successful outcome
    pub fn success(text: impl Into<String>) -> Self {
        ToolOutcome::Success { text: text.into() }
    }

    /// Create a failed outcome
    pub fn error(kind: ToolFailureKind, message: impl Into<String>) -> Self {
        ToolOutcome::Error(ToolFailure {
            kind,
            message: message.into(),
            details: None,
        })
    }

    /// Attach details to a failed outcome; no-op on success
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        if let ToolOutcome::Error(ref mut failure) = self {
            failure.details = Some(details.into());
        }
        self
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolOutcome::Error(_))
    }

    /// Encoded payload sent to the model as the tool message content
    pub fn payload(&self) -> String {
        let value = match self {
            ToolOutcome::Success { text } => json!({ "result": text }),
            ToolOutcome::Error(failure) => {
                let mut value = json!({
                    "error": failure.message,
                    "kind": failure.kind,
                });
                if let Some(details) = &failure.details {
                    value["details"] = Value::String(details.clone());
                }
                value
            }
        };
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_builder() {
        let tool = ToolDescriptor::new("get_weather")
            .with_description("Get the current weather")
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "location": { "type": "string" }
                },
                "required": ["location"]
            }));

        assert_eq!(tool.name, "get_weather");
        assert_eq!(tool.description.as_deref(), Some("Get the current weather"));
        assert!(tool.input_schema.is_some());
    }

    #[test]
    fn test_success_payload() {
        let outcome = ToolOutcome::success("22C");
        assert!(!outcome.is_error());

        let payload: Value = serde_json::from_str(&outcome.payload()).unwrap();
        assert_eq!(payload, json!({ "result": "22C" }));
    }

    #[test]
    fn test_error_payload() {
        let outcome = ToolOutcome::error(ToolFailureKind::InvalidArguments, "Invalid arguments JSON")
            .with_details("{not json");
        assert!(outcome.is_error());

        let payload: Value = serde_json::from_str(&outcome.payload()).unwrap();
        assert_eq!(payload["error"], "Invalid arguments JSON");
        assert_eq!(payload["kind"], "invalid_arguments");
        assert_eq!(payload["details"], "{not json");
    }

    #[test]
    fn test_details_ignored_on_success() {
        let outcome = ToolOutcome::success("ok").with_details("unused");
        assert_eq!(outcome, ToolOutcome::success("ok"));
    }
}
