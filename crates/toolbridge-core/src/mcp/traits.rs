//! Backend abstractions
//!
//! `ToolBackend` is one live connection; `BackendConnector` opens them. The
//! pool and the tool loop only see these traits, so tests swap in
//! [`MockConnector`](super::MockConnector).

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::types::{BackendDescriptor, ToolDescriptor};

use super::error::McpResult;

/// Text used when a call returns no content at all
pub const EMPTY_RESULT_TEXT: &str = "The tool returned no content.";

/// One content item of a tool result
#[derive(Debug, Clone, PartialEq)]
pub enum ToolContent {
    /// Plain text
    Text(String),
    /// Anything else (images, resources, ...), kept in encoded form
    Opaque(Value),
}

impl ToolContent {
    /// Text form of this item; opaque items are stringified
    pub fn as_text(&self) -> String {
        match self {
            ToolContent::Text(text) => text.clone(),
            ToolContent::Opaque(value) => value.to_string(),
        }
    }

    /// Flatten a result into the text handed back to the model
    pub fn render(contents: &[ToolContent]) -> String {
        if contents.is_empty() {
            return EMPTY_RESULT_TEXT.to_string();
        }
        contents
            .iter()
            .map(ToolContent::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A live connection to one tool backend
#[async_trait]
pub trait ToolBackend: Send + Sync {
    /// Fetch the backend's tool manifest
    async fn list_tools(&self) -> McpResult<Vec<ToolDescriptor>>;

    /// Invoke a tool by its backend-native name
    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> McpResult<Vec<ToolContent>>;

    /// Release the connection
    async fn close(self: Box<Self>) -> McpResult<()>;
}

/// Opens backend connections from descriptors
#[async_trait]
pub trait BackendConnector: Send + Sync {
    async fn connect(&self, descriptor: &BackendDescriptor) -> McpResult<Box<dyn ToolBackend>>;
}
