//! In-memory tool backends for tests and demos

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::types::{BackendDescriptor, ToolDescriptor};

use super::error::{McpError, McpResult};
use super::traits::{BackendConnector, ToolBackend, ToolContent};

#[derive(Debug, Clone)]
enum MockResponse {
    Contents(Vec<ToolContent>),
    Fail(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum CloseMode {
    #[default]
    Clean,
    Fail,
    Hang,
}

/// One recorded `call_tool`
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub tool: String,
    pub arguments: Map<String, Value>,
}

/// A scripted backend
///
/// Clones share the call log, so a test can keep a handle after handing the
/// backend to a [`MockConnector`].
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    tools: Vec<ToolDescriptor>,
    responses: HashMap<String, MockResponse>,
    list_error: Option<String>,
    close_mode: CloseMode,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    close_log: Option<(String, Arc<Mutex<Vec<String>>>)>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertise a tool
    pub fn with_tool(mut self, tool: ToolDescriptor) -> Self {
        self.tools.push(tool);
        self
    }

    /// Answer calls to `tool` with one text item
    pub fn with_result(self, tool: &str, text: impl Into<String>) -> Self {
        self.with_contents(tool, vec![ToolContent::Text(text.into())])
    }

    /// Answer calls to `tool` with the given content items
    pub fn with_contents(mut self, tool: &str, contents: Vec<ToolContent>) -> Self {
        self.responses
            .insert(tool.to_string(), MockResponse::Contents(contents));
        self
    }

    /// Fail calls to `tool`
    pub fn with_failure(mut self, tool: &str, message: impl Into<String>) -> Self {
        self.responses
            .insert(tool.to_string(), MockResponse::Fail(message.into()));
        self
    }

    /// Fail `list_tools`
    pub fn failing_list(mut self, message: impl Into<String>) -> Self {
        self.list_error = Some(message.into());
        self
    }

    /// Fail `close`
    pub fn failing_close(mut self) -> Self {
        self.close_mode = CloseMode::Fail;
        self
    }

    /// Never finish `close`
    pub fn hanging_close(mut self) -> Self {
        self.close_mode = CloseMode::Hang;
        self
    }

    /// Calls received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    fn record_close(&self) {
        if let Some((id, log)) = &self.close_log {
            log.lock().push(id.clone());
        }
    }
}

#[async_trait]
impl ToolBackend for MockBackend {
    async fn list_tools(&self) -> McpResult<Vec<ToolDescriptor>> {
        match &self.list_error {
            Some(message) => Err(McpError::Protocol(message.clone())),
            None => Ok(self.tools.clone()),
        }
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> McpResult<Vec<ToolContent>> {
        self.calls.lock().push(RecordedCall {
            tool: name.to_string(),
            arguments,
        });
        match self.responses.get(name) {
            Some(MockResponse::Contents(contents)) => Ok(contents.clone()),
            Some(MockResponse::Fail(message)) => Err(McpError::ToolCallFailed(message.clone())),
            None => Err(McpError::ToolCallFailed(format!("Unknown tool: {}", name))),
        }
    }

    async fn close(self: Box<Self>) -> McpResult<()> {
        match self.close_mode {
            CloseMode::Clean => {
                self.record_close();
                Ok(())
            }
            CloseMode::Fail => {
                self.record_close();
                Err(McpError::Protocol("connection already torn down".to_string()))
            }
            CloseMode::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                self.record_close();
                Ok(())
            }
        }
    }
}

/// Hands out [`MockBackend`]s by backend id
///
/// Ids without a registered backend, or marked failing, fail to connect.
#[derive(Debug, Default)]
pub struct MockConnector {
    backends: HashMap<String, MockBackend>,
    failing: HashSet<String>,
    attempts: Mutex<Vec<String>>,
    closed: Arc<Mutex<Vec<String>>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(mut self, id: impl Into<String>, backend: MockBackend) -> Self {
        self.backends.insert(id.into(), backend);
        self
    }

    /// Make connecting to `id` fail
    pub fn failing(mut self, id: impl Into<String>) -> Self {
        self.failing.insert(id.into());
        self
    }

    /// Backend ids passed to `connect`, in order
    pub fn connect_attempts(&self) -> Vec<String> {
        self.attempts.lock().clone()
    }

    /// Backend ids whose connection was closed
    pub fn closed_ids(&self) -> Vec<String> {
        self.closed.lock().clone()
    }

    pub fn closed_count(&self) -> usize {
        self.closed.lock().len()
    }
}

#[async_trait]
impl BackendConnector for MockConnector {
    async fn connect(&self, descriptor: &BackendDescriptor) -> McpResult<Box<dyn ToolBackend>> {
        self.attempts.lock().push(descriptor.id.clone());

        if self.failing.contains(&descriptor.id) {
            return Err(McpError::ConnectionFailed(format!(
                "connection refused: {}",
                descriptor.url
            )));
        }
        let mut backend = self
            .backends
            .get(&descriptor.id)
            .cloned()
            .ok_or_else(|| McpError::ConnectionFailed(format!("no backend at {}", descriptor.url)))?;
        backend.close_log = Some((descriptor.id.clone(), Arc::clone(&self.closed)));
        Ok(Box::new(backend))
    }
}
