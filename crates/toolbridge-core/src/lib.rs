//! Toolbridge Core
//!
//! Session-scoped tool-calling conversations over MCP tool backends.
//! Each session connects to a chosen set of backends, aggregates their tools
//! into one namespaced catalog and runs an LLM/tool loop per user message.
//!
//! ## Layers
//!
//! - `providers`: LLM access (genai-backed, plus a scripted mock)
//! - `mcp`: backend connections, the per-session pool and teardown
//! - `tools`: the `{backend_id}__{tool_name}` catalog and its reverse routes
//! - `engine`: conversation history, the tool loop and the session object
//! - `bridge`: one async worker thread serving synchronous callers
//! - `hub`: front-end events in, notifications out
//!
//! ```rust,ignore
//! use toolbridge_core::{Bridge, SessionHub, ClientEvent, TracingLogger};
//!
//! let bridge = Arc::new(Bridge::start(Arc::new(TracingLogger::new()))?);
//! let hub = SessionHub::builder(bridge, config, provider, notifier).build();
//!
//! hub.handle("sid", ClientEvent::Connect)?;
//! if let Some(ticket) = hub.handle("sid", ClientEvent::SendMessage { message: "hi".into() })? {
//!     ticket.wait()?;
//! }
//! ```

pub mod types;
pub mod secrets;
pub mod logging;
pub mod config;
pub mod providers;
pub mod mcp;
pub mod tools;
pub mod engine;
pub mod bridge;
pub mod hub;

// Re-export commonly used types
pub use types::{
    AssistantReply, BackendDescriptor, CatalogEntry, ConversationMessage, MessageRole,
    ModelResponse, SessionStatus, ToolDescriptor, ToolFailure, ToolFailureKind,
    ToolOutcome, ToolRequest,
};

pub use secrets::{EnvSecretStore, MemorySecretStore, SecretStore};

pub use logging::{Logger, NoOpLogger, SharedLogger, TracingLogger};

pub use config::{ConfigError, ConfigProvider, FileConfigProvider, MemoryConfigProvider};

pub use providers::{create_provider, Provider, ProviderError, ProviderModelConfig};

pub use mcp::{BackendConnector, BackendPool, McpClient, McpConnector, McpError, McpResult, ToolBackend};

pub use tools::ToolCatalog;

pub use engine::{Conversation, InitReport, LoopOptions, Session, ToolLoop, TurnError};

pub use bridge::{Bridge, BridgeError, Ticket};

pub use hub::{ClientEvent, HubError, Notification, Notifier, SessionHub};
