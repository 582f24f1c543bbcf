//! MCP (Model Context Protocol) backends
//!
//! Uses the official rmcp SDK to connect to tool servers over Streamable HTTP
//! or Unix sockets. The session-facing pieces are the [`ToolBackend`] and
//! [`BackendConnector`] traits and the per-session [`BackendPool`].
//!
//! # Example
//!
//! ```rust,ignore
//! use toolbridge_core::mcp::{BackendPool, McpConnector};
//!
//! let connector = McpConnector::new(logger.clone());
//! let mut pool = BackendPool::new(logger);
//! let failures = pool.connect_all(&connector, &selected).await;
//! let tools = pool.get("weather").unwrap().list_tools().await?;
//! pool.close_all().await;
//! ```

mod client;
mod connector;
mod error;
mod mock;
mod pool;
mod traits;

pub use client::{contents_from_result, descriptor_from_tool, McpClient};
pub use connector::{BackendAddress, McpConnector, DEFAULT_CONNECT_TIMEOUT};
pub use error::{McpError, McpResult};
pub use mock::{MockBackend, MockConnector, RecordedCall};
pub use pool::{BackendPool, ConnectFailure, DEFAULT_CLOSE_TIMEOUT};
pub use traits::{BackendConnector, ToolBackend, ToolContent, EMPTY_RESULT_TEXT};
