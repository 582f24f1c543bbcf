//! MCP error types

use thiserror::Error;

/// Errors from a tool backend connection
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Unsupported backend address: {0}")]
    UnsupportedAddress(String),

    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Tool call failed: {0}")]
    ToolCallFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

pub type McpResult<T> = Result<T, McpError>;
