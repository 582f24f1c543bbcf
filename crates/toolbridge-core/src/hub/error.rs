//! Pre-condition rejections

use thiserror::Error;

use crate::bridge::BridgeError;
use crate::config::ConfigError;

/// Why an event was rejected before any asynchronous work was scheduled
#[derive(Error, Debug)]
pub enum HubError {
    #[error("Unknown session: {0}")]
    UnknownSession(String),

    #[error("No MCP server selected for initialization.")]
    NoServersSelected,

    #[error("No MCP servers are configured.")]
    NoServersConfigured,

    #[error("The selected server ids do not match any configured server.")]
    InvalidSelection(Vec<String>),

    #[error("API key for {provider} is not configured.")]
    MissingApiKey { provider: String },

    #[error("Initialization already in progress.")]
    AlreadyInitializing,

    #[error("MCP not initialized or connection failed. Initialize first.")]
    NotConnected,

    #[error("A request is already in progress for this session.")]
    Busy,

    #[error("Empty message not sent.")]
    EmptyMessage,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Bridge(#[from] BridgeError),
}

pub type HubResult<T> = Result<T, HubError>;
