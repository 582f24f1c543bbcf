//! Bridge error types

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The worker no longer accepts work
    #[error("Execution context is stopped")]
    Stopped,

    /// The caller gave up waiting
    #[error("Timed out after {0:?} waiting for result")]
    Timeout(Duration),

    /// The work ended without producing a result (it panicked or was dropped)
    #[error("Scheduled work ended without a result")]
    Abandoned,

    /// The worker could not be started
    #[error("Failed to start execution context: {0}")]
    Startup(String),
}

pub type BridgeResult<T> = Result<T, BridgeError>;
