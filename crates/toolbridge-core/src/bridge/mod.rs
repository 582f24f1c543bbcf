//! Sync/async bridge
//!
//! The request-handling side is synchronous; every network call (backend
//! connections, tool calls, LLM requests) runs on one shared asynchronous
//! execution context owned by a [`Bridge`].

mod error;
mod worker;

pub use error::{BridgeError, BridgeResult};
pub use worker::{Bridge, Ticket, DEFAULT_SHUTDOWN_TIMEOUT};
