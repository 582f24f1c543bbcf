//! Core types for tool-calling conversations
//!
//! This module contains the shared types used across providers, backends and
//! the engine.

mod backend;
mod message;
mod status;
mod tool;

pub use backend::BackendDescriptor;
pub use message::{AssistantReply, ConversationMessage, MessageRole, ModelResponse};
pub use status::SessionStatus;
pub use tool::{CatalogEntry, ToolDescriptor, ToolFailure, ToolFailureKind, ToolOutcome, ToolRequest};
