//! Conversation engine
//!
//! A [`Session`] owns one user's backend pool, tool catalog and
//! [`Conversation`]; the [`ToolLoop`] drives a single turn.

mod conversation;
mod error;
mod session;
mod tool_loop;

pub use conversation::{Checkpoint, Conversation};
pub use error::{TurnError, TurnResult};
pub use session::{InitReport, Session};
pub use tool_loop::{parse_arguments, LoopOptions, LoopState, ToolLoop, DEFAULT_MAX_TOOL_ROUNDS};
