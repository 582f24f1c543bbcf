//! Fatal turn outcomes

use thiserror::Error;

use crate::providers::ProviderError;

/// Why a turn ended without a final answer
///
/// Tool failures never show up here; they are fed back to the model.
#[derive(Error, Debug)]
pub enum TurnError {
    /// The LLM request itself failed
    #[error("LLM request failed: {0}")]
    Transport(#[from] ProviderError),

    /// The model replied with neither text nor tool calls
    #[error("The model returned neither text nor tool calls")]
    MalformedReply,

    /// The model kept asking for tools past the per-turn limit
    #[error("Tool-call loop exceeded {limit} rounds")]
    LoopLimitExceeded { limit: usize },
}

pub type TurnResult<T> = Result<T, TurnError>;
