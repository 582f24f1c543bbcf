//! Provider error types

use thiserror::Error;

/// Why a model round produced no reply
///
/// Any of these is fatal to the current turn; the tool loop rolls the turn
/// back and reports it.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider needs a key and none was configured
    #[error("API key is required for {provider}")]
    MissingApiKey { provider: String },

    /// The request could not be completed (network, auth, rate limit, bad reply)
    #[error("{provider} request failed: {message}")]
    Request { provider: String, message: String },

    /// History could not be encoded for the provider
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
        }
    }

    pub fn request(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
