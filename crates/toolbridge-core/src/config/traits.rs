//! Configuration provider trait

use std::collections::HashSet;

use crate::types::BackendDescriptor;

use super::file::DefaultSettings;

/// Separator between backend id and tool name in catalog names
pub const CATALOG_SEPARATOR: &str = "__";

/// Configuration provider abstraction
///
/// Called from the request-handling side, so it is synchronous. Implementations:
/// - `MemoryConfigProvider`: In-memory for testing
/// - `FileConfigProvider`: YAML file, re-read on every call
pub trait ConfigProvider: Send + Sync {
    /// Get every configured tool backend
    fn backends(&self) -> ConfigResult<Vec<BackendDescriptor>>;

    /// Get default LLM settings
    fn defaults(&self) -> ConfigResult<DefaultSettings>;
}

/// Errors that can occur during configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Check backend ids: non-empty, unique, and free of the catalog separator
pub fn validate_backends(backends: &[BackendDescriptor]) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for backend in backends {
        if backend.id.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "backend with url '{}' has an empty id",
                backend.url
            )));
        }
        if backend.id.contains(CATALOG_SEPARATOR) {
            return Err(ConfigError::Invalid(format!(
                "backend id '{}' must not contain '{}'",
                backend.id, CATALOG_SEPARATOR
            )));
        }
        if !seen.insert(backend.id.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "duplicate backend id '{}'",
                backend.id
            )));
        }
    }
    Ok(())
}
