//! Configuration provider abstractions
//!
//! Supports multiple configuration sources:
//! - `MemoryConfigProvider`: In-memory for testing
//! - `FileConfigProvider`: YAML file-based (user/workspace level)

mod file;
mod memory;
mod traits;

pub use file::{ConfigFile, ConfigLevel, DefaultSettings, FileConfigProvider};
pub use memory::MemoryConfigProvider;
pub use traits::{validate_backends, ConfigError, ConfigProvider, ConfigResult, CATALOG_SEPARATOR};
