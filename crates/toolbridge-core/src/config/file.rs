//! File-based configuration provider (YAML)
//!
//! Supports user-level (~/.config/toolbridge/servers.yaml) and workspace-level
//! (.config/toolbridge/servers.yaml) config. JSON documents are accepted too.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::BackendDescriptor;

use super::traits::{validate_backends, ConfigError, ConfigProvider, ConfigResult};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Tool backends a session may select
    #[serde(default)]
    pub available_mcp_servers: Vec<BackendDescriptor>,

    /// Default settings
    #[serde(default)]
    pub defaults: Option<DefaultSettings>,
}

/// Default LLM settings for the config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DefaultSettings {
    /// Default provider name
    pub provider: Option<String>,
    /// Default model name
    pub model: Option<String>,
    /// Maximum LLM/tool round trips per turn
    pub max_tool_rounds: Option<usize>,
}

/// Config level (user or workspace)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLevel {
    /// User-level config (~/.config/toolbridge/servers.yaml)
    User,
    /// Workspace-level config (.config/toolbridge/servers.yaml in workspace root)
    Workspace,
    /// An explicitly chosen file
    Explicit,
}

impl ConfigLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigLevel::User => "user",
            ConfigLevel::Workspace => "workspace",
            ConfigLevel::Explicit => "explicit",
        }
    }
}

/// File-based configuration provider
///
/// The file is read again on every call so edits take effect for the next
/// request without a restart. A missing file is an empty configuration.
///
/// # Example
///
/// ```no_run
/// use toolbridge_core::config::{ConfigProvider, FileConfigProvider};
///
/// let config = FileConfigProvider::workspace(".");
/// let backends = config.backends().unwrap_or_default();
/// ```
#[derive(Debug, Clone)]
pub struct FileConfigProvider {
    path: PathBuf,
    level: ConfigLevel,
}

impl FileConfigProvider {
    /// Create a new file config provider for a specific path
    pub fn new(path: impl Into<PathBuf>, level: ConfigLevel) -> Self {
        Self {
            path: path.into(),
            level,
        }
    }

    /// Create a user-level config provider
    pub fn user() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        let path = config_dir.join("toolbridge").join("servers.yaml");
        Self::new(path, ConfigLevel::User)
    }

    /// Create a workspace-level config provider
    pub fn workspace(workspace_root: impl AsRef<Path>) -> Self {
        let path = workspace_root
            .as_ref()
            .join(".config")
            .join("toolbridge")
            .join("servers.yaml");
        Self::new(path, ConfigLevel::Workspace)
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the config level
    pub fn level(&self) -> ConfigLevel {
        self.level
    }

    /// Check if the config file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load config from file
    pub fn load(&self) -> ConfigResult<ConfigFile> {
        if !self.path.exists() {
            return Ok(ConfigFile::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(ConfigFile::default());
        }

        serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::Parse(format!("{}: {}", self.path.display(), e))
        })
    }
}

impl ConfigProvider for FileConfigProvider {
    fn backends(&self) -> ConfigResult<Vec<BackendDescriptor>> {
        let backends = self.load()?.available_mcp_servers;
        validate_backends(&backends)?;
        Ok(backends)
    }

    fn defaults(&self) -> ConfigResult<DefaultSettings> {
        Ok(self.load()?.defaults.unwrap_or_default())
    }
}
