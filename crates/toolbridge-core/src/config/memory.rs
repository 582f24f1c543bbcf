//! In-memory configuration provider

use parking_lot::RwLock;

use crate::types::BackendDescriptor;

use super::file::DefaultSettings;
use super::traits::{validate_backends, ConfigProvider, ConfigResult};

/// In-memory configuration provider for testing
#[derive(Debug, Default)]
pub struct MemoryConfigProvider {
    backends: RwLock<Vec<BackendDescriptor>>,
    defaults: RwLock<DefaultSettings>,
}

impl MemoryConfigProvider {
    /// Create a new empty memory config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory config provider with initial backends
    pub fn with_backends(backends: Vec<BackendDescriptor>) -> Self {
        Self {
            backends: RwLock::new(backends),
            defaults: RwLock::new(DefaultSettings::default()),
        }
    }

    /// Replace the backend list
    pub fn set_backends(&self, backends: Vec<BackendDescriptor>) {
        *self.backends.write() = backends;
    }

    /// Replace the default settings
    pub fn set_defaults(&self, defaults: DefaultSettings) {
        *self.defaults.write() = defaults;
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn backends(&self) -> ConfigResult<Vec<BackendDescriptor>> {
        let backends = self.backends.read().clone();
        validate_backends(&backends)?;
        Ok(backends)
    }

    fn defaults(&self) -> ConfigResult<DefaultSettings> {
        Ok(self.defaults.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn test_memory_config_provider() {
        let config = MemoryConfigProvider::new();
        assert!(config.backends().unwrap().is_empty());

        config.set_backends(vec![BackendDescriptor::new("a", "A", "http://a/mcp")]);
        assert_eq!(config.backends().unwrap().len(), 1);

        config.set_defaults(DefaultSettings {
            model: Some("gpt-4.1".to_string()),
            ..Default::default()
        });
        assert_eq!(config.defaults().unwrap().model.as_deref(), Some("gpt-4.1"));
    }

    #[test]
    fn test_invalid_backends_are_reported() {
        let config = MemoryConfigProvider::with_backends(vec![
            BackendDescriptor::new("a", "", "http://a"),
            BackendDescriptor::new("a", "", "http://b"),
        ]);
        assert!(matches!(config.backends(), Err(ConfigError::Invalid(_))));
    }
}
