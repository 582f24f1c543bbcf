//! In-memory secret store

use std::collections::HashMap;

use parking_lot::RwLock;

use super::traits::SecretStore;

/// In-memory secret store for testing and embedding
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory store with initial values
    pub fn with_secrets(initial: HashMap<String, String>) -> Self {
        Self {
            secrets: RwLock::new(initial),
        }
    }

    /// Insert or replace a secret
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.secrets.write().insert(key.into(), value.into());
    }
}

impl SecretStore for MemorySecretStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.secrets.read().get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemorySecretStore::new();
        assert_eq!(store.name(), "memory");
        assert!(!store.has("openai"));

        store.insert("openai", "sk-test");
        assert_eq!(store.get("openai"), Some("sk-test".to_string()));

        store.insert("openai", "sk-other");
        assert_eq!(store.get("openai"), Some("sk-other".to_string()));
    }

    #[test]
    fn test_memory_store_with_initial() {
        let mut initial = HashMap::new();
        initial.insert("anthropic".to_string(), "sk-ant".to_string());

        let store = MemorySecretStore::with_secrets(initial);
        assert!(store.has("anthropic"));
    }
}
