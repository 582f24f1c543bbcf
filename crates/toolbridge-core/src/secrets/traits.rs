//! Core trait for secret lookup

/// Trait for secret storage implementations
///
/// Implementations:
/// - Environment variables (`EnvSecretStore`)
/// - In-memory for testing (`MemorySecretStore`)
///
/// # Example
///
/// ```
/// use toolbridge_core::secrets::{SecretStore, EnvSecretStore};
///
/// let store = EnvSecretStore::new();
/// // store.get("openai") will check OPENAI_API_KEY
/// ```
pub trait SecretStore: Send + Sync {
    /// Human-readable name of this store
    fn name(&self) -> &str;

    /// Retrieve a secret by key
    ///
    /// The key can be:
    /// - A provider name (e.g., "openai") which gets mapped to the appropriate env var
    /// - A direct key (e.g., "OPENAI_API_KEY")
    fn get(&self, key: &str) -> Option<String>;

    /// Check if a secret exists
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}
