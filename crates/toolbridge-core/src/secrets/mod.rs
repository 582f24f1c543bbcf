//! Secret lookup for LLM credentials
//!
//! - `EnvSecretStore`: environment variables (and `.env` files loaded into them)
//! - `MemorySecretStore`: in-memory, for tests and embedders

mod env_store;
mod memory_store;
mod traits;

pub use env_store::EnvSecretStore;
pub use memory_store::MemorySecretStore;
pub use traits::SecretStore;
