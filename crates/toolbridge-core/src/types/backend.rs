//! Tool backend descriptors

use serde::{Deserialize, Serialize};

/// Static description of one tool backend, supplied by configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackendDescriptor {
    /// Stable identifier, used as the catalog name prefix
    pub id: String,
    /// Display name for logs and the server list
    #[serde(default)]
    pub name: String,
    /// Network address (`http(s)://...` or `unix://<path>`)
    pub url: String,
}

impl BackendDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
        }
    }

    /// Display name, falling back to the id
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}
