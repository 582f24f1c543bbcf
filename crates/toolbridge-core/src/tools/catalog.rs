//! Session tool catalog
//!
//! Merges the manifests of every connected backend into one list of
//! LLM-facing tools named `{backend_id}__{tool_name}`, and keeps the reverse
//! map used to route a call back to its backend.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use serde_json::{json, Map, Value};

use crate::config::CATALOG_SEPARATOR;
use crate::logging::Logger;
use crate::mcp::BackendPool;
use crate::types::{BackendDescriptor, CatalogEntry, ToolDescriptor};

/// Where a catalog name routes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRoute {
    pub backend_id: String,
    /// Backend-native tool name
    pub tool_name: String,
}

/// Build the catalog name for a backend's tool
pub fn catalog_name(backend_id: &str, tool_name: &str) -> String {
    format!("{}{}{}", backend_id, CATALOG_SEPARATOR, tool_name)
}

/// Normalize a manifest schema into the parameter schema sent to the model
///
/// A schema without properties becomes the canonical empty object schema;
/// otherwise `type`, `properties` and `required` are carried over as-is.
pub fn normalize_schema(schema: Option<&Value>) -> Value {
    let properties = schema
        .and_then(|s| s.get("properties"))
        .filter(|p| match p {
            Value::Object(map) => !map.is_empty(),
            Value::Null => false,
            _ => true,
        });

    let (Some(schema), Some(properties)) = (schema, properties) else {
        return json!({ "type": "object", "properties": {} });
    };

    let mut normalized = Map::new();
    normalized.insert(
        "type".to_string(),
        schema.get("type").cloned().unwrap_or_else(|| json!("object")),
    );
    normalized.insert("properties".to_string(), properties.clone());
    normalized.insert(
        "required".to_string(),
        schema.get("required").cloned().unwrap_or_else(|| json!([])),
    );
    Value::Object(normalized)
}

/// The tools one session exposes to the model
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    entries: Vec<CatalogEntry>,
    routes: HashMap<String, CatalogRoute>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch every connected backend's manifest and merge them
    ///
    /// Backends are listed concurrently; entries keep the order of
    /// `backends`. A backend that is not connected or whose listing fails
    /// contributes no tools.
    pub async fn aggregate(
        pool: &BackendPool,
        backends: &[BackendDescriptor],
        logger: &Arc<dyn Logger>,
    ) -> Self {
        let connected: Vec<&BackendDescriptor> =
            backends.iter().filter(|b| pool.contains(&b.id)).collect();

        let listings = connected.iter().map(|descriptor| async move {
            let tools = match pool.get(&descriptor.id) {
                Some(backend) => backend.list_tools().await,
                None => Ok(Vec::new()),
            };
            (*descriptor, tools)
        });

        let mut catalog = Self::new();
        for (descriptor, tools) in join_all(listings).await {
            match tools {
                Ok(tools) => {
                    logger.info(&format!(
                        "[ToolCatalog] Received {} tools from '{}'",
                        tools.len(),
                        descriptor.display_name()
                    ));
                    for tool in tools {
                        catalog.add(descriptor, tool, logger);
                    }
                }
                Err(e) => logger.warn(&format!(
                    "[ToolCatalog] Listing tools from '{}' failed, skipping: {}",
                    descriptor.display_name(),
                    e
                )),
            }
        }

        logger.info(&format!(
            "[ToolCatalog] Aggregated {} tools from {} backends",
            catalog.len(),
            connected.len()
        ));
        catalog
    }

    /// Add one manifest tool; nameless and duplicate tools are skipped
    pub fn add(&mut self, backend: &BackendDescriptor, tool: ToolDescriptor, logger: &Arc<dyn Logger>) {
        if tool.name.trim().is_empty() {
            logger.warn(&format!(
                "[ToolCatalog] Tool from '{}' has no name, skipping",
                backend.display_name()
            ));
            return;
        }

        let name = catalog_name(&backend.id, &tool.name);
        if self.routes.contains_key(&name) {
            logger.warn(&format!("[ToolCatalog] Duplicate tool '{}', skipping", name));
            return;
        }

        let description = tool
            .description
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| {
                format!("Tool {} from server {}", tool.name, backend.display_name())
            });

        logger.debug(&format!("[ToolCatalog] Aggregated tool: {}", name));
        self.entries.push(CatalogEntry {
            name: name.clone(),
            description,
            parameters: normalize_schema(tool.input_schema.as_ref()),
        });
        self.routes.insert(
            name,
            CatalogRoute {
                backend_id: backend.id.clone(),
                tool_name: tool.name,
            },
        );
    }

    /// Route a catalog name back to its backend
    pub fn resolve(&self, name: &str) -> Option<&CatalogRoute> {
        self.routes.get(name)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
