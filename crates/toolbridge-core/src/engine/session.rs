//! One user's conversation context

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::logging::Logger;
use crate::mcp::{BackendConnector, BackendPool};
use crate::tools::ToolCatalog;
use crate::types::BackendDescriptor;

use super::conversation::Conversation;
use super::error::TurnResult;
use super::tool_loop::ToolLoop;

/// Outcome of connecting a backend selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitReport {
    /// Backends that connected
    pub connected_servers: usize,
    /// Backends that were selected
    pub requested_servers: usize,
    /// Tools in the resulting catalog
    pub total_tools: usize,
    /// Ids of the backends that failed to connect
    pub failed_servers: Vec<String>,
}

impl InitReport {
    pub fn tools_available(&self) -> bool {
        self.total_tools > 0
    }

    pub fn any_connected(&self) -> bool {
        self.connected_servers > 0
    }
}

/// Per-session state: backend connections, tool catalog and history
///
/// Nothing here is shared with other sessions.
pub struct Session {
    id: String,
    pool: BackendPool,
    catalog: ToolCatalog,
    conversation: Conversation,
    tool_loop: ToolLoop,
    logger: Arc<dyn Logger>,
}

impl Session {
    pub fn new(id: impl Into<String>, tool_loop: ToolLoop, logger: Arc<dyn Logger>) -> Self {
        Self {
            id: id.into(),
            pool: BackendPool::new(Arc::clone(&logger)),
            catalog: ToolCatalog::new(),
            conversation: Conversation::new(),
            tool_loop,
            logger,
        }
    }

    /// Bound on closing each backend connection
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.pool = BackendPool::new(Arc::clone(&self.logger)).with_close_timeout(timeout);
        self
    }

    /// Connect the selected backends and build the catalog
    ///
    /// Any previous selection is closed and the history cleared first.
    pub async fn initialize(
        &mut self,
        connector: &dyn BackendConnector,
        backends: Vec<BackendDescriptor>,
    ) -> InitReport {
        self.close().await;
        self.conversation.reset();
        self.catalog = ToolCatalog::new();

        self.logger.info(&format!(
            "[Session {}] Initializing {} backend(s)",
            self.id,
            backends.len()
        ));

        let failures = self.pool.connect_all(connector, &backends).await;
        self.catalog = ToolCatalog::aggregate(&self.pool, &backends, &self.logger).await;

        let report = InitReport {
            connected_servers: self.pool.connected_count(),
            requested_servers: backends.len(),
            total_tools: self.catalog.len(),
            failed_servers: failures.into_iter().map(|f| f.backend_id).collect(),
        };
        self.logger.info(&format!(
            "[Session {}] {}/{} backends connected, {} tools",
            self.id, report.connected_servers, report.requested_servers, report.total_tools
        ));
        report
    }

    /// Run one user turn
    pub async fn send_message(&mut self, text: &str) -> TurnResult<String> {
        self.tool_loop
            .run_turn(&mut self.conversation, &self.catalog, &self.pool, text)
            .await
    }

    /// Clear the history; connections and catalog stay
    pub fn reset_conversation(&mut self) {
        self.logger
            .info(&format!("[Session {}] Conversation reset", self.id));
        self.conversation.reset();
    }

    /// Close every backend connection
    pub async fn close(&mut self) {
        if !self.pool.is_empty() {
            self.logger.info(&format!(
                "[Session {}] Closing connections: {}",
                self.id,
                self.pool.backend_ids().join(", ")
            ));
        }
        self.pool.close_all().await;
        self.catalog = ToolCatalog::new();
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn pool(&self) -> &BackendPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::LoopOptions;
    use crate::logging::NoOpLogger;
    use crate::mcp::{MockBackend, MockConnector};
    use crate::providers::{MockProvider, ProviderModelConfig};
    use crate::types::ToolDescriptor;

    fn session(reply: &str) -> Session {
        let logger = NoOpLogger::shared();
        let tool_loop = ToolLoop::new(
            Arc::new(MockProvider::fixed(reply, logger.clone())),
            ProviderModelConfig::new("mock"),
            LoopOptions::default(),
            logger.clone(),
        );
        Session::new("s1", tool_loop, logger)
    }

    fn connector() -> MockConnector {
        MockConnector::new()
            .with_backend("a", MockBackend::new().with_tool(ToolDescriptor::new("search")))
            .with_backend("b", MockBackend::new().with_tool(ToolDescriptor::new("lookup")))
            .failing("c")
    }

    fn descriptors(ids: &[&str]) -> Vec<BackendDescriptor> {
        ids.iter()
            .map(|id| BackendDescriptor::new(*id, "", format!("http://{}/mcp", id)))
            .collect()
    }

    #[tokio::test]
    async fn test_initialize_report() {
        let connector = connector();
        let mut session = session("ok");

        let report = session.initialize(&connector, descriptors(&["a", "c"])).await;

        assert_eq!(report.connected_servers, 1);
        assert_eq!(report.requested_servers, 2);
        assert_eq!(report.total_tools, 1);
        assert_eq!(report.failed_servers, vec!["c".to_string()]);
        assert!(report.tools_available());
    }

    #[tokio::test]
    async fn test_reinitialize_closes_old_pool_and_resets() {
        let connector = connector();
        let mut session = session("ok");

        session.initialize(&connector, descriptors(&["a"])).await;
        session.send_message("hello").await.unwrap();
        assert_eq!(session.conversation().len(), 2);

        session.initialize(&connector, descriptors(&["b"])).await;

        assert_eq!(connector.closed_ids(), vec!["a".to_string()]);
        assert!(session.conversation().is_empty());
        assert!(session.catalog().resolve("a__search").is_none());
        assert!(session.catalog().resolve("b__lookup").is_some());
    }

    #[tokio::test]
    async fn test_reset_keeps_connections() {
        let connector = connector();
        let mut session = session("ok");
        session.initialize(&connector, descriptors(&["a"])).await;
        session.send_message("hello").await.unwrap();

        session.reset_conversation();
        assert!(session.conversation().is_empty());
        assert_eq!(session.pool().connected_count(), 1);

        // A fresh turn sees no leaked history
        session.send_message("again").await.unwrap();
        assert_eq!(session.conversation().len(), 2);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let connector = connector();
        let mut session = session("ok");
        session.close().await;
        session.initialize(&connector, descriptors(&["a", "b"])).await;
        session.close().await;
        session.close().await;
        assert_eq!(connector.closed_count(), 2);
        assert!(session.catalog().is_empty());
    }
}
