//! Per-session pool of live backend connections

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use crate::logging::Logger;
use crate::types::BackendDescriptor;

use super::error::McpError;
use super::traits::{BackendConnector, ToolBackend};

/// Default bound on closing one connection
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// A backend that could not be connected
#[derive(Debug)]
pub struct ConnectFailure {
    pub backend_id: String,
    pub error: McpError,
}

/// Live connections keyed by backend id
///
/// Only descriptors passed to [`connect_all`](Self::connect_all) are ever
/// connected. Closing is best-effort: failures and timeouts are logged.
pub struct BackendPool {
    connections: HashMap<String, Box<dyn ToolBackend>>,
    close_timeout: Duration,
    logger: Arc<dyn Logger>,
}

impl BackendPool {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            connections: HashMap::new(),
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            logger,
        }
    }

    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Connect every descriptor concurrently; one attempt each
    ///
    /// Returns the failures. Successful connections join the pool; a failing
    /// backend never affects the others.
    pub async fn connect_all(
        &mut self,
        connector: &dyn BackendConnector,
        descriptors: &[BackendDescriptor],
    ) -> Vec<ConnectFailure> {
        let pending: Vec<&BackendDescriptor> = descriptors
            .iter()
            .filter(|d| !self.connections.contains_key(&d.id))
            .collect();

        let logger = &self.logger;
        let attempts = pending.iter().map(|descriptor| async move {
            logger.info(&format!(
                "[BackendPool] Connecting to '{}' at {}",
                descriptor.display_name(),
                descriptor.url
            ));
            (descriptor.id.clone(), connector.connect(descriptor).await)
        });
        let results = join_all(attempts).await;

        let mut failures = Vec::new();
        for (backend_id, result) in results {
            match result {
                Ok(backend) => {
                    self.logger
                        .info(&format!("[BackendPool] Connected to '{}'", backend_id));
                    self.connections.insert(backend_id, backend);
                }
                Err(error) => {
                    self.logger.warn(&format!(
                        "[BackendPool] Failed to connect to '{}': {}",
                        backend_id, error
                    ));
                    failures.push(ConnectFailure { backend_id, error });
                }
            }
        }
        failures
    }

    /// Live connection for a backend id
    pub fn get(&self, backend_id: &str) -> Option<&dyn ToolBackend> {
        self.connections.get(backend_id).map(|b| b.as_ref())
    }

    pub fn contains(&self, backend_id: &str) -> bool {
        self.connections.contains_key(backend_id)
    }

    pub fn connected_count(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Connected backend ids, sorted
    pub fn backend_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.connections.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Close every connection with a bounded wait each
    ///
    /// Never fails; safe on an empty pool and safe to call repeatedly.
    pub async fn close_all(&mut self) {
        if self.connections.is_empty() {
            return;
        }
        let timeout = self.close_timeout;
        let closing = self.connections.drain().map(|(backend_id, backend)| async move {
            (backend_id, tokio::time::timeout(timeout, backend.close()).await)
        });

        for (backend_id, result) in join_all(closing).await {
            match result {
                Ok(Ok(())) => self
                    .logger
                    .debug(&format!("[BackendPool] Closed '{}'", backend_id)),
                Ok(Err(e)) => self.logger.warn(&format!(
                    "[BackendPool] Error closing '{}' (ignored): {}",
                    backend_id, e
                )),
                Err(_) => self.logger.warn(&format!(
                    "[BackendPool] Closing '{}' timed out after {:?}",
                    backend_id, timeout
                )),
            }
        }
    }
}
