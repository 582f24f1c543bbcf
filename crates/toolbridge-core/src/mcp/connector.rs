//! Connector that opens real MCP connections

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::logging::Logger;
use crate::types::BackendDescriptor;

use super::client::McpClient;
use super::error::{McpError, McpResult};
use super::traits::{BackendConnector, ToolBackend};

/// Default bound on one connect attempt
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Where a backend listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendAddress {
    /// `http://` or `https://` (MCP Streamable HTTP)
    Http(String),
    /// `unix://<path>`
    Unix(PathBuf),
}

impl BackendAddress {
    pub fn parse(url: &str) -> McpResult<Self> {
        let trimmed = url.trim();
        if let Some(path) = trimmed.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(McpError::UnsupportedAddress(url.to_string()));
            }
            return Ok(BackendAddress::Unix(PathBuf::from(path)));
        }
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return Ok(BackendAddress::Http(trimmed.to_string()));
        }
        Err(McpError::UnsupportedAddress(url.to_string()))
    }
}

/// Opens [`McpClient`] connections, one attempt per call
pub struct McpConnector {
    connect_timeout: Duration,
    logger: Arc<dyn Logger>,
}

impl McpConnector {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            logger,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn announce(&self, descriptor: &BackendDescriptor, client: &McpClient) {
        if let Some(server) = client.server_info() {
            self.logger.info(&format!(
                "[McpConnector] '{}' is {} {}",
                descriptor.id, server.name, server.version
            ));
        }
    }

    async fn open(&self, descriptor: &BackendDescriptor) -> McpResult<Box<dyn ToolBackend>> {
        let label = descriptor.id.clone();
        match BackendAddress::parse(&descriptor.url)? {
            BackendAddress::Http(url) => {
                let client = McpClient::connect_http(&url, label, Arc::clone(&self.logger)).await?;
                self.announce(descriptor, &client);
                Ok(Box::new(client))
            }
            #[cfg(unix)]
            BackendAddress::Unix(path) => {
                let client = McpClient::connect_unix(&path, label, Arc::clone(&self.logger)).await?;
                self.announce(descriptor, &client);
                Ok(Box::new(client))
            }
            #[cfg(not(unix))]
            BackendAddress::Unix(_) => Err(McpError::UnsupportedAddress(descriptor.url.clone())),
        }
    }
}

#[async_trait]
impl BackendConnector for McpConnector {
    async fn connect(&self, descriptor: &BackendDescriptor) -> McpResult<Box<dyn ToolBackend>> {
        tokio::time::timeout(self.connect_timeout, self.open(descriptor))
            .await
            .map_err(|_| McpError::Timeout(self.connect_timeout))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;

    #[test]
    fn test_parse_addresses() {
        assert_eq!(
            BackendAddress::parse("http://127.0.0.1:8080/mcp").unwrap(),
            BackendAddress::Http("http://127.0.0.1:8080/mcp".to_string())
        );
        assert_eq!(
            BackendAddress::parse("unix:///tmp/weather.sock").unwrap(),
            BackendAddress::Unix(PathBuf::from("/tmp/weather.sock"))
        );
        assert!(BackendAddress::parse("ftp://x").is_err());
        assert!(BackendAddress::parse("unix://").is_err());
    }

    #[tokio::test]
    async fn test_unsupported_address_fails_fast() {
        let connector = McpConnector::new(NoOpLogger::shared());
        let descriptor = BackendDescriptor::new("bad", "Bad", "gopher://nowhere");
        assert!(matches!(
            connector.connect(&descriptor).await,
            Err(McpError::UnsupportedAddress(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_socket_is_connection_failure() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("absent.sock");
        let connector = McpConnector::new(NoOpLogger::shared());
        let descriptor = BackendDescriptor::new("x", "X", format!("unix://{}", socket.display()));
        assert!(matches!(
            connector.connect(&descriptor).await,
            Err(McpError::ConnectionFailed(_))
        ));
    }
}
