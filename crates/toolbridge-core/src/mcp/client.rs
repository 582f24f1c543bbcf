//! MCP client using the official rmcp SDK
//!
//! Connects to MCP servers over Streamable HTTP or a Unix socket.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rmcp::{
    model::{
        CallToolRequestParams, CallToolResult, ClientCapabilities, ClientInfo, Implementation,
        RawContent, Tool,
    },
    service::RunningService,
    RoleClient, ServiceExt,
};
use serde_json::{Map, Value};

#[cfg(unix)]
use tokio::net::UnixStream;

use crate::logging::Logger;
use crate::types::ToolDescriptor;

use super::error::{McpError, McpResult};
use super::traits::{ToolBackend, ToolContent};

fn client_info() -> ClientInfo {
    ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "toolbridge".to_string(),
            title: Some("Toolbridge".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            website_url: None,
            icons: None,
        },
    }
}

/// MCP client for one backend
pub struct McpClient {
    client: RunningService<RoleClient, ClientInfo>,
    label: String,
    logger: Arc<dyn Logger>,
}

impl McpClient {
    /// Connect to an MCP server over a Unix socket
    #[cfg(unix)]
    pub async fn connect_unix<P: AsRef<Path>>(
        socket_path: P,
        label: impl Into<String>,
        logger: Arc<dyn Logger>,
    ) -> McpResult<Self> {
        let path = socket_path.as_ref();
        let label = label.into();
        logger.info(&format!("[McpClient {}] Connecting to Unix socket: {:?}", label, path));

        let stream = UnixStream::connect(path)
            .await
            .map_err(|e| McpError::ConnectionFailed(e.to_string()))?;

        let client = client_info()
            .serve(stream)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        logger.info(&format!("[McpClient {}] Connected and initialized", label));
        Ok(Self { client, label, logger })
    }

    /// Connect to an MCP server over HTTP (Streamable HTTP transport)
    pub async fn connect_http(
        url: &str,
        label: impl Into<String>,
        logger: Arc<dyn Logger>,
    ) -> McpResult<Self> {
        use rmcp::transport::StreamableHttpClientTransport;

        let label = label.into();
        logger.info(&format!("[McpClient {}] Connecting to HTTP: {}", label, url));

        let transport = StreamableHttpClientTransport::from_uri(url);

        let client = client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        logger.info(&format!("[McpClient {}] Connected and initialized", label));
        Ok(Self { client, label, logger })
    }

    /// Get server info
    pub fn server_info(&self) -> Option<&Implementation> {
        self.client.peer_info().map(|info| &info.server_info)
    }
}

/// Convert an rmcp tool into a descriptor
pub fn descriptor_from_tool(tool: &Tool) -> ToolDescriptor {
    ToolDescriptor {
        name: tool.name.to_string(),
        description: tool.description.as_ref().map(|d| d.to_string()),
        input_schema: Some(Value::Object((*tool.input_schema).clone())),
    }
}

/// Convert a call result into content items; flagged errors become failures
pub fn contents_from_result(result: CallToolResult) -> McpResult<Vec<ToolContent>> {
    let contents: Vec<ToolContent> = result
        .content
        .into_iter()
        .map(|c| match c.raw {
            RawContent::Text(t) => ToolContent::Text(t.text),
            other => ToolContent::Opaque(serde_json::to_value(&other).unwrap_or(Value::Null)),
        })
        .collect();

    if result.is_error.unwrap_or(false) {
        return Err(McpError::ToolCallFailed(ToolContent::render(&contents)));
    }
    Ok(contents)
}

#[async_trait]
impl ToolBackend for McpClient {
    async fn list_tools(&self) -> McpResult<Vec<ToolDescriptor>> {
        let result = self
            .client
            .list_tools(Default::default())
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;

        self.logger.info(&format!(
            "[McpClient {}] Listed {} tools",
            self.label,
            result.tools.len()
        ));

        Ok(result.tools.iter().map(descriptor_from_tool).collect())
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> McpResult<Vec<ToolContent>> {
        self.logger
            .info(&format!("[McpClient {}] Calling tool: {}", self.label, name));

        let params = CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments: Some(arguments),
            task: None,
        };

        let result = self
            .client
            .call_tool(params)
            .await
            .map_err(|e| McpError::ToolCallFailed(e.to_string()))?;

        contents_from_result(result)
    }

    async fn close(self: Box<Self>) -> McpResult<()> {
        self.logger
            .info(&format!("[McpClient {}] Closing connection", self.label));
        self.client
            .cancel()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::Content;

    #[test]
    fn test_text_result() {
        let result = CallToolResult::success(vec![Content::text("22C")]);
        let contents = contents_from_result(result).unwrap();
        assert_eq!(contents, vec![ToolContent::Text("22C".to_string())]);
    }

    #[test]
    fn test_flagged_error_result() {
        let result = CallToolResult::error(vec![Content::text("city not found")]);
        match contents_from_result(result) {
            Err(McpError::ToolCallFailed(msg)) => assert_eq!(msg, "city not found"),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }
}
