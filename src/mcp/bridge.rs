//! Bridge an MCP client into the chat tool layer.

use async_trait::async_trait;

use crate::error::ChatError;
use crate::tools::ToolProvider;
use crate::types::{JsonObject, ToolDescriptor, ToolOutput};

use super::client::MCPClient;
use super::transport::ServerCommand;

#[async_trait]
trait MCPClientOps: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ChatError>;
    async fn call_tool(&self, name: &str, arguments: JsonObject)
        -> Result<ToolOutput, ChatError>;
    async fn close(&self) -> Result<(), ChatError>;
}

#[async_trait]
impl MCPClientOps for MCPClient {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ChatError> {
        MCPClient::list_tools(self).await
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: JsonObject,
    ) -> Result<ToolOutput, ChatError> {
        MCPClient::call_tool(self, name, arguments).await
    }

    async fn close(&self) -> Result<(), ChatError> {
        MCPClient::close(self).await
    }
}

/// Adapts an MCP client to the [`ToolProvider`] trait.
pub struct MCPToolAdapter {
    client: Box<dyn MCPClientOps>,
}

impl MCPToolAdapter {
    pub fn new(client: MCPClient) -> Self {
        Self {
            client: Box::new(client),
        }
    }

    /// Launch the server and wrap the connected client.
    pub async fn connect(command: &ServerCommand) -> Result<Self, ChatError> {
        Ok(Self::new(MCPClient::connect(command).await?))
    }

    #[cfg(test)]
    fn from_client_ops(client: Box<dyn MCPClientOps>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolProvider for MCPToolAdapter {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ChatError> {
        self.client.list_tools().await
    }

    async fn call_tool(&self, name: &str, arguments: JsonObject) -> Result<ToolOutput, ChatError> {
        self.client.call_tool(name, arguments).await
    }

    async fn shutdown(&self) -> Result<(), ChatError> {
        self.client.close().await
    }
}
