//! Tool provider: the capability-discovery and invoke service.

use async_trait::async_trait;

use crate::error::ChatError;
use crate::types::{JsonObject, ToolDescriptor, ToolOutput};

/// A source of runtime-discovered tools (e.g., an MCP server).
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// List available tools.
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ChatError>;

    /// Execute a tool by name.
    async fn call_tool(&self, name: &str, arguments: JsonObject)
        -> Result<ToolOutput, ChatError>;

    /// Release the provider connection. Must be idempotent.
    async fn shutdown(&self) -> Result<(), ChatError> {
        Ok(())
    }
}
