//! MCP client for a single connected tool server.

use rmcp::model::{CallToolRequestParams, CallToolResult, Content, ResourceContents};
use rmcp::service::{ClientInitializeError, DynService, RoleClient, RunningService, ServiceError};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::ChatError;
use crate::types::{JsonObject, ToolContent, ToolDescriptor, ToolOutput};

use super::transport::{connect_stdio, ServerCommand};

type DynClientService = Box<dyn DynService<RoleClient>>;
pub type MCPRunningService = RunningService<RoleClient, DynClientService>;

/// Client for a Model Context Protocol server.
///
/// Owns the running service; closing the client terminates the server.
pub struct MCPClient {
    session: Mutex<Option<MCPRunningService>>,
}

impl MCPClient {
    /// Launch `command` and complete the MCP handshake.
    pub async fn connect(command: &ServerCommand) -> Result<Self, ChatError> {
        let session = connect_stdio(command).await?;
        Ok(Self::from_running_service(session))
    }

    /// Create a client from an already-running rmcp service.
    pub fn from_running_service(session: MCPRunningService) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }

    pub async fn is_closed(&self) -> bool {
        self.session
            .lock()
            .await
            .as_ref()
            .map_or(true, |session| session.is_closed())
    }

    /// List available tools from the MCP server.
    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ChatError> {
        let guard = self.session.lock().await;
        let session = open_session(guard.as_ref())?;

        let tools = match session.list_all_tools().await {
            Ok(tools) => tools,
            Err(ServiceError::UnexpectedResponse) => {
                let page = session
                    .list_tools(None)
                    .await
                    .map_err(|e| map_service_error("list_tools", e))?;
                page.tools
            }
            Err(e) => return Err(map_service_error("list_tools", e)),
        };

        Ok(tools.into_iter().map(map_mcp_tool).collect())
    }

    /// Execute a tool on the MCP server.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: JsonObject,
    ) -> Result<ToolOutput, ChatError> {
        let guard = self.session.lock().await;
        let session = open_session(guard.as_ref())?;

        debug!(tool = name, "MCP call_tool");
        let result = session
            .call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_owned().into(),
                arguments: Some(arguments),
                task: None,
            })
            .await
            .map_err(|e| map_tool_call_error(name, e))?;

        Ok(map_call_result(result))
    }

    /// Shut the server down. Later calls are no-ops.
    pub async fn close(&self) -> Result<(), ChatError> {
        let Some(session) = self.session.lock().await.take() else {
            return Ok(());
        };
        match session.cancel().await {
            Ok(reason) => {
                info!(?reason, "MCP session closed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "MCP session did not shut down cleanly");
                Err(ChatError::ProviderConnection(format!(
                    "failed to close MCP session: {e}"
                )))
            }
        }
    }
}

fn open_session(session: Option<&MCPRunningService>) -> Result<&MCPRunningService, ChatError> {
    match session {
        Some(session) if !session.is_closed() => Ok(session),
        _ => Err(ChatError::ProviderConnection("MCP session is closed".into())),
    }
}

fn map_mcp_tool(tool: rmcp::model::Tool) -> ToolDescriptor {
    ToolDescriptor {
        name: tool.name.to_string(),
        description: tool.description.map(|d| d.to_string()).unwrap_or_default(),
        input_schema: serde_json::Value::Object((*tool.input_schema).clone()),
    }
}

fn map_content(item: &Content) -> ToolContent {
    if let Some(text) = item.as_text() {
        return ToolContent::Text {
            text: text.text.clone(),
        };
    }
    if let Some(image) = item.as_image() {
        return ToolContent::Image {
            data: image.data.clone(),
            mime_type: image.mime_type.clone(),
        };
    }
    if let Some(resource) = item.as_resource() {
        return match &resource.resource {
            ResourceContents::TextResourceContents { uri, text, .. } => ToolContent::Resource {
                uri: uri.clone(),
                text: Some(text.clone()),
            },
            ResourceContents::BlobResourceContents { uri, .. } => ToolContent::Resource {
                uri: uri.clone(),
                text: None,
            },
        };
    }
    ToolContent::Other {
        value: serde_json::to_value(item).unwrap_or(serde_json::Value::Null),
    }
}

fn map_call_result(result: CallToolResult) -> ToolOutput {
    let mut content: Vec<ToolContent> = result.content.iter().map(map_content).collect();

    if content.is_empty() {
        if let Some(structured) = result.structured_content {
            content.push(ToolContent::text(structured.to_string()));
        }
    }

    ToolOutput {
        content,
        is_error: result.is_error.unwrap_or(false),
    }
}

pub(crate) fn map_client_initialize_error(error: ClientInitializeError) -> ChatError {
    match error {
        ClientInitializeError::ConnectionClosed(context) => {
            ChatError::ProviderConnection(format!("MCP initialize connection closed: {context}"))
        }
        ClientInitializeError::TransportError { error, context } => ChatError::ProviderConnection(
            format!("MCP initialize transport error ({context}): {error}"),
        ),
        ClientInitializeError::JsonRpcError(error) => ChatError::ProviderConnection(format!(
            "MCP initialize JSON-RPC error {}: {}",
            error.code.0, error.message
        )),
        ClientInitializeError::Cancelled => {
            ChatError::ProviderConnection("MCP initialize cancelled".into())
        }
        other => ChatError::ProviderConnection(format!("MCP initialize error: {other}")),
    }
}

fn map_service_error(context: &str, error: ServiceError) -> ChatError {
    match error {
        ServiceError::McpError(error) => ChatError::ProviderConnection(format!(
            "{context}: MCP error {}: {}",
            error.code.0, error.message
        )),
        ServiceError::TransportSend(error) => {
            ChatError::ProviderConnection(format!("{context}: MCP transport send failed: {error}"))
        }
        ServiceError::TransportClosed => {
            ChatError::ProviderConnection(format!("{context}: MCP transport closed"))
        }
        ServiceError::UnexpectedResponse => {
            ChatError::ProviderConnection(format!("{context}: unexpected MCP response"))
        }
        ServiceError::Cancelled { reason } => {
            let suffix = reason
                .as_deref()
                .map(|r| format!(" ({r})"))
                .unwrap_or_default();
            ChatError::ProviderConnection(format!("{context}: MCP request cancelled{suffix}"))
        }
        ServiceError::Timeout { timeout } => ChatError::Timeout(timeout.as_millis() as u64),
        other => ChatError::ProviderConnection(format!("{context}: MCP service error: {other}")),
    }
}

/// Tool-call failures are per-call errors, not connection loss.
fn map_tool_call_error(name: &str, error: ServiceError) -> ChatError {
    match error {
        ServiceError::McpError(error) => ChatError::tool(
            name,
            format!("MCP error {}: {}", error.code.0, error.message),
        ),
        ServiceError::Timeout { timeout } => ChatError::Timeout(timeout.as_millis() as u64),
        other => ChatError::tool(name, map_service_error("call_tool", other).to_string()),
    }
}
