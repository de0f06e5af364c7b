//! Stdio transport: launches the MCP server as a child process.

use std::path::{Path, PathBuf};

use rmcp::model::ClientInfo;
use rmcp::service::ServiceExt;
use rmcp::transport::TokioChildProcess;
use tokio::process::Command;
use tracing::info;

use crate::error::ChatError;

use super::client::{map_client_initialize_error, MCPRunningService};

/// Interpreter used to run a server script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerKind {
    Python,
    Node,
}

impl ServerKind {
    /// Pick the interpreter from the script's file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("py") => Some(Self::Python),
            Some("js") => Some(Self::Node),
            _ => None,
        }
    }

    pub fn program(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Node => "node",
        }
    }
}

/// Launch parameters for a stdio MCP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ServerCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Command for a `.py` or `.js` server script, passed as the only argument.
    pub fn for_script(path: impl Into<PathBuf>) -> Result<Self, ChatError> {
        let path = path.into();
        let kind = ServerKind::from_path(&path).ok_or_else(|| {
            ChatError::Startup(
                "Server script must be a Python (.py) or JavaScript (.js) file.".into(),
            )
        })?;
        if !path.is_file() {
            return Err(ChatError::Startup(format!(
                "Server script not found: {}",
                path.display()
            )));
        }
        Ok(Self::new(
            kind.program(),
            vec![path.to_string_lossy().into_owned()],
        ))
    }
}

/// Spawn the server and run the MCP initialize handshake over its stdio.
///
/// The child inherits the parent environment.
pub async fn connect_stdio(command: &ServerCommand) -> Result<MCPRunningService, ChatError> {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args);

    let transport = TokioChildProcess::new(cmd).map_err(|e| {
        ChatError::ProviderConnection(format!("failed to launch '{}': {e}", command.program))
    })?;

    let session = ClientInfo::default()
        .into_dyn()
        .serve(transport)
        .await
        .map_err(map_client_initialize_error)?;

    info!(program = %command.program, args = ?command.args, "MCP server connected");
    Ok(session)
}
