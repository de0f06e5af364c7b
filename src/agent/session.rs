//! Chat session: owns the tool provider connection and the engine.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::agent_loop::{ConversationEngine, EngineSettings, QueryOutcome, RunEventSink, RunStatus};
use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::mcp::{MCPToolAdapter, ServerCommand};
use crate::provider::{AnthropicProvider, ModelGateway};
use crate::tools::{RegistryInvoker, ToolProvider, ToolRegistry};
use crate::types::TranscriptEntry;

/// One connected chat session.
///
/// Tools are discovered once at construction. Call [`ChatSession::close`]
/// before dropping to shut the provider down.
pub struct ChatSession {
    provider: Arc<dyn ToolProvider>,
    registry: Arc<ToolRegistry>,
    engine: ConversationEngine,
    /// `Some` when transcripts carry over between queries.
    history: Option<Vec<TranscriptEntry>>,
}

impl ChatSession {
    /// Build a session on an already-connected provider.
    ///
    /// A discovery failure shuts the provider down and is returned as a
    /// provider connection error.
    pub async fn new(
        provider: Arc<dyn ToolProvider>,
        gateway: Arc<dyn ModelGateway>,
        config: &ChatConfig,
    ) -> Result<Self, ChatError> {
        let registry = match ToolRegistry::discover(provider.as_ref()).await {
            Ok(registry) => Arc::new(registry),
            Err(e) => {
                if let Err(close_err) = provider.shutdown().await {
                    warn!(error = %close_err, "provider shutdown after failed discovery");
                }
                return Err(e);
            }
        };

        let invoker = RegistryInvoker::new(provider.clone(), registry.clone())
            .with_timeout(config.tool_timeout);
        let engine = ConversationEngine::new(
            gateway,
            Arc::new(invoker),
            &registry,
            EngineSettings::from_config(config),
        );

        Ok(Self {
            provider,
            registry,
            engine,
            history: config.keep_history.then(Vec::new),
        })
    }

    /// Launch the server script, connect to it and to the model API.
    pub async fn connect(script: impl AsRef<Path>, config: &ChatConfig) -> Result<Self, ChatError> {
        let command = ServerCommand::for_script(script.as_ref())?;
        let api_key = config.require_api_key()?.to_string();
        let gateway = Arc::new(AnthropicProvider::new(
            api_key,
            Some(config.base_url.clone()),
        ));

        let provider = Arc::new(MCPToolAdapter::connect(&command).await?);
        info!(program = %command.program, "tool server started");
        Self::new(provider, gateway, config).await
    }

    pub fn with_event_sink(mut self, sink: RunEventSink) -> Self {
        self.engine = self.engine.with_event_sink(sink);
        self
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.registry.names()
    }

    /// Transcript carried into the next query; empty unless history is kept.
    pub fn history(&self) -> &[TranscriptEntry] {
        self.history.as_deref().unwrap_or(&[])
    }

    /// Run one user query to completion.
    ///
    /// Only completed queries are added to the kept history.
    pub async fn process_query(
        &mut self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<QueryOutcome, ChatError> {
        let outcome = self
            .engine
            .process_query_with_history(self.history(), query, cancel)
            .await?;

        if let Some(history) = self.history.as_mut() {
            if outcome.status == RunStatus::Completed {
                history.clone_from(&outcome.transcript);
            }
        }
        Ok(outcome)
    }

    /// Shut down the tool provider. Safe to call more than once.
    pub async fn close(&self) -> Result<(), ChatError> {
        self.provider.shutdown().await
    }
}
