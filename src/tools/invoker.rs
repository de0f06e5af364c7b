//! Tool invoker: turns tool requests into tool results, never into errors.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ChatError;
use crate::types::{ToolInvocationRequest, ToolInvocationResult};
use crate::util::timeout::with_timeout;

use super::provider::ToolProvider;
use super::registry::ToolRegistry;

/// Resolves a single tool request.
///
/// Failures are reported as results with `is_error` set so the model can
/// react to them.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn invoke(&self, request: &ToolInvocationRequest) -> ToolInvocationResult;
}

/// Invoker that checks the registry before calling the provider.
pub struct RegistryInvoker {
    provider: Arc<dyn ToolProvider>,
    registry: Arc<ToolRegistry>,
    timeout: Duration,
}

impl RegistryInvoker {
    pub fn new(provider: Arc<dyn ToolProvider>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            registry,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ToolInvoker for RegistryInvoker {
    async fn invoke(&self, request: &ToolInvocationRequest) -> ToolInvocationResult {
        if !self.registry.contains(&request.name) {
            let err = ChatError::UnknownTool(request.name.clone());
            warn!(tool = %request.name, id = %request.id, "model requested unknown tool");
            return ToolInvocationResult::error(&request.id, err.to_string());
        }

        debug!(tool = %request.name, id = %request.id, "invoking tool");
        let call = self
            .provider
            .call_tool(&request.name, request.arguments.clone());

        match with_timeout(self.timeout, call).await {
            Ok(output) => ToolInvocationResult::from_output(&request.id, output),
            Err(err) => {
                let err = match err {
                    ChatError::ToolExecution { .. } => err,
                    other => ChatError::tool(&request.name, other.to_string()),
                };
                warn!(tool = %request.name, id = %request.id, error = %err, "tool call failed");
                ToolInvocationResult::error(&request.id, err.to_string())
            }
        }
    }
}
