//! Model gateway trait and the Anthropic Messages implementation.

pub mod anthropic;
pub mod http;

use async_trait::async_trait;
use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;
use crate::types::{ConversationTurn, TranscriptEntry};

pub use anthropic::AnthropicProvider;

/// Tool definition sent to the model API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// A request sent to the model.
#[derive(Debug, Clone, Builder)]
pub struct ProviderRequest {
    #[builder(into)]
    pub model: String,
    pub max_tokens: u32,
    #[builder(into)]
    pub system: Option<String>,
    #[builder(default)]
    pub messages: Vec<TranscriptEntry>,
    #[builder(default)]
    pub tools: Vec<ToolDefinition>,
}

/// The language-model request/response service.
///
/// Implementations do not retry; retry policy belongs to the caller.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Provider name (e.g., "anthropic").
    fn provider_name(&self) -> &str;

    /// Produce one assistant turn for the given transcript and tools.
    async fn complete(&self, request: &ProviderRequest) -> Result<ConversationTurn, ChatError>;
}
