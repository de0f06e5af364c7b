//! Convenience re-exports for common use.

pub use crate::agent::ChatSession;
pub use crate::agent_loop::{ConversationEngine, EngineSettings, QueryOutcome, RunStatus};
pub use crate::config::ChatConfig;
pub use crate::error::{ChatError, Result};
pub use crate::provider::{ModelGateway, ProviderRequest};
pub use crate::tools::{ToolInvoker, ToolProvider, ToolRegistry};
pub use crate::types::{
    ContentPart, ConversationTurn, Role, ToolContent, ToolDescriptor, ToolInvocationRequest,
    ToolInvocationResult, TranscriptEntry, TurnSegment, Usage,
};
