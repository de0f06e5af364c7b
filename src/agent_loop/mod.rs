//! Conversation engine primitives (queries, events, runner).

pub mod events;
pub mod runner;
pub mod types;

pub use events::{RunEvent, RunEventPayload, RunEventSink};
pub use runner::{ConversationEngine, EngineSettings};
pub use types::*;
