//! Core query types for the conversation engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{ConversationTurn, TranscriptEntry, Usage};

/// Unique query identifier.
pub type QueryId = Uuid;

/// How a query's state machine ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The model produced a turn without tool requests.
    Completed,
    /// The round cap was hit while the model still wanted tools.
    Aborted,
}

/// Engine state between steps.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineState {
    AwaitingModel,
    HasToolRequest(ConversationTurn),
    Done,
    Aborted,
}

impl EngineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

/// Text fragments collected across the rounds of one query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembledAnswer {
    fragments: Vec<String>,
}

impl AssembledAnswer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment; empty fragments are dropped.
    pub fn push(&mut self, fragment: impl Into<String>) {
        let fragment = fragment.into();
        if !fragment.is_empty() {
            self.fragments.push(fragment);
        }
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Fragments joined by line breaks.
    pub fn flatten(&self) -> String {
        self.fragments.join("\n")
    }
}

/// Result of one completed query.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub query_id: QueryId,
    pub status: RunStatus,
    pub answer: String,
    /// Number of model calls issued.
    pub rounds: usize,
    pub usage: Usage,
    /// Full transcript at the end of the query, including the final turn.
    pub transcript: Vec<TranscriptEntry>,
}

impl QueryOutcome {
    pub fn is_aborted(&self) -> bool {
        self.status == RunStatus::Aborted
    }
}

/// Notice appended to the answer when the round cap stops a query.
pub fn truncation_notice(rounds: usize) -> String {
    format!("[Stopped after {rounds} rounds: tool-call limit reached]")
}
