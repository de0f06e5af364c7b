//! Transcript entries exchanged with the model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use super::tool::{ToolInvocationRequest, ToolInvocationResult};
use super::turn::{ConversationTurn, TurnSegment};

/// Conversation role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single part of an entry's content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ToolCall(ToolInvocationRequest),
    ToolResult(ToolInvocationResult),
}

/// One entry of the transcript sent to the model on every round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: Vec<ContentPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TranscriptEntry {
    /// Create a user entry holding plain text.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentPart::Text { text: text.into() }],
            timestamp: Some(Utc::now()),
        }
    }

    /// Create an assistant entry mirroring a model turn, segment for segment.
    pub fn from_turn(turn: &ConversationTurn) -> Self {
        let content = turn
            .segments
            .iter()
            .map(|segment| match segment {
                TurnSegment::Text { text } => ContentPart::Text { text: text.clone() },
                TurnSegment::ToolCall(request) => ContentPart::ToolCall(request.clone()),
            })
            .collect();
        Self {
            role: Role::Assistant,
            content,
            timestamp: Some(Utc::now()),
        }
    }

    /// Create a user entry carrying tool results.
    pub fn tool_results(results: Vec<ToolInvocationResult>) -> Self {
        Self {
            role: Role::User,
            content: results.into_iter().map(ContentPart::ToolResult).collect(),
            timestamp: Some(Utc::now()),
        }
    }

    /// Extract the text content, concatenating all text parts.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Tool requests carried by this entry.
    pub fn tool_calls(&self) -> Vec<&ToolInvocationRequest> {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::ToolCall(tc) => Some(tc),
                _ => None,
            })
            .collect()
    }

    /// Tool results carried by this entry.
    pub fn tool_results_iter(&self) -> impl Iterator<Item = &ToolInvocationResult> {
        self.content.iter().filter_map(|part| match part {
            ContentPart::ToolResult(tr) => Some(tr),
            _ => None,
        })
    }
}

/// Check that every tool request in an assistant entry is answered, by id,
/// in the user entry immediately after it.
pub fn tool_calls_are_paired(transcript: &[TranscriptEntry]) -> bool {
    transcript.iter().enumerate().all(|(index, entry)| {
        let calls = entry.tool_calls();
        if entry.role != Role::Assistant || calls.is_empty() {
            return true;
        }
        let Some(next) = transcript.get(index + 1) else {
            return false;
        };
        if next.role != Role::User {
            return false;
        }
        let result_ids: Vec<&str> = next
            .tool_results_iter()
            .map(|r| r.request_id.as_str())
            .collect();
        calls.len() == result_ids.len() && calls.iter().all(|c| result_ids.contains(&c.id.as_str()))
    })
}
