//! A single assistant turn returned by the model.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::tool::ToolInvocationRequest;
use super::usage::Usage;

/// One segment of an assistant turn, in the order the model produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnSegment {
    Text { text: String },
    ToolCall(ToolInvocationRequest),
}

/// Why the model stopped producing output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    ToolUse,
}

/// One model response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConversationTurn {
    pub segments: Vec<TurnSegment>,
    #[serde(default)]
    pub usage: Usage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<StopReason>,
}

impl ConversationTurn {
    pub fn new(segments: Vec<TurnSegment>) -> Self {
        Self {
            segments,
            ..Default::default()
        }
    }

    /// A turn holding a single text segment.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![TurnSegment::Text { text: text.into() }])
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_stop_reason(mut self, reason: StopReason) -> Self {
        self.stop_reason = Some(reason);
        self
    }

    /// Tool requests in segment order.
    pub fn tool_requests(&self) -> Vec<&ToolInvocationRequest> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                TurnSegment::ToolCall(request) => Some(request),
                TurnSegment::Text { .. } => None,
            })
            .collect()
    }

    pub fn has_tool_requests(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, TurnSegment::ToolCall(_)))
    }

    /// Text segments in segment order.
    pub fn texts(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                TurnSegment::Text { text } => Some(text.as_str()),
                TurnSegment::ToolCall(_) => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JsonObject;

    #[test]
    fn segment_order_is_preserved_in_accessors() {
        let turn = ConversationTurn::new(vec![
            TurnSegment::Text {
                text: "Let me check.".into(),
            },
            TurnSegment::ToolCall(ToolInvocationRequest::new("a", "first", JsonObject::new())),
            TurnSegment::Text {
                text: "And another.".into(),
            },
            TurnSegment::ToolCall(ToolInvocationRequest::new("b", "second", JsonObject::new())),
        ]);

        assert!(turn.has_tool_requests());
        assert_eq!(turn.texts(), vec!["Let me check.", "And another."]);
        let ids: Vec<_> = turn.tool_requests().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn stop_reason_parses_wire_names() {
        assert_eq!("tool_use".parse::<StopReason>().ok(), Some(StopReason::ToolUse));
        assert_eq!(StopReason::EndTurn.to_string(), "end_turn");
        assert!("bogus".parse::<StopReason>().is_err());
    }
}
