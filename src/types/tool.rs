//! Tool descriptors, invocation requests and invocation results.

use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// JSON object used for tool arguments and input schemas.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// A tool discovered on the tool provider.
///
/// Names are unique within a session. The set is discovered once and never
/// changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: serde_json::json!({ "type": "object" }),
        }
    }

    pub fn with_input_schema(mut self, schema: serde_json::Value) -> Self {
        self.input_schema = schema;
        self
    }
}

/// A tool call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolInvocationRequest {
    /// Correlation id, unique within one turn.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: JsonObject,
}

impl ToolInvocationRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: JsonObject) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Build a request from a loosely typed `input` value.
    ///
    /// Accepts an object, `null`, or a string holding a JSON object.
    pub fn from_value(
        id: impl Into<String>,
        name: impl Into<String>,
        input: serde_json::Value,
    ) -> Result<Self, ChatError> {
        Ok(Self::new(id, name, coerce_tool_arguments(input)?))
    }
}

/// One block of tool output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolContent {
    Text {
        text: String,
    },
    Image {
        data: String,
        mime_type: String,
    },
    Resource {
        uri: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    /// Any other block kind, kept verbatim.
    Other {
        value: serde_json::Value,
    },
}

impl ToolContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Text view of this block, if it has one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Resource {
                text: Some(text), ..
            } => Some(text),
            _ => None,
        }
    }
}

/// Raw output of a tool provider call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    pub content: Vec<ToolContent>,
    pub is_error: bool,
}

/// Result of resolving one [`ToolInvocationRequest`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolInvocationResult {
    /// Id of the originating request.
    pub request_id: String,
    pub content: Vec<ToolContent>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolInvocationResult {
    pub fn success(request_id: impl Into<String>, content: Vec<ToolContent>) -> Self {
        Self {
            request_id: request_id.into(),
            content,
            is_error: false,
        }
    }

    /// Error result carrying a single text block with the message.
    pub fn error(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            content: vec![ToolContent::text(message)],
            is_error: true,
        }
    }

    pub fn from_output(request_id: impl Into<String>, output: ToolOutput) -> Self {
        Self {
            request_id: request_id.into(),
            content: output.content,
            is_error: output.is_error,
        }
    }

    /// All text blocks joined by newlines.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(ToolContent::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn coerce_tool_arguments(value: serde_json::Value) -> Result<JsonObject, ChatError> {
    match value {
        serde_json::Value::Null => Ok(JsonObject::new()),
        serde_json::Value::Object(map) => Ok(map),
        serde_json::Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(JsonObject::new());
            }
            let parsed: serde_json::Value = serde_json::from_str(trimmed).map_err(|e| {
                ChatError::InvalidArgument(format!("tool arguments must be valid JSON: {e}"))
            })?;
            coerce_tool_arguments(parsed)
        }
        other => Err(ChatError::InvalidArgument(format!(
            "tool arguments must be a JSON object; got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_value_accepts_object_null_and_stringified_object() {
        let from_obj = ToolInvocationRequest::from_value("t1", "add", json!({"a": 2}))
            .expect("object arguments should parse");
        assert_eq!(from_obj.arguments.get("a"), Some(&json!(2)));

        let from_null = ToolInvocationRequest::from_value("t2", "ping", json!(null))
            .expect("null arguments should parse");
        assert!(from_null.arguments.is_empty());

        let from_str = ToolInvocationRequest::from_value("t3", "add", json!(r#"{"b":3}"#))
            .expect("stringified object should parse");
        assert_eq!(from_str.arguments.get("b"), Some(&json!(3)));
    }

    #[test]
    fn from_value_rejects_non_object() {
        let err = ToolInvocationRequest::from_value("t1", "add", json!([1, 2]))
            .expect_err("array arguments should be rejected");
        assert!(matches!(err, ChatError::InvalidArgument(_)));
    }

    #[test]
    fn from_value_rejects_malformed_json_string() {
        let err = ToolInvocationRequest::from_value("t1", "add", json!(r#"{"a":1"#))
            .expect_err("malformed JSON string should be rejected");
        assert!(
            matches!(err, ChatError::InvalidArgument(message) if message.contains("valid JSON"))
        );
    }

    #[test]
    fn result_text_joins_text_and_resource_blocks() {
        let result = ToolInvocationResult::success(
            "t1",
            vec![
                ToolContent::text("first"),
                ToolContent::Image {
                    data: "aGk=".into(),
                    mime_type: "image/png".into(),
                },
                ToolContent::Resource {
                    uri: "file:///notes.txt".into(),
                    text: Some("second".into()),
                },
            ],
        );
        assert_eq!(result.text(), "first\nsecond");
        assert!(!result.is_error);
    }

    #[test]
    fn error_result_is_flagged() {
        let result = ToolInvocationResult::error("t9", "boom");
        assert!(result.is_error);
        assert_eq!(result.request_id, "t9");
        assert_eq!(result.text(), "boom");
    }
}
