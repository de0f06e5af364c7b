//! Anthropic Messages API provider.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::DEFAULT_BASE_URL;
use crate::error::ChatError;
use crate::types::*;

use super::http::{anthropic_headers, shared_client, status_to_error};
use super::{ModelGateway, ProviderRequest};

const API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }

    fn build_headers(&self) -> reqwest::header::HeaderMap {
        anthropic_headers(&self.api_key, API_VERSION)
    }

    fn build_request_body(&self, request: &ProviderRequest) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .filter_map(|entry| {
                let content = build_anthropic_content(&entry.content)?;
                Some(serde_json::json!({
                    "role": entry.role.to_string(),
                    "content": content,
                }))
            })
            .collect();

        let mut body = serde_json::json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "messages": messages,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(system) = request.system.as_ref().filter(|s| !s.is_empty()) {
                obj.insert("system".into(), system.clone().into());
            }
            if !request.tools.is_empty() {
                let tool_defs: Vec<serde_json::Value> = request
                    .tools
                    .iter()
                    .map(|t| {
                        serde_json::json!({
                            "name": t.name,
                            "description": t.description,
                            "input_schema": t.input_schema,
                        })
                    })
                    .collect();
                obj.insert("tools".into(), tool_defs.into());
            }
        }

        body
    }
}

#[async_trait]
impl ModelGateway for AnthropicProvider {
    fn provider_name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<ConversationTurn, ChatError> {
        let body = self.build_request_body(request);
        let url = format!("{}/messages", self.base_url);

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Anthropic complete"
        );

        let resp = shared_client()
            .post(&url)
            .headers(self.build_headers())
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let headers = resp.headers().clone();
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &headers, &body_text));
        }

        let data: AnthropicResponse = resp.json().await?;
        parse_response(data)
    }
}

/// Render entry content; `None` when nothing is left to send.
fn build_anthropic_content(parts: &[ContentPart]) -> Option<serde_json::Value> {
    if let [ContentPart::Text { text }] = parts {
        return (!text.is_empty()).then(|| serde_json::Value::String(text.clone()));
    }

    let content: Vec<serde_json::Value> = parts
        .iter()
        .filter_map(|part| match part {
            ContentPart::Text { text } if text.is_empty() => None,
            ContentPart::Text { text } => Some(serde_json::json!({
                "type": "text",
                "text": text,
            })),
            ContentPart::ToolCall(call) => Some(serde_json::json!({
                "type": "tool_use",
                "id": call.id,
                "name": call.name,
                "input": call.arguments,
            })),
            ContentPart::ToolResult(result) => Some(serde_json::json!({
                "type": "tool_result",
                "tool_use_id": result.request_id,
                "content": build_tool_result_content(&result.content),
                "is_error": result.is_error,
            })),
        })
        .collect();

    (!content.is_empty()).then(|| serde_json::json!(content))
}

fn build_tool_result_content(blocks: &[ToolContent]) -> serde_json::Value {
    if blocks.is_empty() {
        return serde_json::Value::String(String::new());
    }

    let content: Vec<serde_json::Value> = blocks
        .iter()
        .map(|block| match block {
            ToolContent::Text { text } => serde_json::json!({ "type": "text", "text": text }),
            ToolContent::Image { data, mime_type } => serde_json::json!({
                "type": "image",
                "source": {
                    "type": "base64",
                    "media_type": mime_type,
                    "data": data,
                }
            }),
            ToolContent::Resource { uri, text } => serde_json::json!({
                "type": "text",
                "text": text.clone().unwrap_or_else(|| uri.clone()),
            }),
            ToolContent::Other { value } => serde_json::json!({
                "type": "text",
                "text": value.to_string(),
            }),
        })
        .collect();

    serde_json::json!(content)
}

fn parse_response(data: AnthropicResponse) -> Result<ConversationTurn, ChatError> {
    let mut segments = Vec::with_capacity(data.content.len());

    for block in data.content {
        match block {
            AnthropicContentBlock::Text { text } => segments.push(TurnSegment::Text { text }),
            AnthropicContentBlock::ToolUse { id, name, input } => {
                let request = ToolInvocationRequest::from_value(id, name, input)
                    .map_err(|e| ChatError::MalformedResponse(e.to_string()))?;
                segments.push(TurnSegment::ToolCall(request));
            }
            AnthropicContentBlock::Unknown => {
                debug!("skipping unsupported Anthropic content block");
            }
        }
    }

    let stop_reason = data
        .stop_reason
        .as_deref()
        .and_then(|reason| reason.parse::<StopReason>().ok());

    Ok(ConversationTurn {
        segments,
        usage: Usage {
            input_tokens: data.usage.input_tokens,
            output_tokens: data.usage.output_tokens,
            cache_read_tokens: data.usage.cache_read_input_tokens,
            cache_creation_tokens: data.usage.cache_creation_input_tokens,
        },
        stop_reason,
    })
}

// Internal Anthropic response types

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: AnthropicUsage,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize, Default)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
    #[serde(default)]
    cache_read_input_tokens: Option<u32>,
    #[serde(default)]
    cache_creation_input_tokens: Option<u32>,
}
