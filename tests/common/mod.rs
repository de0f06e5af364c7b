//! Shared test helpers: a scripted model gateway and a mock tool provider.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use mcp_chat::agent::ChatSession;
use mcp_chat::config::ChatConfig;
use mcp_chat::error::ChatError;
use mcp_chat::provider::{ModelGateway, ProviderRequest};
use mcp_chat::tools::ToolProvider;
use mcp_chat::types::*;

/// A gateway that replays queued turns and records every request.
#[derive(Default)]
pub struct ScriptedGateway {
    turns: Mutex<VecDeque<Result<ConversationTurn, ChatError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a text-only turn.
    pub fn queue_text(&self, text: &str) {
        self.queue_turn(ConversationTurn::text(text).with_stop_reason(StopReason::EndTurn));
    }

    /// Queue a turn requesting one tool call, with optional preamble text.
    pub fn queue_tool_call(
        &self,
        preamble: Option<&str>,
        id: &str,
        name: &str,
        args: serde_json::Value,
    ) {
        self.queue_turn(tool_turn(preamble, &[(id, name, args)]));
    }

    pub fn queue_turn(&self, turn: ConversationTurn) {
        self.turns.lock().unwrap().push_back(Ok(turn));
    }

    pub fn queue_error(&self, error: ChatError) {
        self.turns.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<ConversationTurn, ChatError> {
        self.requests.lock().unwrap().push(request.clone());
        self.turns
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ChatError::InvalidState("no scripted turn left".into())))
    }
}

/// A gateway that never answers.
pub struct StalledGateway;

#[async_trait]
impl ModelGateway for StalledGateway {
    fn provider_name(&self) -> &str {
        "stalled"
    }

    async fn complete(&self, _request: &ProviderRequest) -> Result<ConversationTurn, ChatError> {
        std::future::pending().await
    }
}

type CallHandler = Box<dyn Fn(&str, &JsonObject) -> Result<ToolOutput, ChatError> + Send + Sync>;

/// In-memory tool provider with a call log.
pub struct MockToolProvider {
    tools: Vec<ToolDescriptor>,
    list_error: Option<String>,
    handler: CallHandler,
    calls: Mutex<Vec<(String, JsonObject)>>,
    list_calls: AtomicU32,
    shutdowns: AtomicU32,
}

impl MockToolProvider {
    /// Provider exposing `add(a, b)`, which sums its arguments.
    pub fn calculator() -> Self {
        Self::with_handler(vec![add_tool()], |name, args| match name {
            "add" => {
                let a = args.get("a").and_then(|v| v.as_f64()).unwrap_or_default();
                let b = args.get("b").and_then(|v| v.as_f64()).unwrap_or_default();
                Ok(text_output(&format_number(a + b)))
            }
            other => Err(ChatError::tool(other, "not implemented")),
        })
    }

    pub fn with_handler(
        tools: Vec<ToolDescriptor>,
        handler: impl Fn(&str, &JsonObject) -> Result<ToolOutput, ChatError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            tools,
            list_error: None,
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
            list_calls: AtomicU32::new(0),
            shutdowns: AtomicU32::new(0),
        }
    }

    /// Provider whose discovery fails.
    pub fn unreachable(message: &str) -> Self {
        let mut provider = Self::with_handler(Vec::new(), |name, _| {
            Err(ChatError::tool(name, "unreachable"))
        });
        provider.list_error = Some(message.to_string());
        provider
    }

    pub fn calls(&self) -> Vec<(String, JsonObject)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_names(&self) -> Vec<String> {
        self.calls().into_iter().map(|(name, _)| name).collect()
    }

    pub fn list_calls(&self) -> u32 {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> u32 {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolProvider for MockToolProvider {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ChatError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        match &self.list_error {
            Some(message) => Err(ChatError::ProviderConnection(message.clone())),
            None => Ok(self.tools.clone()),
        }
    }

    async fn call_tool(&self, name: &str, arguments: JsonObject) -> Result<ToolOutput, ChatError> {
        let result = (self.handler)(name, &arguments);
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments));
        result
    }

    async fn shutdown(&self) -> Result<(), ChatError> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Provider exposing `add` whose calls never finish.
pub struct StalledToolProvider {
    started: AtomicU32,
}

impl StalledToolProvider {
    pub fn new() -> Self {
        Self {
            started: AtomicU32::new(0),
        }
    }

    pub fn started(&self) -> u32 {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolProvider for StalledToolProvider {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ChatError> {
        Ok(vec![add_tool()])
    }

    async fn call_tool(&self, _name: &str, _arguments: JsonObject) -> Result<ToolOutput, ChatError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }

    async fn shutdown(&self) -> Result<(), ChatError> {
        Ok(())
    }
}

pub fn add_tool() -> ToolDescriptor {
    ToolDescriptor::new("add", "Add two numbers").with_input_schema(json!({
        "type": "object",
        "properties": {
            "a": { "type": "number" },
            "b": { "type": "number" }
        },
        "required": ["a", "b"]
    }))
}

pub fn text_output(text: &str) -> ToolOutput {
    ToolOutput {
        content: vec![ToolContent::text(text)],
        is_error: false,
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Build a turn with optional preamble text followed by tool calls.
pub fn tool_turn(preamble: Option<&str>, calls: &[(&str, &str, serde_json::Value)]) -> ConversationTurn {
    let mut segments = Vec::new();
    if let Some(text) = preamble {
        segments.push(TurnSegment::Text {
            text: text.to_string(),
        });
    }
    for (id, name, args) in calls {
        let request = ToolInvocationRequest::from_value(*id, *name, args.clone())
            .expect("test tool arguments should be an object");
        segments.push(TurnSegment::ToolCall(request));
    }
    ConversationTurn::new(segments).with_stop_reason(StopReason::ToolUse)
}

pub fn test_config() -> ChatConfig {
    ChatConfig {
        api_key: Some("sk-test".into()),
        ..ChatConfig::default()
    }
}

/// Session over the given provider and gateway with `config`.
pub async fn session_with(
    provider: Arc<MockToolProvider>,
    gateway: Arc<dyn ModelGateway>,
    config: &ChatConfig,
) -> ChatSession {
    ChatSession::new(provider, gateway, config)
        .await
        .expect("session should start")
}
