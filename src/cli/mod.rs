//! CLI entry point for mcp-chat.

pub mod chat;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use crate::agent_loop::{RunEventPayload, RunEventSink};
use crate::config::ChatConfig;
use crate::types::ToolInvocationRequest;

/// Chat with Claude using the tools of a local MCP server.
#[derive(Parser, Debug)]
#[command(name = "mcp-chat", version, about = "Chat with Claude using tools from an MCP server")]
pub struct Cli {
    /// Path to the MCP server script (.py or .js)
    pub server_script: Option<PathBuf>,

    /// Model identifier
    #[arg(short, long)]
    pub model: Option<String>,

    /// Max output tokens per model call
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Max model calls per query
    #[arg(long)]
    pub max_rounds: Option<usize>,

    /// System prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// Carry the conversation over between queries
    #[arg(long)]
    pub keep_history: bool,

    /// Send placeholder schemas instead of the server's tool schemas
    #[arg(long)]
    pub no_tool_schemas: bool,

    /// Config file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print rounds and tool results to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Apply flags on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut ChatConfig) {
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(max_tokens) = self.max_tokens {
            config.max_tokens = max_tokens;
        }
        if let Some(max_rounds) = self.max_rounds {
            config.max_rounds = max_rounds;
        }
        if let Some(system) = &self.system {
            config.system_prompt = Some(system.clone());
        }
        if self.keep_history {
            config.keep_history = true;
        }
        if self.no_tool_schemas {
            config.forward_tool_schemas = false;
        }
    }
}

/// Narration line for a tool call.
pub fn tool_call_notice(call: &ToolInvocationRequest) -> String {
    let args = serde_json::to_string(&call.arguments).unwrap_or_default();
    format!("[Calling tool {} with args {}]", call.name, args)
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Event sink that reports tool activity on stderr.
///
/// Tool calls are always narrated; `verbose` adds rounds, results and totals.
pub fn event_printer(verbose: bool) -> RunEventSink {
    Arc::new(move |event| match &event.payload {
        RunEventPayload::ToolCallStarted { call } => eprintln!("{}", tool_call_notice(call)),
        RunEventPayload::RoundStarted { round } if verbose => eprintln!("[round {round}]"),
        RunEventPayload::ToolResult { result } if verbose => {
            let label = if result.is_error { "error" } else { "ok" };
            eprintln!("  {label}: {}", truncate(&result.text(), 200));
        }
        RunEventPayload::Completed { rounds, usage } if verbose => {
            eprintln!("[done in {rounds} rounds, {} tokens]", usage.total_tokens());
        }
        RunEventPayload::Aborted { rounds, usage } if verbose => {
            eprintln!("[stopped after {rounds} rounds, {} tokens]", usage.total_tokens());
        }
        _ => {}
    })
}
