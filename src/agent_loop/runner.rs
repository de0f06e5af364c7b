//! Conversation engine: the per-query model/tool loop.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::provider::{ModelGateway, ProviderRequest, ToolDefinition};
use crate::tools::{ToolInvoker, ToolRegistry};
use crate::types::{ConversationTurn, TranscriptEntry, Usage};
use crate::util::retry::RetryPolicy;
use crate::util::timeout::{with_cancellation, with_timeout};

use super::events::{RunEventEmitter, RunEventPayload, RunEventSink};
use super::types::{truncation_notice, AssembledAnswer, EngineState, QueryOutcome, RunStatus};

/// Per-session knobs for the engine.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub model: String,
    pub max_tokens: u32,
    pub system_prompt: Option<String>,
    /// Maximum model calls per query.
    pub max_rounds: usize,
    pub forward_tool_schemas: bool,
    pub model_timeout: Duration,
    pub retry: RetryPolicy,
}

impl EngineSettings {
    pub fn from_config(config: &ChatConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            system_prompt: config.system_prompt.clone(),
            max_rounds: config.max_rounds.max(1),
            forward_tool_schemas: config.forward_tool_schemas,
            model_timeout: config.model_timeout,
            retry: RetryPolicy::with_retries(config.model_retries),
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&ChatConfig::default())
    }
}

/// Drives one query at a time through model calls and tool invocations.
pub struct ConversationEngine {
    gateway: Arc<dyn ModelGateway>,
    invoker: Arc<dyn ToolInvoker>,
    tools: Vec<ToolDefinition>,
    settings: EngineSettings,
    event_sink: Option<RunEventSink>,
}

impl ConversationEngine {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        invoker: Arc<dyn ToolInvoker>,
        registry: &ToolRegistry,
        settings: EngineSettings,
    ) -> Self {
        let tools = registry.definitions(settings.forward_tool_schemas);
        Self {
            gateway,
            invoker,
            tools,
            settings,
            event_sink: None,
        }
    }

    pub fn with_event_sink(mut self, sink: RunEventSink) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Process a query against a fresh transcript.
    pub async fn process_query(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<QueryOutcome, ChatError> {
        self.process_query_with_history(&[], query, cancel).await
    }

    /// Process a query, seeding the transcript with earlier entries.
    ///
    /// Model errors and cancellation end the query with `Err`; tool failures
    /// never do.
    pub async fn process_query_with_history(
        &self,
        history: &[TranscriptEntry],
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<QueryOutcome, ChatError> {
        let query_id = Uuid::new_v4();
        let emitter = RunEventEmitter::new(query_id, self.event_sink.clone());

        let mut transcript = history.to_vec();
        transcript.push(TranscriptEntry::user(query));

        let mut answer = AssembledAnswer::new();
        let mut usage = Usage::default();
        let mut rounds = 0usize;
        let mut state = EngineState::AwaitingModel;

        debug!(%query_id, history = history.len(), "query start");

        while !state.is_terminal() {
            state = match state {
                EngineState::AwaitingModel => {
                    rounds += 1;
                    emitter.emit(RunEventPayload::RoundStarted { round: rounds });

                    let turn = self.request_turn(&transcript, cancel).await.map_err(|e| {
                        warn!(%query_id, round = rounds, error = %e, "model call failed");
                        e
                    })?;
                    usage.merge(&turn.usage);

                    for text in turn.texts() {
                        answer.push(text);
                    }

                    debug!(
                        %query_id,
                        round = rounds,
                        tool_requests = turn.tool_requests().len(),
                        stop_reason = ?turn.stop_reason,
                        "model turn received"
                    );

                    if turn.has_tool_requests() {
                        EngineState::HasToolRequest(turn)
                    } else {
                        transcript.push(TranscriptEntry::from_turn(&turn));
                        EngineState::Done
                    }
                }
                EngineState::HasToolRequest(turn) => {
                    if rounds >= self.settings.max_rounds {
                        EngineState::Aborted
                    } else {
                        let mut results = Vec::new();
                        for request in turn.tool_requests() {
                            emitter.emit(RunEventPayload::ToolCallStarted {
                                call: request.clone(),
                            });
                            let result =
                                with_cancellation(cancel, self.invoker.invoke(request)).await?;
                            emitter.emit(RunEventPayload::ToolResult {
                                result: result.clone(),
                            });
                            results.push(result);
                        }
                        transcript.push(TranscriptEntry::from_turn(&turn));
                        transcript.push(TranscriptEntry::tool_results(results));
                        EngineState::AwaitingModel
                    }
                }
                terminal => terminal,
            };
        }

        let status = if matches!(state, EngineState::Aborted) {
            answer.push(truncation_notice(rounds));
            emitter.emit(RunEventPayload::Aborted { rounds, usage });
            warn!(%query_id, rounds, "round limit reached, stopping query");
            RunStatus::Aborted
        } else {
            emitter.emit(RunEventPayload::Completed { rounds, usage });
            info!(
                %query_id,
                rounds,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "query completed"
            );
            RunStatus::Completed
        };

        Ok(QueryOutcome {
            query_id,
            status,
            answer: answer.flatten(),
            rounds,
            usage,
            transcript,
        })
    }

    async fn request_turn(
        &self,
        transcript: &[TranscriptEntry],
        cancel: &CancellationToken,
    ) -> Result<ConversationTurn, ChatError> {
        let request = ProviderRequest::builder()
            .model(self.settings.model.clone())
            .max_tokens(self.settings.max_tokens)
            .maybe_system(self.settings.system_prompt.clone())
            .messages(transcript.to_vec())
            .tools(self.tools.clone())
            .build();

        let timeout = self.settings.model_timeout;
        let gateway = self.gateway.as_ref();
        let request = &request;
        let call = self
            .settings
            .retry
            .execute(move || with_timeout(timeout, gateway.complete(request)));

        with_cancellation(cancel, call).await?
    }
}
