//! Run event types emitted while a query is processed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ToolInvocationRequest, ToolInvocationResult, Usage};

use super::types::QueryId;

/// Callback used for run events.
pub type RunEventSink = Arc<dyn Fn(RunEvent) + Send + Sync>;

/// Concrete event payloads emitted by the conversation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEventPayload {
    RoundStarted { round: usize },
    ToolCallStarted { call: ToolInvocationRequest },
    ToolResult { result: ToolInvocationResult },
    Completed { rounds: usize, usage: Usage },
    Aborted { rounds: usize, usage: Usage },
}

/// Envelope for run events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub query_id: QueryId,
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub payload: RunEventPayload,
}

pub(crate) struct RunEventEmitter {
    query_id: QueryId,
    seq: AtomicU64,
    sink: Option<RunEventSink>,
}

impl RunEventEmitter {
    pub(crate) fn new(query_id: QueryId, sink: Option<RunEventSink>) -> Self {
        Self {
            query_id,
            seq: AtomicU64::new(1),
            sink,
        }
    }

    pub(crate) fn emit(&self, payload: RunEventPayload) {
        let Some(sink) = &self.sink else {
            return;
        };
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        (sink)(RunEvent {
            query_id: self.query_id,
            seq,
            timestamp: Utc::now(),
            payload,
        });
    }
}
