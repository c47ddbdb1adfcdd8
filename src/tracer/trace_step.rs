//! Trace records for observed model and tool calls

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::warn;

/// What kind of call a [`TraceStep`] observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    Model,
    Tool,
}

/// How an observed call settled
///
/// A finished step carries exactly one of `output` or `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraceOutcome {
    Output { output: Value },
    Error { error: String },
}

/// One observed invocation
///
/// Serializes to the export shape
/// `{type, name, chatId, input, output?, error?, latency}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    #[serde(rename = "type")]
    pub kind: TraceKind,
    pub name: String,
    #[serde(rename = "chatId")]
    pub session_id: String,
    pub input: Value,
    #[serde(flatten)]
    pub outcome: TraceOutcome,
    /// Wall-clock duration of the call in milliseconds
    #[serde(rename = "latency")]
    pub latency_ms: u64,
}

impl TraceStep {
    pub fn output(&self) -> Option<&Value> {
        match &self.outcome {
            TraceOutcome::Output { output } => Some(output),
            TraceOutcome::Error { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            TraceOutcome::Output { .. } => None,
            TraceOutcome::Error { error } => Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, TraceOutcome::Error { .. })
    }
}

/// A step whose call is still running
///
/// Started right before the wrapped call and settled exactly once when it returns.
#[derive(Debug)]
pub struct PendingTraceStep {
    kind: TraceKind,
    name: String,
    session_id: String,
    input: Value,
    started: Instant,
}

impl PendingTraceStep {
    pub fn start(
        kind: TraceKind,
        name: impl Into<String>,
        session_id: impl Into<String>,
        input: Value,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            session_id: session_id.into(),
            input,
            started: Instant::now(),
        }
    }

    /// Finish the step from the call's result
    pub fn settle<T: Serialize>(self, result: &Result<T>) -> TraceStep {
        let outcome = match result {
            Ok(value) => TraceOutcome::Output {
                output: to_trace_value(value),
            },
            Err(e) => TraceOutcome::Error {
                error: e.to_string(),
            },
        };
        self.finish(outcome)
    }

    pub fn finish(self, outcome: TraceOutcome) -> TraceStep {
        let latency_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        TraceStep {
            kind: self.kind,
            name: self.name,
            session_id: self.session_id,
            input: self.input,
            outcome,
            latency_ms,
        }
    }
}

/// Serialize a traced value; a value that cannot be represented is recorded as `null`.
pub fn to_trace_value<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        warn!(error = %e, "Traced value is not serializable");
        Value::Null
    })
}
