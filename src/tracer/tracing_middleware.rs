//! Middleware that turns every model and tool call into a [`TraceStep`]
//!
//! The middleware only observes. It forwards the request untouched, hands back exactly
//! what the wrapped call returned (value or error), and reports a finished step to its
//! callback on the way out.

use super::trace_step::{to_trace_value, PendingTraceStep, TraceKind, TraceStep};
use super::trace_store::{TraceCallback, TraceStore};
use crate::agent::middleware::{AgentMiddleware, ModelNext, ModelRequest, ToolCallRequest, ToolNext};
use crate::error::Result;
use crate::llm::models::LlmGatewayResponse;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Name recorded for model calls when the request carries no model name
pub const DEFAULT_MODEL_NAME: &str = "llm";

/// Records model and tool calls through an injected callback
///
/// Holds nothing but the callback. Timing lives on each call's stack, so a single
/// instance can wrap concurrent calls from any number of sessions.
#[derive(Clone)]
pub struct TracingMiddleware {
    on_trace: TraceCallback,
}

impl TracingMiddleware {
    pub fn new(on_trace: TraceCallback) -> Self {
        Self { on_trace }
    }

    /// Middleware appending every step into `store`
    pub fn recording_into(store: &Arc<TraceStore>) -> Self {
        Self::new(store.recorder())
    }

    fn emit(&self, step: TraceStep) {
        (self.on_trace)(step);
    }
}

#[async_trait]
impl AgentMiddleware for TracingMiddleware {
    fn name(&self) -> &str {
        "TracingMiddleware"
    }

    async fn wrap_model_call(
        &self,
        request: ModelRequest,
        next: ModelNext<'_>,
    ) -> Result<LlmGatewayResponse> {
        let chat_id = request.context.require_chat_id()?.to_string();
        let name = if request.model.trim().is_empty() {
            DEFAULT_MODEL_NAME.to_string()
        } else {
            request.model.clone()
        };
        let pending = PendingTraceStep::start(
            TraceKind::Model,
            name,
            chat_id,
            to_trace_value(&request.messages),
        );

        let result = next.run(request).await;

        self.emit(pending.settle(&result));
        result
    }

    async fn wrap_tool_call(&self, request: ToolCallRequest, next: ToolNext<'_>) -> Result<Value> {
        let chat_id = request.context.require_chat_id()?.to_string();
        let pending = PendingTraceStep::start(
            TraceKind::Tool,
            request.tool_call.name.clone(),
            chat_id,
            to_trace_value(&request.tool_call.arguments),
        );

        let result = next.run(request).await;

        self.emit(pending.settle(&result));
        result
    }
}
