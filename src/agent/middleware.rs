//! Interception points around model and tool calls
//!
//! A middleware receives the outgoing request plus a `next` handler and decides what to
//! do around it. Middlewares run outermost-first in registration order; the innermost
//! `next` performs the real call.

use super::context::InvocationContext;
use crate::error::{HarnessError, Result};
use crate::llm::broker::LlmBroker;
use crate::llm::models::{LlmGatewayResponse, LlmMessage, LlmToolCall};
use crate::llm::tools::{LlmTool, ToolDescriptor};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// A model call about to be made
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Name of the model the broker targets
    pub model: String,
    /// Prepended to `messages` by the model endpoint, not part of the history
    pub system_prompt: Option<String>,
    pub messages: Vec<LlmMessage>,
    pub tools: Vec<ToolDescriptor>,
    pub context: InvocationContext,
}

/// A tool call about to be executed
#[derive(Debug, Clone)]
pub struct ToolCallRequest {
    pub tool_call: LlmToolCall,
    pub context: InvocationContext,
}

/// Hooks wrapping every model and tool call an [`Agent`](super::Agent) makes
///
/// Both hooks default to forwarding the request untouched.
#[async_trait]
pub trait AgentMiddleware: Send + Sync {
    fn name(&self) -> &str;

    async fn wrap_model_call(
        &self,
        request: ModelRequest,
        next: ModelNext<'_>,
    ) -> Result<LlmGatewayResponse> {
        next.run(request).await
    }

    async fn wrap_tool_call(&self, request: ToolCallRequest, next: ToolNext<'_>) -> Result<Value> {
        next.run(request).await
    }
}

/// The rest of the model-call chain
pub struct ModelNext<'a> {
    middleware: &'a [Arc<dyn AgentMiddleware>],
    broker: &'a LlmBroker,
}

impl<'a> ModelNext<'a> {
    pub fn new(middleware: &'a [Arc<dyn AgentMiddleware>], broker: &'a LlmBroker) -> Self {
        Self { middleware, broker }
    }

    pub async fn run(self, request: ModelRequest) -> Result<LlmGatewayResponse> {
        match self.middleware.split_first() {
            Some((first, rest)) => {
                first
                    .wrap_model_call(
                        request,
                        ModelNext {
                            middleware: rest,
                            broker: self.broker,
                        },
                    )
                    .await
            }
            None => {
                let mut messages = Vec::with_capacity(request.messages.len() + 1);
                if let Some(prompt) = request.system_prompt {
                    messages.push(LlmMessage::system(prompt));
                }
                messages.extend(request.messages);
                self.broker.complete(&messages, &request.tools).await
            }
        }
    }
}

/// The rest of the tool-call chain
pub struct ToolNext<'a> {
    middleware: &'a [Arc<dyn AgentMiddleware>],
    tools: &'a [Arc<dyn LlmTool>],
}

impl<'a> ToolNext<'a> {
    pub fn new(middleware: &'a [Arc<dyn AgentMiddleware>], tools: &'a [Arc<dyn LlmTool>]) -> Self {
        Self { middleware, tools }
    }

    pub async fn run(self, request: ToolCallRequest) -> Result<Value> {
        match self.middleware.split_first() {
            Some((first, rest)) => {
                first
                    .wrap_tool_call(
                        request,
                        ToolNext {
                            middleware: rest,
                            tools: self.tools,
                        },
                    )
                    .await
            }
            None => {
                let call = &request.tool_call;
                match self.tools.iter().find(|t| t.matches(&call.name)) {
                    Some(tool) => {
                        info!("Executing tool: {}", call.name);
                        tool.run(&call.arguments)
                    }
                    None => {
                        warn!("Tool not found: {}", call.name);
                        Err(HarnessError::ToolError(format!("Tool not found: {}", call.name)))
                    }
                }
            }
        }
    }
}
