use crate::error::Result;
use crate::llm::gateway::{CompletionConfig, LlmGateway};
use crate::llm::models::{LlmGatewayResponse, LlmMessage};
use crate::llm::tools::ToolDescriptor;
use std::sync::Arc;

/// Binds a model name and completion settings to a gateway
///
/// The broker performs exactly one completion per call. Tool execution and the
/// follow-up completions belong to [`crate::agent::Agent`], which routes every
/// broker call through its middleware chain.
#[derive(Clone)]
pub struct LlmBroker {
    model: String,
    gateway: Arc<dyn LlmGateway>,
    config: CompletionConfig,
}

impl LlmBroker {
    /// Create a new LLM broker
    pub fn new(model: impl Into<String>, gateway: Arc<dyn LlmGateway>) -> Self {
        Self {
            model: model.into(),
            gateway,
            config: CompletionConfig::default(),
        }
    }

    /// Replace the completion settings used for every call
    pub fn with_config(mut self, config: CompletionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run a single completion
    pub async fn complete(
        &self,
        messages: &[LlmMessage],
        tools: &[ToolDescriptor],
    ) -> Result<LlmGatewayResponse> {
        self.gateway.complete(&self.model, messages, tools, &self.config).await
    }
}
