//! The traced weather assistant served by the binary and the demo

use crate::agent::Agent;
use crate::config::LlmConfig;
use crate::error::Result;
use crate::llm::broker::LlmBroker;
use crate::llm::gateways::{OpenAIConfig, OpenAIGateway};
use crate::llm::tools::WeatherTool;
use crate::tracer::{TraceStore, TracingMiddleware};
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant that provides weather information. \
                                 Avoid calling the same tool twice in a row.";

/// Build the weather agent against the configured endpoint, tracing into `traces`.
pub fn weather_agent(config: &LlmConfig, traces: &Arc<TraceStore>) -> Result<Agent> {
    let gateway = Arc::new(OpenAIGateway::with_config(OpenAIConfig::from(config))?);
    let broker = LlmBroker::new(config.model.clone(), gateway);

    info!(model = %config.model, base_url = %config.base_url, "Weather agent configured");

    Ok(Agent::builder(broker)
        .system_prompt(DEFAULT_SYSTEM_PROMPT)
        .tool(WeatherTool)
        .middleware(TracingMiddleware::recording_into(traces))
        .build())
}
