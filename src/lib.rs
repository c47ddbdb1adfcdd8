//! Trace harness: a tool-using agent whose model and tool calls are recorded per chat session
//!
//! The [`agent`] module runs the tool-calling loop through a middleware stack, the [`tracer`]
//! module supplies the middleware that records each call, and [`server`] exposes chat and
//! trace retrieval over HTTP.

pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod server;
pub mod tracer;
pub mod weather_agent;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{HarnessError, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::agent::{Agent, AgentMiddleware, InvocationContext};
    pub use crate::config::{Config, LlmConfig, ServerConfig};
    pub use crate::error::{HarnessError, Result};
    pub use crate::llm::gateways::OpenAIGateway;
    pub use crate::llm::tools::{FunctionDescriptor, LlmTool, ToolDescriptor};
    pub use crate::llm::{CompletionConfig, LlmBroker, LlmGateway, LlmMessage, MessageRole};
    pub use crate::tracer::{TraceStep, TraceStore, TracingMiddleware};
}
