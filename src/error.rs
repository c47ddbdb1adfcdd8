//! Error types and result aliases for the trace harness.
//!
//! [`HarnessError`] covers every failure the agent, its gateway and its tools can produce.
//! The tracing middleware never creates errors of its own for a failed call: whatever the
//! wrapped call returned is recorded and handed back unchanged.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("LLM gateway error: {0}")]
    GatewayError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Tool error: {0}")]
    ToolError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Missing invocation context: {0}")]
    MissingContext(String),

    #[error("Agent error: {0}")]
    AgentError(String),
}

pub type Result<T> = std::result::Result<T, HarnessError>;
