//! Trace capture for agent invocations
//!
//! - [`TracingMiddleware`] wraps every model and tool call, times it, and emits a
//!   [`TraceStep`] carrying either the call's output or its error message.
//! - [`TraceStore`] keeps emitted steps per chat session in the order they arrived.
//!
//! # Usage Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use trace_harness::tracer::{TraceStore, TracingMiddleware};
//!
//! let traces = Arc::new(TraceStore::default());
//! let agent = Agent::builder(broker)
//!     .tool(WeatherTool)
//!     .middleware(TracingMiddleware::recording_into(&traces))
//!     .build();
//!
//! agent.invoke(messages, InvocationContext::new("123")).await?;
//! for step in traces.list("123") {
//!     println!("{:?} {} {}ms", step.kind, step.name, step.latency_ms);
//! }
//! ```

pub mod trace_step;
pub mod trace_store;
pub mod tracing_middleware;

pub use trace_step::{PendingTraceStep, TraceKind, TraceOutcome, TraceStep};
pub use trace_store::{RecordCallback, TraceCallback, TraceStore};
pub use tracing_middleware::{TracingMiddleware, DEFAULT_MODEL_NAME};
