//! Per-session trace buffer
//!
//! Steps are grouped by chat session in the order they were recorded. The store lives as
//! long as the process (or the test) that owns it; nothing is evicted.

use super::trace_step::TraceStep;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Callback receiving each finished step, as injected into
/// [`TracingMiddleware`](super::TracingMiddleware)
pub type TraceCallback = Arc<dyn Fn(TraceStep) + Send + Sync>;

/// Callback observing each step as it is recorded
pub type RecordCallback = Arc<dyn Fn(&TraceStep) + Send + Sync>;

/// Store of trace steps keyed by session identifier
///
/// Appends for one session are serialized by that session's map entry, so concurrent
/// recorders never lose or interleave a step. Different sessions do not contend.
#[derive(Default)]
pub struct TraceStore {
    sessions: DashMap<String, Vec<TraceStep>>,
    on_record: Option<RecordCallback>,
}

impl TraceStore {
    /// Create a new trace store
    ///
    /// # Arguments
    ///
    /// * `on_record` - Optional callback invoked with every step before it is stored
    pub fn new(on_record: Option<RecordCallback>) -> Self {
        Self {
            sessions: DashMap::new(),
            on_record,
        }
    }

    /// Append `step` to the sequence of its session, creating the sequence if needed.
    pub fn record(&self, step: TraceStep) {
        if let Some(callback) = &self.on_record {
            callback(&step);
        }

        debug!(
            chat_id = %step.session_id,
            kind = ?step.kind,
            name = %step.name,
            latency_ms = step.latency_ms,
            failed = step.is_error(),
            "Trace recorded"
        );

        self.sessions.entry(step.session_id.clone()).or_default().push(step);
    }

    /// Steps recorded for `session_id` in recording order; empty when there are none.
    pub fn list(&self, session_id: &str) -> Vec<TraceStep> {
        self.sessions.get(session_id).map(|steps| steps.clone()).unwrap_or_default()
    }

    /// Number of steps recorded for `session_id`
    pub fn len(&self, session_id: &str) -> usize {
        self.sessions.get(session_id).map_or(0, |steps| steps.len())
    }

    /// Whether no step has been recorded for any session
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Sessions that have at least one step, sorted
    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    /// A callback that records every step it receives into this store
    pub fn recorder(self: &Arc<Self>) -> TraceCallback {
        let store = Arc::clone(self);
        Arc::new(move |step| store.record(step))
    }
}
