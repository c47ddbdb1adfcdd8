use crate::error::{HarnessError, Result};
use serde::{Deserialize, Serialize};

/// Values attached to one top-level agent invocation
///
/// The agent clones the context into every model and tool request it issues while
/// serving that invocation, including follow-up model calls after tool results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationContext {
    #[serde(rename = "chatId")]
    chat_id: String,
}

impl InvocationContext {
    pub fn new(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
        }
    }

    /// The chat session identifier, or `MissingContext` when it is blank.
    pub fn require_chat_id(&self) -> Result<&str> {
        if self.chat_id.trim().is_empty() {
            return Err(HarnessError::MissingContext("chatId is required".to_string()));
        }
        Ok(&self.chat_id)
    }
}
