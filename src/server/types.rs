//! Request, response and error types of the HTTP API

use crate::error::HarnessError;
use crate::llm::models::{LlmMessage, MessageRole};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Role reported for assistant messages in chat responses
pub const AGENT_ROLE: &str = "agent";

/// A chat message as the browser UI sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl UiMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Map into the model-facing representation.
    ///
    /// `agent` and `ai` become assistant turns; every other role is treated as the user.
    pub fn into_llm_message(self) -> LlmMessage {
        match self.role.as_str() {
            "agent" | "ai" => LlmMessage::assistant(self.content),
            _ => LlmMessage::user(self.content),
        }
    }

    /// Map a history entry back for display, dropping tool and system turns and blank content.
    pub fn from_llm_message(message: &LlmMessage) -> Option<Self> {
        let role = match message.role {
            MessageRole::User => "user",
            MessageRole::Assistant => AGENT_ROLE,
            MessageRole::Tool | MessageRole::System => return None,
        };
        let content = message.content.as_deref().unwrap_or_default();
        if content.trim().is_empty() {
            return None;
        }
        Some(Self::new(role, content))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<UiMessage>,
    pub chat_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub messages: Vec<UiMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub chat_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    pub path: String,
}

/// Error response of every endpoint, rendered as `{"error": message}`
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<HarnessError> for ApiError {
    fn from(e: HarnessError) -> Self {
        tracing::error!(error = %e, "Request failed");
        Self::internal(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!(status = %rejection.status(), "Rejected request body");
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::models::LlmToolCall;
    use std::collections::HashMap;

    #[test]
    fn test_incoming_roles() {
        assert_eq!(UiMessage::new("user", "hi").into_llm_message(), LlmMessage::user("hi"));
        assert_eq!(UiMessage::new("agent", "yo").into_llm_message(), LlmMessage::assistant("yo"));
        assert_eq!(UiMessage::new("ai", "yo").into_llm_message(), LlmMessage::assistant("yo"));
        assert_eq!(UiMessage::new("tool", "x").into_llm_message(), LlmMessage::user("x"));
    }

    #[test]
    fn test_outgoing_filtering() {
        assert_eq!(
            UiMessage::from_llm_message(&LlmMessage::assistant("Sunny")),
            Some(UiMessage::new("agent", "Sunny"))
        );
        assert_eq!(
            UiMessage::from_llm_message(&LlmMessage::user("Hi")),
            Some(UiMessage::new("user", "Hi"))
        );
        assert_eq!(UiMessage::from_llm_message(&LlmMessage::tool("result", None)), None);
        assert_eq!(UiMessage::from_llm_message(&LlmMessage::system("prompt")), None);
        assert_eq!(UiMessage::from_llm_message(&LlmMessage::assistant("   ")), None);

        let tool_request = LlmMessage {
            role: MessageRole::Assistant,
            content: None,
            tool_calls: Some(vec![LlmToolCall {
                id: Some("c1".to_string()),
                name: "get_weather".to_string(),
                arguments: HashMap::new(),
            }]),
            tool_call_id: None,
        };
        assert_eq!(UiMessage::from_llm_message(&tool_request), None);
    }

    #[test]
    fn test_chat_request_defaults() {
        let request: ChatRequest = serde_json::from_str(r#"{"chatId": "123"}"#).unwrap();
        assert!(request.messages.is_empty());
        assert_eq!(request.chat_id, Some("123".to_string()));

        let request: ChatRequest = serde_json::from_str(r#"{"messages": []}"#).unwrap();
        assert!(request.chat_id.is_none());
    }

    #[tokio::test]
    async fn test_api_error_body() {
        let response = ApiError::not_found("No traces found for this chatId").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({"error": "No traces found for this chatId"}));
    }

    #[test]
    fn test_harness_error_is_internal() {
        let error = ApiError::from(HarnessError::AgentError("stuck".to_string()));
        match error {
            ApiError::Internal(message) => assert_eq!(message, "Agent error: stuck"),
            other => panic!("Expected Internal, got {:?}", other),
        }
    }
}
