//! Route handlers

use super::types::{ApiError, ChatRequest, ChatResponse, SaveRequest, SaveResponse, UiMessage};
use super::AppState;
use crate::agent::InvocationContext;
use crate::error::HarnessError;
use crate::llm::models::LlmMessage;
use crate::tracer::TraceStep;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use tracing::{info, warn};

const CHAT_ID_REQUIRED: &str = "chatId is required";

fn require_chat_id(chat_id: Option<String>) -> Result<String, ApiError> {
    match chat_id {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => Err(ApiError::bad_request(CHAT_ID_REQUIRED)),
    }
}

/// The id becomes part of a file name, so it must not reach outside the traces directory.
fn is_safe_file_stem(chat_id: &str) -> bool {
    !chat_id.contains(['/', '\\', '\0']) && !chat_id.contains("..")
}

/// `POST /chat`: run the agent over the submitted conversation
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;
    let chat_id = require_chat_id(request.chat_id)?;
    let messages: Vec<LlmMessage> =
        request.messages.into_iter().map(UiMessage::into_llm_message).collect();

    info!(chat_id = %chat_id, messages = messages.len(), "Chat request");

    let history = state.agent.invoke(messages, InvocationContext::new(chat_id)).await?;

    Ok(Json(ChatResponse {
        messages: history.iter().filter_map(UiMessage::from_llm_message).collect(),
    }))
}

/// `POST /save`: export a session's traces to `trace_{chatId}.json`
pub async fn save(
    State(state): State<AppState>,
    payload: Result<Json<SaveRequest>, JsonRejection>,
) -> Result<Json<SaveResponse>, ApiError> {
    let Json(request) = payload?;
    let chat_id = require_chat_id(request.chat_id)?;
    if !is_safe_file_stem(&chat_id) {
        warn!(chat_id = %chat_id, "Rejected chatId for export");
        return Err(ApiError::bad_request("chatId cannot be used as a file name"));
    }

    let traces = state.traces.list(&chat_id);
    if traces.is_empty() {
        return Err(ApiError::not_found("No traces found for this chatId"));
    }

    let json = serde_json::to_string_pretty(&traces).map_err(HarnessError::from)?;
    let path = state.traces_dir.join(format!("trace_{}.json", chat_id));

    tokio::fs::create_dir_all(&state.traces_dir)
        .await
        .map_err(HarnessError::from)?;
    tokio::fs::write(&path, json).await.map_err(HarnessError::from)?;

    info!(chat_id = %chat_id, steps = traces.len(), path = %path.display(), "Traces saved");

    Ok(Json(SaveResponse {
        success: true,
        path: path.display().to_string(),
    }))
}

/// `GET /traces/{chat_id}`: the session's steps in emission order, `[]` when unknown
pub async fn traces(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> Json<Vec<TraceStep>> {
    Json(state.traces.list(&chat_id))
}
