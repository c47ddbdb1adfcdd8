//! HTTP surface for the chat UI
//!
//! | Method | Path                 | Purpose                               |
//! |--------|----------------------|---------------------------------------|
//! | POST   | `/chat`              | run the agent over a conversation     |
//! | POST   | `/save`              | write a session's traces to disk      |
//! | GET    | `/traces/{chat_id}`  | a session's traces, `[]` when unknown |

pub mod routes;
pub mod types;

pub use types::{ApiError, ChatRequest, ChatResponse, SaveRequest, SaveResponse, UiMessage};

use crate::agent::Agent;
use crate::error::Result;
use crate::tracer::TraceStore;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<Agent>,
    pub traces: Arc<TraceStore>,
    /// Directory `POST /save` writes into
    pub traces_dir: PathBuf,
}

impl AppState {
    pub fn new(agent: Agent, traces: Arc<TraceStore>, traces_dir: impl Into<PathBuf>) -> Self {
        Self {
            agent: Arc::new(agent),
            traces,
            traces_dir: traces_dir.into(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(routes::chat))
        .route("/save", post(routes::save))
        .route("/traces/{chat_id}", get(routes::traces))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `port` on all interfaces and serve until the process exits.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server running at http://localhost:{}", port);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
