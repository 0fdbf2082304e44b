use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/chat", post(chat))
}

/// POST /api/chat
async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(AppError::ValidationError("message is required".to_string()));
    }

    let reply = state
        .chat
        .reply(message)
        .await
        .map_err(|e| AppError::store("Failed to load movies", e))?;
    Ok(Json(ChatResponse { reply }))
}
