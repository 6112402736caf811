//! Handlers for the screenwriting assistant.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

/// GET /chat -- the transcript, oldest first.
pub async fn list_messages(State(state): State<AppState>) -> impl IntoResponse {
    let transcript = state.conversation.lock().await.transcript().to_vec();
    Json(DataResponse { data: transcript })
}

/// POST /chat -- send one message and return the model's turn.
///
/// A failed assistant call still answers 200; the returned turn carries
/// the apology and the cause.
pub async fn send_message(
    State(state): State<AppState>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = payload?;

    let reply = state.conversation.lock().await.submit(&input.message).await?;

    tracing::debug!(message_id = %reply.id, "Assistant replied");

    Ok(Json(DataResponse { data: reply }))
}
