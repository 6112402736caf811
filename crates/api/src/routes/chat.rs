use axum::routing::get;
use axum::Router;

use crate::handlers::chat;
use crate::state::AppState;

/// Routes mounted at `/chat`.
///
/// ```text
/// GET  /  -> list_messages
/// POST /  -> send_message
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(chat::list_messages).post(chat::send_message))
}
