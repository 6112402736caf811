pub mod chat;
pub mod health;
pub mod storyboard;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ws            -> WebSocket, pushes storyboard snapshots
/// /storyboard    -> storyboard::router()
/// /chat          -> chat::router()
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/storyboard", storyboard::router())
        .nest("/chat", chat::router())
}
