//! Route definitions for storyboard generation.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::storyboard;
use crate::state::AppState;

/// Routes mounted at `/storyboard`.
///
/// ```text
/// GET    /               -> get_storyboard
/// POST   /               -> start_generation
/// DELETE /run            -> cancel_generation
/// GET    /sample-script  -> sample_script
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(storyboard::get_storyboard).post(storyboard::start_generation),
        )
        .route("/run", delete(storyboard::cancel_generation))
        .route("/sample-script", get(storyboard::sample_script))
}
