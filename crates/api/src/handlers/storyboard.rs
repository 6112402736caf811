//! Handlers for storyboard generation.
//!
//! `POST /storyboard` returns once the script is segmented; image requests
//! continue in the background and their progress reaches clients through
//! `GET /storyboard` and the WebSocket feed.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use storyboard_core::prompts::SAMPLE_SCRIPT;
use storyboard_core::scene::Scene;
use storyboard_core::types::RunId;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub script: String,
}

/// A run whose scenes are known and whose images are being generated.
#[derive(Debug, Serialize)]
pub struct StartedRun {
    pub run_id: RunId,
    pub scenes: Vec<Scene>,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
    pub run_id: Option<RunId>,
}

#[derive(Debug, Serialize)]
pub struct SampleScript {
    pub script: &'static str,
}

// ---------------------------------------------------------------------------
// GET /storyboard
// ---------------------------------------------------------------------------

/// Current storyboard snapshot.
pub async fn get_storyboard(State(state): State<AppState>) -> impl IntoResponse {
    Json(DataResponse {
        data: state.orchestrator.snapshot(),
    })
}

// ---------------------------------------------------------------------------
// POST /storyboard
// ---------------------------------------------------------------------------

/// Segment the script and start one image request per scene.
///
/// Responds `202 Accepted` with the initial scenes. Segmentation failures
/// and an already running generation are reported synchronously.
pub async fn start_generation(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = payload?;

    let run = state.orchestrator.begin(&input.script).await?;
    let started = StartedRun {
        run_id: run.run_id(),
        scenes: run.scenes().to_vec(),
    };

    tracing::info!(
        run_id = %started.run_id,
        scene_count = started.scenes.len(),
        "Storyboard generation started"
    );

    state.generation_tasks.spawn(async move {
        run.finish().await;
    });

    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: started })))
}

// ---------------------------------------------------------------------------
// DELETE /storyboard/run
// ---------------------------------------------------------------------------

/// Cancel the in-flight generation. Unfinished scenes settle as errors.
pub async fn cancel_generation(State(state): State<AppState>) -> impl IntoResponse {
    let run_id = state.orchestrator.cancel_current().await;
    Json(DataResponse {
        data: CancelResponse {
            cancelled: run_id.is_some(),
            run_id,
        },
    })
}

// ---------------------------------------------------------------------------
// GET /storyboard/sample-script
// ---------------------------------------------------------------------------

pub async fn sample_script() -> impl IntoResponse {
    Json(DataResponse {
        data: SampleScript {
            script: SAMPLE_SCRIPT,
        },
    })
}
