#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use storyboard_core::board::Storyboard;
use storyboard_core::collaborator::{
    ChatCollaborator, CollaboratorError, ImageSynthesizer, SceneDescription, ScriptSegmenter,
};
use storyboard_core::conversation::{ChatHandle, Conversation, ConversationSession};
use storyboard_core::orchestrator::{OrchestratorConfig, StoryboardOrchestrator};
use storyboard_core::scene::ImageData;
use tower::ServiceExt;

use storyboard_api::config::ServerConfig;
use storyboard_api::router::build_app_router;
use storyboard_api::state::AppState;

// ---------------------------------------------------------------------------
// Fake collaborators
// ---------------------------------------------------------------------------

/// Answers every script with the same segmentation result.
pub struct StaticSegmenter(pub Result<Vec<String>, CollaboratorError>);

impl StaticSegmenter {
    pub fn scenes(descriptions: &[&str]) -> Self {
        Self(Ok(descriptions.iter().map(|d| d.to_string()).collect()))
    }
}

#[async_trait]
impl ScriptSegmenter for StaticSegmenter {
    async fn segment(&self, _script: &str) -> Result<Vec<SceneDescription>, CollaboratorError> {
        self.0
            .clone()
            .map(|list| list.into_iter().map(SceneDescription::new).collect())
    }
}

/// Never answers.
pub struct HangingSegmenter;

#[async_trait]
impl ScriptSegmenter for HangingSegmenter {
    async fn segment(&self, _script: &str) -> Result<Vec<SceneDescription>, CollaboratorError> {
        std::future::pending().await
    }
}

/// Renders a fixed image, failing for listed descriptions. A hanging
/// synthesizer never answers.
#[derive(Default)]
pub struct StaticSynthesizer {
    pub fail_on: HashSet<String>,
    pub hang: bool,
}

impl StaticSynthesizer {
    pub fn failing_on(descriptions: &[&str]) -> Self {
        Self {
            fail_on: descriptions.iter().map(|d| d.to_string()).collect(),
            hang: false,
        }
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ImageSynthesizer for StaticSynthesizer {
    async fn synthesize(&self, description: &str) -> Result<ImageData, CollaboratorError> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.fail_on.contains(description) {
            return Err(CollaboratorError::Api {
                status: 500,
                body: "render failed".into(),
            });
        }
        Ok(ImageData::jpeg_base64("ZmFrZQ=="))
    }
}

/// Echoes each message back, or fails every turn.
pub struct EchoChat {
    pub fail: bool,
}

#[async_trait]
impl ChatCollaborator for EchoChat {
    async fn reply(&self, handle: &ChatHandle, message: &str) -> Result<String, CollaboratorError> {
        if self.fail {
            return Err(CollaboratorError::Transport("connection reset".into()));
        }
        Ok(format!("[{}] {message}", handle.turns().len()))
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        max_concurrent_images: None,
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

/// Build the full application with the given collaborators and the same
/// middleware stack production uses.
pub fn build_test_app(
    segmenter: impl ScriptSegmenter + 'static,
    synthesizer: impl ImageSynthesizer + 'static,
    chat: EchoChat,
) -> TestApp {
    let config = test_config();
    let orchestrator = StoryboardOrchestrator::new(
        Arc::new(segmenter),
        Arc::new(synthesizer),
        OrchestratorConfig::default(),
    );
    let conversation = Conversation::new(ConversationSession::new(Arc::new(chat)));
    let state = AppState::new(config.clone(), orchestrator, conversation);
    let router = build_app_router(state.clone(), &config).expect("router builds");
    TestApp { router, state }
}

/// App whose collaborators all succeed.
pub fn default_test_app() -> TestApp {
    build_test_app(
        StaticSegmenter::scenes(&["Scene A", "Scene B", "Scene C"]),
        StaticSynthesizer::default(),
        EchoChat { fail: false },
    )
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, Body::empty(), None).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Body::empty(), None).await
}

pub async fn post_json(app: Router, uri: &str, json: serde_json::Value) -> Response<Body> {
    send(
        app,
        Method::POST,
        uri,
        Body::from(json.to_string()),
        Some("application/json"),
    )
    .await
}

pub async fn post_raw(app: Router, uri: &str, body: &'static str) -> Response<Body> {
    send(app, Method::POST, uri, Body::from(body), Some("application/json")).await
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Body,
    content_type: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Wait until the published board is no longer busy.
pub async fn wait_until_settled(state: &AppState) -> Storyboard {
    let mut rx = state.orchestrator.subscribe();
    let board = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|b| !b.busy))
        .await
        .expect("generation settles in time")
        .expect("publisher alive")
        .clone();
    board
}
