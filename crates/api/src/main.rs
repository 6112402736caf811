use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use storyboard_core::conversation::{Conversation, ConversationSession};
use storyboard_core::orchestrator::{OrchestratorConfig, StoryboardOrchestrator};
use storyboard_gemini::{GeminiApi, GeminiChat, GeminiConfig, GeminiSegmenter, ImagenSynthesizer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storyboard_api::config::ServerConfig;
use storyboard_api::router::build_app_router;
use storyboard_api::state::AppState;
use storyboard_api::ws;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "storyboard_api=debug,storyboard_core=debug,storyboard_gemini=debug,tower_http=debug"
                    .into()
            }),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");
    tracing::info!(
        host = %config.host,
        port = %config.port,
        max_concurrent_images = ?config.max_concurrent_images,
        "Loaded server configuration"
    );

    let gemini_config = GeminiConfig::from_env().expect("Invalid Gemini configuration");
    tracing::info!(
        parser_model = %gemini_config.parser_model,
        image_model = %gemini_config.image_model,
        chat_model = %gemini_config.chat_model,
        "Loaded Gemini configuration"
    );
    config
        .ensure_outlasts(gemini_config.timeout_secs)
        .expect("Invalid timeout configuration");

    // --- Collaborators ---
    let api = GeminiApi::new(&gemini_config).expect("Failed to build Gemini HTTP client");
    let orchestrator = StoryboardOrchestrator::new(
        Arc::new(GeminiSegmenter::new(api.clone(), &gemini_config)),
        Arc::new(ImagenSynthesizer::new(api.clone(), &gemini_config)),
        OrchestratorConfig {
            max_concurrent_images: config.max_concurrent_images,
        },
    );
    let conversation = Conversation::new(ConversationSession::new(Arc::new(GeminiChat::new(
        api,
        &gemini_config,
    ))));

    // --- App state ---
    let state = AppState::new(config.clone(), orchestrator, conversation);

    // --- WebSocket background tasks ---
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&state.ws_manager));
    let broadcast_handle = ws::start_board_broadcast(
        state.orchestrator.subscribe(),
        Arc::clone(&state.ws_manager),
    )
    .await;

    // --- Router ---
    let app = build_app_router(state.clone(), &config).expect("Failed to build router");

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    if let Some(run_id) = state.orchestrator.cancel_current().await {
        tracing::info!(%run_id, "Cancelled in-flight storyboard generation");
    }
    state.generation_tasks.close();
    let drained = tokio::time::timeout(
        Duration::from_secs(config.shutdown_timeout_secs),
        state.generation_tasks.wait(),
    )
    .await;
    if drained.is_err() {
        tracing::warn!("Timed out waiting for storyboard generation to settle");
    }

    let ws_count = state.ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    state.ws_manager.shutdown_all().await;

    broadcast_handle.abort();
    heartbeat_handle.abort();
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
