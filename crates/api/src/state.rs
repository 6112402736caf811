use std::sync::Arc;

use storyboard_core::conversation::Conversation;
use storyboard_core::orchestrator::StoryboardOrchestrator;
use tokio::sync::Mutex;
use tokio_util::task::TaskTracker;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Storyboard generation pipeline and its published board.
    pub orchestrator: Arc<StoryboardOrchestrator>,
    /// The assistant transcript. Turns are serialized by the lock.
    pub conversation: Arc<Mutex<Conversation>>,
    /// WebSocket connection manager (browser clients).
    pub ws_manager: Arc<WsManager>,
    /// Background image fan-outs started by `POST /storyboard`.
    pub generation_tasks: TaskTracker,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        orchestrator: StoryboardOrchestrator,
        conversation: Conversation,
    ) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            conversation: Arc::new(Mutex::new(conversation)),
            ws_manager: Arc::new(WsManager::new()),
            generation_tasks: TaskTracker::new(),
        }
    }
}
