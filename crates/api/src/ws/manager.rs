use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use storyboard_core::types::Timestamp;
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// A connected storyboard viewer.
pub struct WsConnection {
    pub sender: WsSender,
    pub connected_at: Timestamp,
}

#[derive(Default)]
struct Feed {
    connections: HashMap<String, WsConnection>,
    /// Last board frame published, replayed to viewers as they join.
    board: Option<Message>,
}

/// Registry of storyboard viewers and the board frame they were last sent.
///
/// Joining and publishing share one lock: a viewer's first frame is the
/// latest board, and every later frame is newer than the one before it.
#[derive(Default)]
pub struct WsManager {
    feed: RwLock<Feed>,
}

impl WsManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a viewer and queue the current board frame for it, if one
    /// has been published.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(&self, conn_id: String) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut feed = self.feed.write().await;
        if let Some(board) = &feed.board {
            let _ = tx.send(board.clone());
        }
        feed.connections.insert(
            conn_id,
            WsConnection {
                sender: tx,
                connected_at: chrono::Utc::now(),
            },
        );
        rx
    }

    pub async fn remove(&self, conn_id: &str) {
        if let Some(conn) = self.feed.write().await.connections.remove(conn_id) {
            let lifetime = chrono::Utc::now() - conn.connected_at;
            tracing::debug!(
                conn_id,
                connected_secs = lifetime.num_seconds(),
                "Storyboard viewer removed"
            );
        }
    }

    /// Remember `frame` as the current board and send it to every viewer.
    ///
    /// Returns how many viewers it was queued for. Viewers whose channels
    /// are closed are skipped until their receive loop removes them.
    pub async fn publish_board(&self, frame: Message) -> usize {
        let mut feed = self.feed.write().await;
        let mut delivered = 0;
        for conn in feed.connections.values() {
            if conn.sender.send(frame.clone()).is_ok() {
                delivered += 1;
            }
        }
        feed.board = Some(frame);
        delivered
    }

    pub async fn connection_count(&self) -> usize {
        self.feed.read().await.connections.len()
    }

    /// Send a Close frame to every viewer, then forget them.
    pub async fn shutdown_all(&self) {
        let mut feed = self.feed.write().await;
        let count = feed.connections.len();
        for conn in feed.connections.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        feed.connections.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every viewer.
    pub async fn ping_all(&self) {
        let feed = self.feed.read().await;
        for conn in feed.connections.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}
