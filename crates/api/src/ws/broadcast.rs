use std::sync::Arc;

use axum::extract::ws::Message;
use serde::Serialize;
use storyboard_core::board::Storyboard;
use tokio::sync::watch;

use crate::ws::manager::WsManager;

/// Outbound WebSocket frame.
#[derive(Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
enum OutboundFrame<'a> {
    Storyboard(&'a Storyboard),
}

/// Encode a board snapshot as a `{"type":"storyboard","data":...}` text frame.
pub fn board_message(board: &Storyboard) -> Result<Message, serde_json::Error> {
    let text = serde_json::to_string(&OutboundFrame::Storyboard(board))?;
    Ok(Message::Text(text.into()))
}

/// Publish the current board to the feed, then spawn a task that forwards
/// every later board to all viewers.
///
/// Intermediate states published faster than they can be sent are
/// coalesced; viewers always end on the latest snapshot. The task ends
/// when the publisher is dropped.
pub async fn start_board_broadcast(
    mut boards: watch::Receiver<Storyboard>,
    ws_manager: Arc<WsManager>,
) -> tokio::task::JoinHandle<()> {
    forward(&mut boards, &ws_manager).await;
    tokio::spawn(async move {
        while boards.changed().await.is_ok() {
            forward(&mut boards, &ws_manager).await;
        }
        tracing::debug!("Storyboard publisher closed, broadcaster stopping");
    })
}

async fn forward(boards: &mut watch::Receiver<Storyboard>, ws_manager: &WsManager) {
    let message = board_message(&boards.borrow_and_update());
    match message {
        Ok(message) => {
            let viewers = ws_manager.publish_board(message).await;
            tracing::trace!(viewers, "Storyboard frame published");
        }
        Err(e) => tracing::error!(error = %e, "Failed to encode storyboard snapshot"),
    }
}
