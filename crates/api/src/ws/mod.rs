//! WebSocket infrastructure for live storyboard updates.
//!
//! Provides connection management, heartbeat monitoring, the board
//! broadcaster and the HTTP upgrade handler used by Axum routes.

mod broadcast;
mod handler;
mod heartbeat;
pub mod manager;

pub use broadcast::{board_message, start_board_broadcast};
pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
