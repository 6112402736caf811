pub mod chat;
pub mod storyboard;
