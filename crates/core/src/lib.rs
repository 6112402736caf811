//! Storyboard domain core.
//!
//! Holds everything that does not talk to the network directly:
//!
//! - [`scene`] / [`board`]: scene lifecycle and the published storyboard.
//! - [`collaborator`]: traits for the hosted segmentation, image and chat
//!   models, plus their shared error type.
//! - [`orchestrator`]: segmentation followed by per-scene image fan-out.
//! - [`conversation`]: the screenwriting assistant session and transcript.
//! - [`prompts`]: fixed prompt text shared by every model backend.

pub mod board;
pub mod collaborator;
pub mod conversation;
pub mod error;
pub mod orchestrator;
pub mod prompts;
pub mod scene;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;
