//! Gemini API client for the storyboard collaborators.
//!
//! Wraps the `generateContent` and `predict` REST endpoints with
//! [`reqwest`] and implements the `storyboard-core` collaborator traits on
//! top of them:
//!
//! - [`GeminiSegmenter`]: script → scene descriptions (JSON mode).
//! - [`ImagenSynthesizer`]: scene description → JPEG data URI.
//! - [`GeminiChat`]: screenwriting assistant turns.

pub mod api;
pub mod collaborators;
pub mod config;
pub mod messages;

pub use api::{GeminiApi, GeminiApiError};
pub use collaborators::{GeminiChat, GeminiSegmenter, ImagenSynthesizer};
pub use config::{GeminiConfig, GeminiConfigError};
