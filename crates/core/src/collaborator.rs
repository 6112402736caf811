//! Contracts for the hosted models the storyboard depends on.
//!
//! The orchestrator and conversation only ever see these traits; the
//! concrete HTTP clients live in `storyboard-gemini`, and tests substitute
//! in-process fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::conversation::ChatHandle;
use crate::scene::ImageData;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure of a single call to a hosted model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    /// The request never produced a response (network, DNS, TLS, timeout).
    #[error("request failed: {0}")]
    Transport(String),

    /// The service answered with a non-2xx status.
    #[error("service returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The service answered, but not with what the contract promises.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The caller gave up on the request before it settled.
    #[error("request cancelled")]
    Cancelled,
}

// ---------------------------------------------------------------------------
// Segmentation output
// ---------------------------------------------------------------------------

/// One visualizable unit returned by the script segmenter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneDescription {
    pub description: String,
}

impl SceneDescription {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }

    /// Parse the segmenter's raw JSON answer.
    ///
    /// The answer must be an array of objects that each carry a string
    /// `description`. Anything else is rejected as a whole; a partially
    /// valid list is never truncated to its valid prefix.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, CollaboratorError> {
        let value: serde_json::Value = serde_json::from_str(raw.trim()).map_err(|e| {
            CollaboratorError::InvalidResponse(format!("scene list is not valid JSON: {e}"))
        })?;

        let items = value.as_array().ok_or_else(|| {
            CollaboratorError::InvalidResponse(
                "model did not return a valid array of scenes".to_string(),
            )
        })?;

        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item.get("description")
                    .and_then(serde_json::Value::as_str)
                    .map(Self::new)
                    .ok_or_else(|| {
                        CollaboratorError::InvalidResponse(format!(
                            "scene {index} has no string description"
                        ))
                    })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Splits a script into an ordered list of scene descriptions.
#[async_trait]
pub trait ScriptSegmenter: Send + Sync {
    async fn segment(&self, script: &str) -> Result<Vec<SceneDescription>, CollaboratorError>;
}

/// Produces exactly one image for one scene description.
#[async_trait]
pub trait ImageSynthesizer: Send + Sync {
    async fn synthesize(&self, description: &str) -> Result<ImageData, CollaboratorError>;
}

/// Answers one message in the context carried by `handle`.
///
/// Implementations must not mutate anything the handle does not describe;
/// the conversation layer builds the next handle from the reply.
#[async_trait]
pub trait ChatCollaborator: Send + Sync {
    async fn reply(&self, handle: &ChatHandle, message: &str) -> Result<String, CollaboratorError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
