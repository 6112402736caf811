//! Scene records and their generation lifecycle.
//!
//! A scene moves through
//!
//! ```text
//! pending ──► generating ──► completed
//!    │            │
//!    └────────────┴────────► error
//! ```
//!
//! `pending` is only used when image requests are queued behind a
//! concurrency cap; without a cap scenes are created in `generating`.
//! `completed` and `error` are terminal.

use serde::{Deserialize, Serialize};

use crate::types::SceneId;

// ---------------------------------------------------------------------------
// Image payload
// ---------------------------------------------------------------------------

/// MIME type of every image the synthesizer produces.
pub const STORYBOARD_IMAGE_MIME: &str = "image/jpeg";

/// An encoded image, held as a `data:` URI ready for an `<img src>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageData(String);

impl ImageData {
    /// Wrap base64-encoded JPEG bytes.
    pub fn jpeg_base64(encoded: &str) -> Self {
        Self(format!("data:{STORYBOARD_IMAGE_MIME};base64,{encoded}"))
    }

    pub fn as_data_uri(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0
            .split_once(',')
            .map_or(true, |(_, payload)| payload.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneStatus {
    /// Queued behind the concurrency cap, request not yet issued.
    Pending,
    /// Image request in flight.
    Generating,
    Completed,
    Error,
}

impl SceneStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: SceneStatus) -> bool {
        use SceneStatus::*;
        matches!(
            (self, next),
            (Pending, Generating) | (Pending, Error) | (Generating, Completed) | (Generating, Error)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Generating => "generating",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// One storyboard panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    pub description: String,
    pub image: Option<ImageData>,
    pub status: SceneStatus,
    /// Why image synthesis failed, set together with [`SceneStatus::Error`].
    pub failure: Option<String>,
}

impl Scene {
    pub fn new(description: impl Into<String>, status: SceneStatus) -> Self {
        Self {
            id: SceneId::new_v4(),
            description: description.into(),
            image: None,
            status,
            failure: None,
        }
    }

    /// Apply `update` if it targets this scene and the lifecycle allows it.
    ///
    /// Returns `true` when the scene changed.
    pub fn apply(&mut self, update: &SceneUpdate) -> bool {
        if update.scene_id() != self.id {
            return false;
        }
        let next = update.target_status();
        if !self.status.can_transition_to(next) {
            return false;
        }

        match update {
            SceneUpdate::Dispatched { .. } => {}
            SceneUpdate::Completed { image, .. } => {
                self.image = Some(image.clone());
            }
            SceneUpdate::Failed { reason, .. } => {
                self.failure = Some(reason.clone());
            }
        }
        self.status = next;
        true
    }
}

// ---------------------------------------------------------------------------
// Updates
// ---------------------------------------------------------------------------

/// A lifecycle event for exactly one scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneUpdate {
    /// The image request was issued.
    Dispatched { scene_id: SceneId },
    /// The image arrived.
    Completed { scene_id: SceneId, image: ImageData },
    /// The request failed or was cancelled.
    Failed { scene_id: SceneId, reason: String },
}

impl SceneUpdate {
    pub fn scene_id(&self) -> SceneId {
        match self {
            Self::Dispatched { scene_id }
            | Self::Completed { scene_id, .. }
            | Self::Failed { scene_id, .. } => *scene_id,
        }
    }

    fn target_status(&self) -> SceneStatus {
        match self {
            Self::Dispatched { .. } => SceneStatus::Generating,
            Self::Completed { .. } => SceneStatus::Completed,
            Self::Failed { .. } => SceneStatus::Error,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
