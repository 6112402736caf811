use crate::collaborator::CollaboratorError;

/// Domain errors surfaced by the orchestrator and the conversation.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Script breakdown failed; no scenes were produced.
    #[error("Failed to parse script: {0}")]
    Segmentation(#[source] CollaboratorError),

    /// One conversation turn failed.
    #[error("Failed to get a response from the assistant: {0}")]
    Chat(#[source] CollaboratorError),
}
