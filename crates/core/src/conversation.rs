//! Screenwriting assistant conversation.
//!
//! [`ConversationSession`] is stateless: each call takes the caller's
//! [`ChatHandle`] and returns the reply together with the next handle.
//! [`Conversation`] is the caller that owns the handle and the append-only
//! transcript, turning failed turns into a visible model reply.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::collaborator::ChatCollaborator;
use crate::error::CoreError;
use crate::prompts::ASSISTANT_SYSTEM_INSTRUCTION;
use crate::types::{MessageId, Timestamp};

/// Prefix of the model turn recorded when a conversation turn fails.
pub const CHAT_ERROR_PREFIX: &str = "Sorry, I encountered an error: ";

// ---------------------------------------------------------------------------
// Transcript types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: ChatRole,
    pub text: String,
    pub created_at: Timestamp,
}

impl ChatMessage {
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new_v4(),
            role,
            text: text.into(),
            created_at: chrono::Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// ChatHandle
// ---------------------------------------------------------------------------

/// A completed exchange carried as context for later turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

/// Accumulated conversational context, owned by the caller between turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHandle {
    system_instruction: String,
    turns: Vec<ChatTurn>,
}

impl ChatHandle {
    pub fn new(system_instruction: impl Into<String>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            turns: Vec::new(),
        }
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// Prior turns, oldest first.
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    fn with_exchange(&self, message: &str, reply: &str) -> Self {
        let mut next = self.clone();
        next.turns.push(ChatTurn {
            role: ChatRole::User,
            text: message.to_string(),
        });
        next.turns.push(ChatTurn {
            role: ChatRole::Model,
            text: reply.to_string(),
        });
        next
    }
}

// ---------------------------------------------------------------------------
// ConversationSession
// ---------------------------------------------------------------------------

/// Reply to one message plus the handle to pass on the next call.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub text: String,
    pub handle: ChatHandle,
}

pub struct ConversationSession {
    collaborator: Arc<dyn ChatCollaborator>,
    system_instruction: String,
}

impl ConversationSession {
    /// Session bound to the screenwriting assistant persona.
    pub fn new(collaborator: Arc<dyn ChatCollaborator>) -> Self {
        Self::with_system_instruction(collaborator, ASSISTANT_SYSTEM_INSTRUCTION)
    }

    pub fn with_system_instruction(
        collaborator: Arc<dyn ChatCollaborator>,
        system_instruction: impl Into<String>,
    ) -> Self {
        Self {
            collaborator,
            system_instruction: system_instruction.into(),
        }
    }

    /// Send `message` in the context of `handle`, opening a new handle when
    /// none is given.
    ///
    /// The input handle is never modified; on failure the caller still holds
    /// it and can retry on the same context.
    pub async fn send(
        &self,
        handle: Option<&ChatHandle>,
        message: &str,
    ) -> Result<ChatReply, CoreError> {
        let opened;
        let handle = match handle {
            Some(handle) => handle,
            None => {
                tracing::debug!("Opening new assistant conversation");
                opened = ChatHandle::new(self.system_instruction.clone());
                &opened
            }
        };

        let text = self
            .collaborator
            .reply(handle, message)
            .await
            .map_err(CoreError::Chat)?;

        Ok(ChatReply {
            handle: handle.with_exchange(message, &text),
            text,
        })
    }
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// The assistant transcript together with the handle that continues it.
pub struct Conversation {
    session: ConversationSession,
    handle: Option<ChatHandle>,
    transcript: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(session: ConversationSession) -> Self {
        Self {
            session,
            handle: None,
            transcript: Vec::new(),
        }
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Record `message` and the model's answer to it.
    ///
    /// Blank messages are rejected before anything is recorded. Otherwise
    /// exactly two entries are appended: the user turn, then either the
    /// reply or an apology carrying the failure cause. The returned message
    /// is the model entry.
    ///
    /// Both entries are appended together once the answer is known, so a
    /// submission dropped while waiting on the model records nothing.
    pub async fn submit(&mut self, message: &str) -> Result<ChatMessage, CoreError> {
        if message.trim().is_empty() {
            return Err(CoreError::Validation(
                "message must not be empty".to_string(),
            ));
        }

        let turn = ChatMessage::new(ChatRole::User, message);
        let text = match self.session.send(self.handle.as_ref(), message).await {
            Ok(reply) => {
                self.handle = Some(reply.handle);
                reply.text
            }
            Err(e) => {
                tracing::warn!(error = %e, "Assistant turn failed");
                format!("{CHAT_ERROR_PREFIX}{e}")
            }
        };

        let reply = ChatMessage::new(ChatRole::Model, text);
        self.transcript.push(turn);
        self.transcript.push(reply.clone());
        Ok(reply)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
