//! Conversational completion service.
//!
//! The assistant screen exchanges an accumulated turn history with a
//! stateless chat-completions API. Only the OpenAI-compatible provider is
//! implemented; the engine depends on the [`CompletionService`] trait alone.

mod openai;

pub use openai::OpenAiProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One turn of the assistant conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Stateless request/response completion over a full turn history.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Produce the assistant's next reply for the given history.
    async fn complete(&self, history: &[ChatTurn]) -> Result<String, LlmError>;
}
