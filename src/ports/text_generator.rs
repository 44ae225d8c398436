//! Text Generator Port - optional rephrasing of scripted prompts.
//!
//! A generator turns the rendered prompt for a state into more natural
//! phrasing. It may be slow and it may fail; the flow falls back to the
//! rendered text whenever it does.
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl TextGenerator for Echo {
//!     async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
//!         Ok(request.user_prompt)
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::domain::conversation::{ConversationState, SessionContext};

/// Port for external text generation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Rephrase `request.user_prompt` following `request.system_prompt`.
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError>;
}

/// Everything a generator sees for one turn.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Standing instructions, including the emergency keyword list.
    pub system_prompt: String,
    /// Rendered prompt for the current state.
    pub user_prompt: String,
    /// State the prompt was rendered for.
    pub state: ConversationState,
    /// Snapshot of the session at render time.
    pub context: SessionContext,
}

/// Generator failures. All of them are recovered by the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("generation timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("generator unavailable: {0}")]
    Unavailable(String),

    #[error("generator returned an empty response")]
    EmptyResponse,

    #[error("generation failed: {0}")]
    Failed(String),
}

impl GenerationError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
