//! Read-only views handed to hosts.

use serde::Serialize;

use crate::domain::conversation::ConversationState;
use crate::domain::dialogue::{Question, QuestionKind};

/// Snapshot of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowStatus {
    pub state: ConversationState,
    pub is_active: bool,
    /// The session ended on the emergency exit, for either reason.
    pub is_emergency: bool,
    pub is_completed: bool,
    /// An emergency keyword was heard.
    pub emergency_detected: bool,
    pub patient_name: String,
    pub responses_count: usize,
    /// Start to last activity.
    pub duration_secs: u64,
    pub over_time_limit: bool,
}

/// A question as listed to hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionOutline {
    pub key: String,
    pub kind: QuestionKind,
    pub prompt: String,
    pub section: Option<String>,
}

impl From<&Question> for QuestionOutline {
    fn from(question: &Question) -> Self {
        Self {
            key: question.key.clone(),
            kind: question.kind,
            prompt: question.prompt.clone(),
            section: question.section.clone(),
        }
    }
}
