//! Conversation domain module.
//!
//! Session context, the guarded state machine that walks a patient through
//! the follow-up script, and the emergency keyword detector that can end
//! the call at any input. Finished sessions are exported as summaries.

mod context;
mod emergency;
mod machine;
mod rules;
mod state;
mod summary;

pub use context::{RecordedAnswer, SessionContext, TimeOfDay};
pub use emergency::{contains_emergency_keyword, EmergencyDetector, DEFAULT_EMERGENCY_KEYWORDS};
pub use machine::ConversationStateMachine;
pub use rules::{ConsentAnswer, Guard, TransitionRule, TransitionTable, TRANSITION_TABLE};
pub use state::ConversationState;
pub use summary::{
    session_data_issues, ConversationEvent, EventKind, ExportError, ResponseEntry,
    SessionSummary, EMERGENCY_ISSUE, MISSING_CONSENT_ISSUE, NOT_STARTED_ISSUE,
};
