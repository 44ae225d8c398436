//! Application layer - session orchestration.
//!
//! `ConversationFlow` ties the state machine, prompt rendering and the
//! optional collaborators together into the five calls a host needs:
//! `begin`, `submit`, `status`, `export_summary` and `reset`.

mod flow;
mod settings;
mod status;

pub use flow::ConversationFlow;
pub use settings::FlowSettings;
pub use status::{FlowStatus, QuestionOutline};
