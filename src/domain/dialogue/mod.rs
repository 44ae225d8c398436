//! Dialogue definition module.
//!
//! The scripted follow-up call: metadata, greeting template, ordered
//! questions grouped into sections, wrap-up and emergency content.
//! Loaded once, read-only afterwards, safe to share across sessions.

mod definition;
mod loader;
mod validation;

pub use definition::{
    DialogueDefinition, DialogueMeta, GreetingTemplate, Question, QuestionKind, CONSENT_KEY,
};
pub use loader::{DefinitionError, DialogueLoader};
pub use validation::{StructuralWarning, GREETING_VARIABLES, REQUIRED_SECTIONS};
