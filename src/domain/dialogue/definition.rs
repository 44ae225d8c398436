//! Parsed, read-only representation of a follow-up script.

use serde::{Deserialize, Serialize};

use super::validation::StructuralWarning;

/// Question key that gates the rest of the call.
pub const CONSENT_KEY: &str = "consent";

/// Organization metadata from the `meta` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DialogueMeta {
    pub organization: String,
    pub service_name: String,
    pub site: String,
    pub version: String,
    pub description: String,
}

/// Greeting text. Scripts write `{placeholder}`; the loader stores the
/// handlebars form `{{placeholder}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GreetingTemplate {
    pub template: String,
    pub variables: Vec<String>,
}

/// How a question expects to be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum QuestionKind {
    /// Open answer in the patient's own words.
    #[default]
    #[serde(rename = "free")]
    FreeText,

    /// Yes/no confirmation; a denial may have its own reply text.
    #[serde(rename = "confirm")]
    Confirm,

    /// Marks the start of a section; never asked.
    #[serde(rename = "section")]
    SectionMarker,
}

impl QuestionKind {
    /// Returns true if the patient is expected to answer this entry.
    pub fn is_answerable(&self) -> bool {
        !matches!(self, Self::SectionMarker)
    }
}

/// One scripted question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    /// Stable identifier, unique within the definition.
    pub key: String,
    pub kind: QuestionKind,
    pub prompt: String,
    /// Reply used when a confirm question is declined.
    pub on_deny: Option<String>,
    /// Section label; `None` only for entries before the first section marker.
    pub section: Option<String>,
}

/// Immutable dialogue script shared by every session.
///
/// Constructed only through [`DialogueLoader`](super::DialogueLoader); wrap in
/// an `Arc` to share across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialogueDefinition {
    pub(super) meta: DialogueMeta,
    pub(super) greeting: GreetingTemplate,
    pub(super) sections: Vec<String>,
    pub(super) questions: Vec<Question>,
    pub(super) wrapup_message: String,
    pub(super) emergency_disclaimer: String,
    pub(super) warning_signs: Vec<String>,
    pub(super) warnings: Vec<StructuralWarning>,
}

impl DialogueDefinition {
    pub fn meta(&self) -> &DialogueMeta {
        &self.meta
    }

    pub fn greeting(&self) -> &GreetingTemplate {
        &self.greeting
    }

    /// Section names in document order.
    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    /// All questions in document order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Looks up a question by key.
    pub fn question(&self, key: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.key == key)
    }

    pub fn consent_question(&self) -> Option<&Question> {
        self.question(CONSENT_KEY)
    }

    /// Answerable questions belonging to the named section.
    pub fn questions_in_section(&self, section: &str) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| q.kind.is_answerable() && q.section.as_deref() == Some(section))
            .collect()
    }

    pub fn wrapup_message(&self) -> &str {
        &self.wrapup_message
    }

    pub fn emergency_disclaimer(&self) -> &str {
        &self.emergency_disclaimer
    }

    /// Stroke warning signs listed on emergency exit.
    pub fn warning_signs(&self) -> &[String] {
        &self.warning_signs
    }

    /// Non-fatal findings from load time.
    pub fn structural_warnings(&self) -> &[StructuralWarning] {
        &self.warnings
    }

    /// Structural warnings rendered as text, for reports and summaries.
    pub fn validation_issues(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}
