//! Structural checks run once at load time.
//!
//! Findings are warnings: the engine stays usable with a non-empty report,
//! but hosts should surface it.

use serde::Serialize;
use std::fmt;

use super::definition::{DialogueDefinition, CONSENT_KEY};

/// Top-level blocks a complete script must carry.
pub const REQUIRED_SECTIONS: [&str; 4] = ["meta", "greeting", "flow", "wrapup"];

/// Placeholders the greeting renderer knows how to fill.
pub const GREETING_VARIABLES: [&str; 5] =
    ["timeofday", "honorific", "patient_name", "organization", "site"];

/// A non-fatal problem with a dialogue document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum StructuralWarning {
    MissingSection(String),
    MissingConsentQuestion,
    EmptySection(String),
    UnsupportedGreetingVariable(String),
    UnrecognizedFlowEntry(usize),
}

impl fmt::Display for StructuralWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSection(name) => write!(f, "Missing required section: {}", name),
            Self::MissingConsentQuestion => write!(f, "Missing consent question"),
            Self::EmptySection(name) => write!(f, "Section '{}' has no questions", name),
            Self::UnsupportedGreetingVariable(name) => {
                write!(f, "Greeting variable '{}' is not supported", name)
            }
            Self::UnrecognizedFlowEntry(index) => write!(
                f,
                "Flow entry {} is neither a section marker nor a question",
                index
            ),
        }
    }
}

/// Which top-level blocks were present in the raw document.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct TopLevelPresence {
    pub meta: bool,
    pub greeting: bool,
    pub flow: bool,
    pub wrapup: bool,
}

impl TopLevelPresence {
    fn has(&self, section: &str) -> bool {
        match section {
            "meta" => self.meta,
            "greeting" => self.greeting,
            "flow" => self.flow,
            "wrapup" => self.wrapup,
            _ => true,
        }
    }
}

/// Builds the structural report for a freshly parsed definition.
pub(super) fn structural_report(
    presence: TopLevelPresence,
    definition: &DialogueDefinition,
    unrecognized_entries: &[usize],
) -> Vec<StructuralWarning> {
    let mut warnings: Vec<StructuralWarning> = REQUIRED_SECTIONS
        .iter()
        .filter(|section| !presence.has(section))
        .map(|section| StructuralWarning::MissingSection(section.to_string()))
        .collect();

    if definition.question(CONSENT_KEY).is_none() {
        warnings.push(StructuralWarning::MissingConsentQuestion);
    }

    for section in definition.sections() {
        if definition.questions_in_section(section).is_empty() {
            warnings.push(StructuralWarning::EmptySection(section.clone()));
        }
    }

    for variable in &definition.greeting().variables {
        if !GREETING_VARIABLES.contains(&variable.as_str()) {
            warnings.push(StructuralWarning::UnsupportedGreetingVariable(variable.clone()));
        }
    }

    warnings.extend(
        unrecognized_entries
            .iter()
            .map(|index| StructuralWarning::UnrecognizedFlowEntry(*index)),
    );

    warnings
}
