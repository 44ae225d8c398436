//! YAML loader for dialogue scripts.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::definition::{DialogueDefinition, DialogueMeta, GreetingTemplate, Question, QuestionKind};
use super::validation::{structural_report, TopLevelPresence};

/// Fatal problems reading a dialogue document.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("Dialogue file {path} could not be read: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Dialogue document is not well-formed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Question key '{0}' appears more than once")]
    DuplicateQuestionKey(String),

    #[error("Question at flow entry {index} has an empty key")]
    EmptyQuestionKey { index: usize },
}

/// Parses dialogue documents into [`DialogueDefinition`]s.
pub struct DialogueLoader;

impl DialogueLoader {
    /// Reads and parses a dialogue file.
    pub fn load_file(path: impl AsRef<Path>) -> Result<DialogueDefinition, DefinitionError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DefinitionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let definition = Self::load_str(&text)?;
        tracing::info!(
            path = %path.display(),
            questions = definition.questions().len(),
            warnings = definition.structural_warnings().len(),
            "Dialogue definition loaded"
        );
        Ok(definition)
    }

    /// Parses a dialogue document held in memory.
    pub fn load_str(text: &str) -> Result<DialogueDefinition, DefinitionError> {
        let raw: RawDocument = serde_yaml::from_str(text)?;
        build(raw)
    }
}

fn build(raw: RawDocument) -> Result<DialogueDefinition, DefinitionError> {
    let presence = TopLevelPresence {
        meta: raw.meta.is_some(),
        greeting: raw.greeting.is_some(),
        flow: raw.flow.is_some(),
        wrapup: raw.wrapup.is_some(),
    };

    let mut sections = Vec::new();
    let mut questions: Vec<Question> = Vec::new();
    let mut seen_keys = HashSet::new();
    let mut unrecognized = Vec::new();
    let mut current_section: Option<String> = None;

    for (index, entry) in raw.flow.unwrap_or_default().into_iter().enumerate() {
        match entry {
            RawFlowEntry::Section { section } => {
                sections.push(section.clone());
                current_section = Some(section);
            }
            RawFlowEntry::Question(q) => {
                if let Some(section) = q.section.filter(|s| !s.trim().is_empty()) {
                    if current_section.as_deref() != Some(section.as_str()) {
                        sections.push(section.clone());
                        current_section = Some(section);
                    }
                }
                let key = q.key.trim().to_string();
                if key.is_empty() {
                    return Err(DefinitionError::EmptyQuestionKey { index });
                }
                if !seen_keys.insert(key.clone()) {
                    return Err(DefinitionError::DuplicateQuestionKey(key));
                }
                if q.kind == QuestionKind::SectionMarker {
                    sections.push(key.clone());
                    current_section = Some(key.clone());
                }
                questions.push(Question {
                    key,
                    kind: q.kind,
                    prompt: q.prompt,
                    on_deny: q.on_deny,
                    section: current_section.clone(),
                });
            }
            RawFlowEntry::Other(_) => unrecognized.push(index),
        }
    }

    let meta = raw.meta.unwrap_or_default();
    let greeting = raw.greeting.unwrap_or_default();

    let mut definition = DialogueDefinition {
        meta: DialogueMeta {
            organization: meta.organization,
            service_name: meta.service_name,
            site: meta.site,
            version: meta.version,
            description: meta.description,
        },
        greeting: GreetingTemplate {
            template: handlebars_placeholders(&greeting.template),
            variables: greeting.variables,
        },
        sections,
        questions,
        wrapup_message: raw.wrapup.unwrap_or_default().message,
        emergency_disclaimer: raw.emergency_disclaimer,
        warning_signs: raw.stroke_warning_signs,
        warnings: Vec::new(),
    };

    definition.warnings = structural_report(presence, &definition, &unrecognized);
    for warning in &definition.warnings {
        tracing::warn!(%warning, "Dialogue structure issue");
    }

    Ok(definition)
}

// ============================================================================
// Raw document shape
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawDocument {
    meta: Option<RawMeta>,
    greeting: Option<RawGreeting>,
    flow: Option<Vec<RawFlowEntry>>,
    wrapup: Option<RawWrapup>,
    #[serde(default, deserialize_with = "scalar_string")]
    emergency_disclaimer: String,
    #[serde(default)]
    stroke_warning_signs: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMeta {
    #[serde(deserialize_with = "scalar_string")]
    organization: String,
    #[serde(deserialize_with = "scalar_string")]
    service_name: String,
    #[serde(deserialize_with = "scalar_string")]
    site: String,
    #[serde(deserialize_with = "scalar_string")]
    version: String,
    #[serde(deserialize_with = "scalar_string")]
    description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawGreeting {
    template: String,
    variables: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawWrapup {
    message: String,
}

// Untagged variants are tried in order. Anything with a `key` is a
// question, even when it also names a section.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawFlowEntry {
    Question(RawQuestion),
    Section { section: String },
    Other(IgnoredAny),
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    key: String,
    #[serde(rename = "type", default)]
    kind: QuestionKind,
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    on_deny: Option<String>,
    #[serde(default)]
    section: Option<String>,
}

/// Rewrites the script's `{name}` placeholders as handlebars `{{name}}`.
/// Braces that do not enclose a plain name are left as written.
fn handlebars_placeholders(template: &str) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) if is_placeholder_name(after[..close].trim()) => {
                out.push_str("{{");
                out.push_str(after[..close].trim());
                out.push_str("}}");
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Accepts any YAML scalar (`version: 1.0`, `version: "1.0"`) as text.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    })
}
