//! Conversation configuration

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ValidationError;

/// Dialogue script location and per-session limits
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ConversationConfig {
    /// Path to the dialogue YAML
    #[serde(default = "default_dialogue_path")]
    pub dialogue_path: PathBuf,

    /// Extra emergency terms appended to the built-in list
    #[serde(default)]
    pub emergency_keywords: Vec<String>,

    /// Sessions longer than this are flagged in status
    #[serde(default = "default_max_duration")]
    pub max_duration_minutes: u64,
}

impl ConversationConfig {
    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_minutes * 60)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.dialogue_path.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("conversation.dialogue_path"));
        }
        if self.max_duration_minutes == 0 {
            return Err(ValidationError::InvalidMaxDuration);
        }
        if self.emergency_keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(ValidationError::BlankEmergencyKeyword);
        }
        Ok(())
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            dialogue_path: default_dialogue_path(),
            emergency_keywords: Vec::new(),
            max_duration_minutes: default_max_duration(),
        }
    }
}

fn default_dialogue_path() -> PathBuf {
    PathBuf::from("dialogues/stroke_followup.yml")
}

fn default_max_duration() -> u64 {
    30
}
