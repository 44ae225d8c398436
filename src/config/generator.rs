//! Text generator configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// External text generator settings
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Route prompts through the generator
    #[serde(default)]
    pub enabled: bool,

    /// Per-call timeout in seconds before falling back to the scripted text
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Ollama server URL; `http://localhost:11434` when unset
    pub endpoint: Option<String>,

    /// Model name; `llama3.2:3b` when unset
    pub model: Option<String>,
}

impl GeneratorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_secs: default_timeout(),
            endpoint: None,
            model: None,
        }
    }
}

fn default_timeout() -> u64 {
    10
}
