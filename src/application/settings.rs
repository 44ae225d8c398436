//! Orchestrator settings.

use std::time::Duration;

use crate::config::AppConfig;
use crate::domain::prompts::templates::DEFAULT_BOT_NAME;

/// Knobs for one [`ConversationFlow`](super::ConversationFlow).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSettings {
    /// How long to wait for the text generator before using the scripted text.
    pub generator_timeout: Duration,
    /// Terms appended to the built-in emergency keyword list.
    pub extra_emergency_keywords: Vec<String>,
    /// Sessions running longer than this report `over_time_limit`.
    pub max_duration: Duration,
    /// How the navigator names itself to the text generator.
    pub bot_name: String,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            generator_timeout: Duration::from_secs(10),
            extra_emergency_keywords: Vec::new(),
            max_duration: Duration::from_secs(30 * 60),
            bot_name: DEFAULT_BOT_NAME.to_string(),
        }
    }
}

impl From<&AppConfig> for FlowSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            generator_timeout: config.generator.timeout(),
            extra_emergency_keywords: config.conversation.emergency_keywords.clone(),
            max_duration: config.conversation.max_duration(),
            bot_name: config.bot.name.clone(),
        }
    }
}
