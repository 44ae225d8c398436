//! Bot identity configuration

use serde::Deserialize;

/// How the navigator introduces itself.
///
/// Empty organization and site fall back to the dialogue script's `meta`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BotConfig {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default)]
    pub organization: String,

    #[serde(default)]
    pub site: String,

    #[serde(default = "default_version")]
    pub version: String,
}

impl BotConfig {
    pub fn organization_override(&self) -> Option<&str> {
        non_blank(&self.organization)
    }

    pub fn site_override(&self) -> Option<&str> {
        non_blank(&self.site)
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            organization: String::new(),
            site: String::new(),
            version: default_version(),
        }
    }
}

fn default_name() -> String {
    "AI Stroke Navigator".to_string()
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
