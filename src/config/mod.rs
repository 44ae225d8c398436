//! Application configuration module
//!
//! This module provides type-safe configuration loading using the `config`
//! and `dotenvy` crates. An optional YAML file is read first, then
//! environment variables with the `STROKE_NAVIGATOR` prefix override it.
//! Nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use stroke_navigator::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Dialogue script: {}", config.conversation.dialogue_path.display());
//! ```

mod bot;
mod conversation;
mod error;
mod generator;
mod logging;

pub use bot::BotConfig;
pub use conversation::ConversationConfig;
pub use error::{ConfigError, ValidationError};
pub use generator::GeneratorConfig;
pub use logging::LoggingConfig;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the YAML config file.
pub const CONFIG_PATH_VAR: &str = "STROKE_NAVIGATOR_CONFIG";

/// Config file read when [`CONFIG_PATH_VAR`] is unset. Optional.
pub const DEFAULT_CONFIG_PATH: &str = "config/stroke_navigator.yml";

/// Root application configuration
///
/// Every section is defaulted, so an empty environment yields a usable
/// configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Bot identity (name, organization, site)
    #[serde(default)]
    pub bot: BotConfig,

    /// Dialogue script and session limits
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Optional external text generator
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Log level and format
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from the default file location and environment
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads the YAML file named by `STROKE_NAVIGATOR_CONFIG`, or
    ///    `config/stroke_navigator.yml` if that exists
    /// 3. Reads environment variables with `STROKE_NAVIGATOR` prefix
    /// 4. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `STROKE_NAVIGATOR__GENERATOR__TIMEOUT_SECS=5` -> `generator.timeout_secs = 5`
    /// - `STROKE_NAVIGATOR__CONVERSATION__EMERGENCY_KEYWORDS=dizzy,fainted`
    ///   -> `conversation.emergency_keywords = ["dizzy", "fainted"]`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a named file is missing or a value cannot
    /// be parsed into its expected type.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Like [`AppConfig::load`], with an explicit config file that must exist.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let (file, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match std::env::var(CONFIG_PATH_VAR) {
                Ok(path) if !path.trim().is_empty() => (PathBuf::from(path), true),
                _ => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
            },
        };
        tracing::debug!(path = %file.display(), required, "Loading configuration");

        let config = config::Config::builder()
            .add_source(config::File::from(file).required(required))
            .add_source(
                config::Environment::with_prefix("STROKE_NAVIGATOR")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("conversation.emergency_keywords"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for an empty dialogue path, a zero or
    /// oversized generator timeout, a zero duration limit, a blank
    /// emergency keyword, or an unknown log level.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.conversation.validate()?;
        self.generator.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Write;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 6] = [
        CONFIG_PATH_VAR,
        "STROKE_NAVIGATOR__BOT__ORGANIZATION",
        "STROKE_NAVIGATOR__GENERATOR__ENABLED",
        "STROKE_NAVIGATOR__GENERATOR__TIMEOUT_SECS",
        "STROKE_NAVIGATOR__CONVERSATION__EMERGENCY_KEYWORDS",
        "STROKE_NAVIGATOR__LOGGING__LEVEL",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn yaml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_from_empty_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(config.bot.name, "AI Stroke Navigator");
        assert_eq!(config.conversation.max_duration_minutes, 30);
        assert!(!config.generator.enabled);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_environment_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("STROKE_NAVIGATOR__GENERATOR__ENABLED", "true");
        env::set_var("STROKE_NAVIGATOR__GENERATOR__TIMEOUT_SECS", "3");
        env::set_var("STROKE_NAVIGATOR__BOT__ORGANIZATION", "Valley Health");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.generator.enabled);
        assert_eq!(config.generator.timeout_secs, 3);
        assert_eq!(config.bot.organization, "Valley Health");
    }

    #[test]
    fn test_keyword_list_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("STROKE_NAVIGATOR__CONVERSATION__EMERGENCY_KEYWORDS", "dizzy,fainted");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.conversation.emergency_keywords, vec!["dizzy", "fainted"]);
    }

    #[test]
    fn test_yaml_file_then_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let file = yaml_file(
            "conversation:\n  max_duration_minutes: 20\n  emergency_keywords: [fainted]\nlogging:\n  level: debug\n",
        );
        env::set_var(CONFIG_PATH_VAR, file.path());
        env::set_var("STROKE_NAVIGATOR__LOGGING__LEVEL", "warn");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.conversation.max_duration_minutes, 20);
        assert_eq!(config.conversation.emergency_keywords, vec!["fainted"]);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load_from(Some(Path::new("does/not/exist.yml")));
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn test_validate_reports_first_problem() {
        let mut config = AppConfig::default();
        config.logging.level = "chatty".into();
        assert_eq!(
            config.validate(),
            Err(ValidationError::UnknownLogLevel("chatty".into()))
        );
    }
}
