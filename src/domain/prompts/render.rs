//! Handlebars rendering for greeting and instruction templates.
//!
//! The engine runs in strict mode, so a template naming a variable the data
//! does not carry fails instead of rendering blank. Output is plain text and
//! is never HTML-escaped.

use handlebars::{no_escape, Handlebars, RenderErrorReason};
use once_cell::sync::Lazy;
use serde::Serialize;
use thiserror::Error;

/// Failures while filling a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("Template refers to unknown variable '{0}'")]
    UnknownTemplateVariable(String),

    #[error("Template could not be rendered: {0}")]
    MalformedTemplate(String),
}

static ENGINE: Lazy<Handlebars<'static>> = Lazy::new(|| {
    let mut engine = Handlebars::new();
    engine.set_strict_mode(true);
    engine.register_escape_fn(no_escape);
    engine
});

/// Renders a `{{name}}` template against `data`.
pub fn render_template<T: Serialize>(template: &str, data: &T) -> Result<String, PromptError> {
    ENGINE
        .render_template(template, data)
        .map_err(|err| match err.reason() {
            RenderErrorReason::MissingVariable(Some(name)) => {
                PromptError::UnknownTemplateVariable(name.clone())
            }
            _ => PromptError::MalformedTemplate(err.to_string()),
        })
}
