//! Prompt rendering.
//!
//! Turns a conversation state plus session context into the text the patient
//! hears, and builds the instruction text for an optional external generator.

mod generator;
mod render;
pub mod templates;
mod tone;

pub use generator::PromptGenerator;
pub use render::{render_template, PromptError};
pub use tone::ResponseTone;
