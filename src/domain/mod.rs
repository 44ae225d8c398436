//! Domain layer containing the conversation rules and types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, timestamps, errors, state machine trait)
//! - `dialogue` - Follow-up script model and YAML loader
//! - `conversation` - Session context, transition rules, emergency detection
//! - `prompts` - Text rendering for each conversation state

pub mod conversation;
pub mod dialogue;
pub mod foundation;
pub mod prompts;
