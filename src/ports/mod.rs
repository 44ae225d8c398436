//! Ports - Interfaces for external collaborators.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the conversation engine and the outside world. Adapters implement these
//! ports.
//!
//! - `TextGenerator` - optional rephrasing of rendered prompts
//! - `SummarySink` - persistence of exported session summaries

mod summary_sink;
mod text_generator;

pub use summary_sink::{SinkError, SummarySink};
pub use text_generator::{GenerationError, GenerationRequest, TextGenerator};
