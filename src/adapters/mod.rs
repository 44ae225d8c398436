//! Adapters - Implementations of port interfaces.
//!
//! - `MockTextGenerator` - scripted generator for tests and offline runs
//! - `OllamaTextGenerator` - generator backed by an Ollama chat server
//! - `InMemorySummarySink` - keeps summaries in memory
//! - `JsonFileSummarySink` - one JSON file per archived session

mod in_memory_sink;
mod json_file_sink;
mod mock_generator;
mod ollama_generator;

pub use in_memory_sink::InMemorySummarySink;
pub use json_file_sink::JsonFileSummarySink;
pub use mock_generator::{MockResponse, MockTextGenerator};
pub use ollama_generator::{OllamaConfig, OllamaTextGenerator, DEFAULT_ENDPOINT, DEFAULT_MODEL};
