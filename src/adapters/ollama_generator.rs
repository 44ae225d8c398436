//! Ollama Text Generator - TextGenerator backed by an Ollama chat server.
//!
//! Sends one non-streaming `/api/chat` request per prompt: the system
//! instructions, then the rendered prompt prefixed with a short context line.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OllamaConfig::default()
//!     .with_endpoint("http://localhost:11434")
//!     .with_model("llama3.2:3b");
//!
//! let generator = OllamaTextGenerator::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::GeneratorConfig;
use crate::ports::{GenerationError, GenerationRequest, TextGenerator};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.2:3b";

/// Connection and sampling settings for [`OllamaTextGenerator`].
#[derive(Debug, Clone, PartialEq)]
pub struct OllamaConfig {
    /// Server base URL, without the `/api/chat` path.
    pub endpoint: String,
    pub model: String,
    /// HTTP request timeout.
    pub timeout: Duration,
    pub temperature: f32,
    pub top_p: f32,
    /// Upper bound on generated tokens (`num_predict`).
    pub max_tokens: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(30),
            temperature: 0.7,
            top_p: 0.9,
            max_tokens: 512,
        }
    }
}

impl OllamaConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl From<&GeneratorConfig> for OllamaConfig {
    fn from(config: &GeneratorConfig) -> Self {
        let endpoint = non_blank(config.endpoint.as_deref()).unwrap_or(DEFAULT_ENDPOINT);
        let model = non_blank(config.model.as_deref()).unwrap_or(DEFAULT_MODEL);

        Self::default()
            .with_endpoint(endpoint)
            .with_model(model)
            .with_timeout(config.timeout())
    }
}

fn is_loopback(endpoint: &str) -> bool {
    let host = endpoint.split("://").nth(1).unwrap_or(endpoint);
    ["localhost", "127.", "[::1]"]
        .iter()
        .any(|prefix| host.starts_with(prefix))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Ollama chat API generator.
pub struct OllamaTextGenerator {
    config: OllamaConfig,
    client: Client,
}

impl OllamaTextGenerator {
    pub fn new(config: OllamaConfig) -> Result<Self, GenerationError> {
        let mut builder = Client::builder().timeout(config.timeout);
        // Local servers are never reached through a proxy.
        if is_loopback(&config.endpoint) {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| GenerationError::unavailable(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.config.endpoint.trim_end_matches('/'))
    }

    fn to_chat_request<'a>(&'a self, request: &'a GenerationRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user",
                    content: user_message(request),
                },
            ],
            stream: false,
            options: ChatOptions {
                temperature: self.config.temperature,
                top_p: self.config.top_p,
                num_predict: self.config.max_tokens,
            },
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout {
                timeout_secs: self.config.timeout.as_secs(),
            }
        } else if err.is_connect() {
            GenerationError::unavailable(format!("Connection failed: {}", err))
        } else {
            GenerationError::unavailable(err.to_string())
        }
    }
}

/// The rendered prompt, prefixed with who is being called.
fn user_message(request: &GenerationRequest) -> String {
    let context = &request.context;
    let details: Vec<String> = [
        ("Patient", context.patient_name()),
        ("Time", context.time_of_day().as_str()),
        ("Organization", context.organization()),
    ]
    .iter()
    .filter(|(_, value)| !value.trim().is_empty())
    .map(|(label, value)| format!("{}: {}", label, value.trim()))
    .collect();

    if details.is_empty() {
        request.user_prompt.clone()
    } else {
        format!("[Context: {}] {}", details.join(", "), request.user_prompt)
    }
}

fn status_error(status: StatusCode, body: &str) -> GenerationError {
    match status.as_u16() {
        404 => GenerationError::failed(format!("Model not found: {}", body)),
        500..=599 => GenerationError::unavailable(format!("Server error {}: {}", status, body)),
        _ => GenerationError::failed(format!("Unexpected status {}: {}", status, body)),
    }
}

#[async_trait]
impl TextGenerator for OllamaTextGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        let response = self
            .client
            .post(self.chat_url())
            .json(&self.to_chat_request(&request))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::failed(format!("Malformed chat response: {}", e)))?;

        let content = reply.message.map(|m| m.content).unwrap_or_default();
        let content = content.trim();
        if content.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        debug!(model = %self.config.model, state = %request.state, "Generated prompt text");
        Ok(content.to_string())
    }
}

// ============================================================================
// Ollama API types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}
