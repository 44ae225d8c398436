//! Summary Sink Port - where finished sessions go.
//!
//! The engine never touches a database or the file system. Hosts plug in a
//! sink to persist exported session summaries.

use async_trait::async_trait;

use crate::domain::conversation::SessionSummary;

/// Port for persisting session summaries.
#[async_trait]
pub trait SummarySink: Send + Sync {
    /// Store one summary.
    async fn store(&self, summary: &SessionSummary) -> Result<(), SinkError>;
}

/// Errors from summary persistence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    #[error("no summary sink configured")]
    NotConfigured,

    #[error("summary storage unavailable: {0}")]
    Unavailable(String),

    #[error("summary rejected: {0}")]
    Rejected(String),

    #[error("summary could not be written: {0}")]
    Io(String),

    #[error("summary could not be encoded: {0}")]
    Encoding(String),
}

impl SinkError {
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }
}
