//! In-Memory Summary Sink Adapter
//!
//! Keeps archived summaries in memory. Useful for testing and development.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::conversation::SessionSummary;
use crate::domain::foundation::SessionId;
use crate::ports::{SinkError, SummarySink};

/// In-memory store of session summaries.
#[derive(Debug, Clone, Default)]
pub struct InMemorySummarySink {
    summaries: Arc<RwLock<Vec<SessionSummary>>>,
    failure: Option<String>,
}

impl InMemorySummarySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that rejects every summary with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            summaries: Arc::default(),
            failure: Some(message.into()),
        }
    }

    /// Stored summaries, oldest first.
    pub async fn summaries(&self) -> Vec<SessionSummary> {
        self.summaries.read().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.summaries.read().await.len()
    }

    pub async fn find(&self, session_id: SessionId) -> Option<SessionSummary> {
        self.summaries
            .read()
            .await
            .iter()
            .find(|s| s.session_id == session_id)
            .cloned()
    }

    pub async fn clear(&self) {
        self.summaries.write().await.clear();
    }
}

#[async_trait]
impl SummarySink for InMemorySummarySink {
    async fn store(&self, summary: &SessionSummary) -> Result<(), SinkError> {
        if let Some(message) = &self.failure {
            return Err(SinkError::Unavailable(message.clone()));
        }
        self.summaries.write().await.push(summary.clone());
        Ok(())
    }
}
