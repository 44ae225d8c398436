//! JSON File Summary Sink - writes each summary to its own file.
//!
//! # Directory Structure
//!
//! ```text
//! {base_path}/
//! ├── session_3f2a....json
//! └── session_9c1b....json
//! ```
//!
//! Writes go to `session_{id}.json.tmp` first and are renamed into place,
//! so a crash never leaves a half-written summary behind.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::conversation::SessionSummary;
use crate::domain::foundation::SessionId;
use crate::ports::{SinkError, SummarySink};

/// Stores summaries as pretty-printed JSON files in one directory.
#[derive(Debug, Clone)]
pub struct JsonFileSummarySink {
    base_path: PathBuf,
}

impl JsonFileSummarySink {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Final file path for a session.
    pub fn summary_path(&self, session_id: SessionId) -> PathBuf {
        self.base_path.join(format!("session_{}.json", session_id))
    }

    fn temp_path(&self, session_id: SessionId) -> PathBuf {
        self.base_path.join(format!("session_{}.json.tmp", session_id))
    }
}

#[async_trait]
impl SummarySink for JsonFileSummarySink {
    async fn store(&self, summary: &SessionSummary) -> Result<(), SinkError> {
        let json = summary
            .to_json()
            .map_err(|e| SinkError::Encoding(e.to_string()))?;

        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            SinkError::io(format!(
                "Failed to create directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let temp = self.temp_path(summary.session_id);
        let target = self.summary_path(summary.session_id);

        let mut file = fs::File::create(&temp)
            .await
            .map_err(|e| SinkError::io(format!("Failed to create {}: {}", temp.display(), e)))?;
        file.write_all(json.as_bytes())
            .await
            .map_err(|e| SinkError::io(format!("Failed to write {}: {}", temp.display(), e)))?;
        file.sync_all()
            .await
            .map_err(|e| SinkError::io(format!("Failed to sync {}: {}", temp.display(), e)))?;
        drop(file);

        fs::rename(&temp, &target).await.map_err(|e| {
            SinkError::io(format!("Failed to move summary into {}: {}", target.display(), e))
        })?;

        tracing::info!(
            session_id = %summary.session_id,
            path = %target.display(),
            "Session summary written"
        );
        Ok(())
    }
}
