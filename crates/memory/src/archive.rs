//! JSON-lines archive: long-term storage for `saveData` directives.
//!
//! Each archived item is one JSON object per line, appended in arrival
//! order. The file is human-inspectable and never rewritten.
//!
//! Default location: `~/.vantage/archive.jsonl`

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use vantage_core::archive::{ArchiveRecord, ArchiveSink};
use vantage_core::error::MemoryError;

/// Appends archive records to a JSONL file.
pub struct JsonlArchive {
    path: PathBuf,
    // Serializes appends so lines from concurrent writers never interleave.
    write_lock: Mutex<()>,
}

impl JsonlArchive {
    /// The file (and its parent directory) is created on first write.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every well-formed record back, skipping corrupted lines.
    pub async fn load(&self) -> Result<Vec<ArchiveRecord>, MemoryError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(MemoryError::Storage(format!(
                    "Failed to read archive file: {e}"
                )));
            }
        };

        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<ArchiveRecord>(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted archive line");
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl ArchiveSink for JsonlArchive {
    fn name(&self) -> &str {
        "jsonl"
    }

    async fn archive(&self, record: ArchiveRecord) -> Result<(), MemoryError> {
        let mut line = serde_json::to_string(&record).map_err(|e| {
            MemoryError::Storage(format!("Failed to serialize archive record: {e}"))
        })?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                MemoryError::Storage(format!("Failed to create archive directory: {e}"))
            })?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to open archive file: {e}")))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to write archive file: {e}")))?;
        file.flush()
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to flush archive file: {e}")))?;

        debug!(
            session = %record.session,
            category = %record.category,
            "Archived item"
        );
        Ok(())
    }
}
