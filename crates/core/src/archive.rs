//! Long-term archive sink: where `saveData` directives end up.
//!
//! The core only decides whether and what to archive; writing it is the
//! caller's job, through this trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decision::ArchiveDirective;
use crate::error::MemoryError;
use crate::message::SessionKey;

/// One archived item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub session: SessionKey,
    pub content: String,
    pub category: String,
    pub archived_at: DateTime<Utc>,
}

impl ArchiveRecord {
    pub fn new(session: &SessionKey, directive: &ArchiveDirective) -> Self {
        Self {
            session: session.clone(),
            content: directive.content.clone(),
            category: directive.category.clone(),
            archived_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait ArchiveSink: Send + Sync {
    fn name(&self) -> &str;

    async fn archive(&self, record: ArchiveRecord) -> std::result::Result<(), MemoryError>;
}

/// Discards everything.
pub struct NoopArchive;

#[async_trait]
impl ArchiveSink for NoopArchive {
    fn name(&self) -> &str {
        "none"
    }

    async fn archive(&self, _record: ArchiveRecord) -> std::result::Result<(), MemoryError> {
        Ok(())
    }
}
