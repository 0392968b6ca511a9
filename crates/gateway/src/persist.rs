//! Caller-side duties after a message has been handled: append the exchange
//! to conversation memory and archive any `save_data`.
//!
//! Runs detached from the HTTP response. Failures are logged only.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use vantage_core::archive::{ArchiveRecord, ArchiveSink};
use vantage_core::message::{ConversationTurn, SessionKey};
use vantage_core::outcome::{HandleOutcome, ResponseSource};
use vantage_memory::MemoryStore;

/// Append the user and assistant turns, then archive `save_data` if present.
///
/// A degraded outcome is not written to memory; its text carries no
/// conversational content. Returns the handle of a compaction started by
/// the append, if any.
pub async fn persist_exchange(
    memory: &MemoryStore,
    archive: &dyn ArchiveSink,
    session: &SessionKey,
    message: &str,
    outcome: &HandleOutcome,
) -> Option<JoinHandle<()>> {
    let mut compaction = None;
    if outcome.source != ResponseSource::Error {
        let turns = vec![
            ConversationTurn::user(message),
            ConversationTurn::assistant(outcome.response.clone()),
        ];
        match memory.append(session, turns).await {
            Ok(appended) => {
                debug!(
                    session = %session,
                    window_len = appended.window_len,
                    compacting = appended.compaction.is_some(),
                    "Exchange appended to memory"
                );
                compaction = appended.compaction;
            }
            Err(e) => warn!(session = %session, error = %e, "Failed to append exchange to memory"),
        }
    }

    if let Some(directive) = &outcome.save_data {
        let record = ArchiveRecord::new(session, directive);
        if let Err(e) = archive.archive(record).await {
            warn!(
                session = %session,
                sink = archive.name(),
                error = %e,
                "Failed to archive save_data"
            );
        }
    }

    compaction
}

/// Run [`persist_exchange`] as a background task.
pub fn spawn_persist(
    memory: Arc<MemoryStore>,
    archive: Arc<dyn ArchiveSink>,
    session: SessionKey,
    message: String,
    outcome: HandleOutcome,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // Compaction continues on its own task.
        let _ = persist_exchange(&memory, archive.as_ref(), &session, &message, &outcome).await;
    })
}
