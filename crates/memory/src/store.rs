//! Tiered conversation memory.
//!
//! Per session the store keeps two cache keys:
//! - `{prefix}:{session}:window`: the hot window, the most recent `W` turns
//!   as a JSON array, rewritten (and its TTL refreshed) on every append
//! - `{prefix}:{session}:briefing`: the compacted summary of everything
//!   older, overwritten by each compaction
//!
//! Appends are read-merge-truncate-write with no session lock, so two
//! concurrent appends for the same session resolve last-write-wins.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use vantage_core::cache::CacheStore;
use vantage_core::error::{CompactionError, MemoryError};
use vantage_core::event::{DomainEvent, EventBus};
use vantage_core::message::{ConversationTurn, SessionKey, render_turns};

use crate::compactor::Compactor;

/// Default hot-window capacity.
pub const DEFAULT_WINDOW_SIZE: usize = 30;

/// Prefix that marks the briefing in assembled prompt context.
pub const BRIEFING_PREFIX: &str = "PRIOR CONTEXT (summary of earlier conversation):";

/// What `read` returns for one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySnapshot {
    pub hot_window: Vec<ConversationTurn>,
    pub briefing: Option<String>,
}

impl MemorySnapshot {
    /// Briefing (if any, prefixed as prior context) followed by the hot
    /// window as role-tagged lines. Without a briefing this is exactly the
    /// rendered window.
    pub fn render_context(&self) -> String {
        let window = render_turns(&self.hot_window);
        match self.briefing.as_deref() {
            None => window,
            Some(briefing) if window.is_empty() => format!("{BRIEFING_PREFIX}\n{briefing}"),
            Some(briefing) => format!("{BRIEFING_PREFIX}\n{briefing}\n\n{window}"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hot_window.is_empty() && self.briefing.is_none()
    }
}

/// Result of one append.
#[derive(Debug)]
pub struct AppendOutcome {
    /// Hot-window length after truncation; never exceeds `W`.
    pub window_len: usize,
    /// Handle of the background compaction, when one was started.
    /// Dropping it leaves the task running.
    pub compaction: Option<JoinHandle<()>>,
}

pub struct MemoryStore {
    cache: Arc<dyn CacheStore>,
    compactor: Arc<dyn Compactor>,
    window_size: usize,
    ttl: Duration,
    key_prefix: String,
    event_bus: Option<Arc<EventBus>>,
}

impl MemoryStore {
    pub fn new(cache: Arc<dyn CacheStore>, compactor: Arc<dyn Compactor>) -> Self {
        Self {
            cache,
            compactor,
            window_size: DEFAULT_WINDOW_SIZE,
            ttl: Duration::from_secs(7 * 24 * 60 * 60),
            key_prefix: "vantage".into(),
            event_bus: None,
        }
    }

    /// Set the window capacity `W` (minimum 1).
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size.max(1);
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn window_key(&self, session: &SessionKey) -> String {
        format!("{}:{}:window", self.key_prefix, session)
    }

    pub fn briefing_key(&self, session: &SessionKey) -> String {
        format!("{}:{}:briefing", self.key_prefix, session)
    }

    /// Read the hot window and briefing for `session`.
    ///
    /// The two keys are fetched concurrently. A miss, a cache failure or a
    /// corrupt value all read as empty; memory loss degrades the answer,
    /// it never fails the request.
    pub async fn read(&self, session: &SessionKey) -> MemorySnapshot {
        let window_key = self.window_key(session);
        let briefing_key = self.briefing_key(session);

        let (window, briefing) = tokio::join!(
            self.cache.get(&window_key),
            self.cache.get(&briefing_key)
        );

        let hot_window = match window {
            Ok(Some(raw)) => decode_window(&window_key, &raw).unwrap_or_else(|e| {
                warn!(session = %session, error = %e, "Discarding corrupt hot window");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(session = %session, error = %e, "Hot window read failed");
                Vec::new()
            }
        };

        let briefing = match briefing {
            Ok(b) => b.filter(|b| !b.trim().is_empty()),
            Err(e) => {
                warn!(session = %session, error = %e, "Briefing read failed");
                None
            }
        };

        MemorySnapshot {
            hot_window,
            briefing,
        }
    }

    /// Merge `new_turns` onto the stored window, keep the most recent `W`,
    /// and write it back with a fresh TTL.
    ///
    /// When the merged history is longer than `W`, compaction of the full
    /// merged list starts in the background. Its outcome is logged and
    /// never reported here.
    pub async fn append(
        &self,
        session: &SessionKey,
        new_turns: Vec<ConversationTurn>,
    ) -> Result<AppendOutcome, MemoryError> {
        let window_key = self.window_key(session);

        let mut merged = match self.cache.get(&window_key).await? {
            Some(raw) => decode_window(&window_key, &raw).unwrap_or_else(|e| {
                warn!(session = %session, error = %e, "Overwriting corrupt hot window");
                Vec::new()
            }),
            None => Vec::new(),
        };
        merged.extend(new_turns);

        let pre_truncation_len = merged.len();
        let overflow = pre_truncation_len.saturating_sub(self.window_size);
        let window = &merged[overflow..];

        let encoded = serde_json::to_string(window).map_err(|e| MemoryError::Corrupt {
            key: window_key.clone(),
            reason: e.to_string(),
        })?;
        self.cache.set(&window_key, &encoded, self.ttl).await?;

        debug!(
            session = %session,
            window_len = window.len(),
            pre_truncation_len,
            "Hot window written"
        );

        let compaction = (pre_truncation_len > self.window_size)
            .then(|| self.spawn_compaction(session.clone(), merged));

        Ok(AppendOutcome {
            window_len: pre_truncation_len - overflow,
            compaction,
        })
    }

    fn spawn_compaction(&self, session: SessionKey, turns: Vec<ConversationTurn>) -> JoinHandle<()> {
        let cache = Arc::clone(&self.cache);
        let compactor = Arc::clone(&self.compactor);
        let event_bus = self.event_bus.clone();
        let briefing_key = self.briefing_key(&session);
        let ttl = self.ttl;

        info!(session = %session, turns = turns.len(), "Starting background compaction");

        tokio::spawn(async move {
            let result = async {
                let briefing = compactor.compact(&turns).await?;
                cache.set(&briefing_key, &briefing, ttl).await?;
                Ok::<(), CompactionError>(())
            }
            .await;

            let event = match result {
                Ok(()) => {
                    info!(session = %session, turns = turns.len(), "Briefing rewritten");
                    DomainEvent::CompactionCompleted {
                        session: session.to_string(),
                        turns: turns.len(),
                        timestamp: Utc::now(),
                    }
                }
                Err(e) => {
                    warn!(session = %session, error = %e, "Compaction failed; keeping previous briefing");
                    DomainEvent::CompactionFailed {
                        session: session.to_string(),
                        error_message: e.to_string(),
                        timestamp: Utc::now(),
                    }
                }
            };
            if let Some(bus) = event_bus {
                bus.publish(event);
            }
        })
    }
}

fn decode_window(key: &str, raw: &str) -> Result<Vec<ConversationTurn>, MemoryError> {
    serde_json::from_str(raw).map_err(|e| MemoryError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
