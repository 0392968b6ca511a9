//! Retrieval cascade: ordered fallback chain with per-provider timeouts.
//!
//! Providers are tried strictly in priority order. The first one that
//! yields an answer commits the record and later providers are never
//! consulted. When every provider fails the cascade returns the Silence
//! Protocol record; `resolve` has no error path.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::future::select_ok;
use tokio::sync::Semaphore;
use tracing::{info, warn};
use vantage_core::cancel::CancellationToken;
use vantage_core::error::ProviderError;
use vantage_core::event::{DomainEvent, EventBus};
use vantage_core::retrieval::{ProviderClient, RetrievalRecord, RetrievalSource};

/// Default process-wide cap on concurrent outbound provider calls.
const DEFAULT_MAX_CONCURRENT_CALLS: usize = 16;

/// Default per-provider budget.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Orchestrates provider clients in priority order.
pub struct RetrievalCascade {
    chain: Vec<CascadeEntry>,
    limiter: Arc<Semaphore>,
    race_top_two: bool,
    event_bus: Option<Arc<EventBus>>,
}

/// A single entry in the cascade.
struct CascadeEntry {
    client: Arc<dyn ProviderClient>,
    confidence: f32,
    timeout: Duration,
}

impl RetrievalCascade {
    /// Create a new cascade with no providers.
    pub fn new() -> Self {
        Self {
            chain: Vec::new(),
            limiter: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT_CALLS)),
            race_top_two: false,
            event_bus: None,
        }
    }

    /// Append a provider with its fixed confidence tier and timeout.
    ///
    /// Call order is priority order: add the highest-fidelity provider first.
    pub fn add(
        mut self,
        client: Arc<dyn ProviderClient>,
        confidence: f32,
        timeout: Duration,
    ) -> Self {
        self.chain.push(CascadeEntry {
            client,
            confidence: confidence.clamp(0.0, 1.0),
            timeout,
        });
        self
    }

    /// Append a provider with the default timeout (8s).
    pub fn add_default(self, client: Arc<dyn ProviderClient>, confidence: f32) -> Self {
        self.add(client, confidence, DEFAULT_TIMEOUT)
    }

    /// Share a process-wide limiter across cascades.
    pub fn with_limiter(mut self, limiter: Arc<Semaphore>) -> Self {
        self.limiter = limiter;
        self
    }

    /// Race the top two providers; the first success wins.
    pub fn with_race_top_two(mut self, enabled: bool) -> Self {
        self.race_top_two = enabled;
        self
    }

    /// Publish attempt and resolution events.
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Number of providers in the chain.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Provider ids in priority order.
    pub fn provider_ids(&self) -> Vec<&str> {
        self.chain.iter().map(|e| e.client.id()).collect()
    }

    /// Resolve `query` into exactly one record.
    pub async fn resolve(&self, query: &str) -> RetrievalRecord {
        self.resolve_with_cancel(query, &CancellationToken::new())
            .await
    }

    /// Resolve `query`, aborting in-flight provider calls if `cancel` fires.
    pub async fn resolve_with_cancel(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> RetrievalRecord {
        let mut next = 0;

        if self.race_top_two && self.chain.len() >= 2 {
            info!(
                first = %self.chain[0].client.id(),
                second = %self.chain[1].client.id(),
                "Cascade: racing top two providers"
            );
            let racers = [
                Box::pin(self.attempt(0, query, cancel)),
                Box::pin(self.attempt(1, query, cancel)),
            ];
            match select_ok(racers).await {
                Ok((record, _losers)) => return self.commit(record),
                Err(e) => {
                    warn!(error = %e, "Cascade: both raced providers failed, continuing");
                }
            }
            next = 2;
        }

        for index in next..self.chain.len() {
            if cancel.is_cancelled() {
                break;
            }
            match self.attempt(index, query, cancel).await {
                Ok(record) => return self.commit(record),
                Err(e) => {
                    warn!(
                        provider = %self.chain[index].client.id(),
                        error = %e,
                        "Cascade: provider failed, trying next"
                    );
                }
            }
        }

        warn!(
            providers = self.chain.len(),
            "Cascade: all providers failed, invoking Silence Protocol"
        );
        self.commit(RetrievalRecord::silence())
    }

    /// One bounded attempt against the provider at `index`.
    async fn attempt(
        &self,
        index: usize,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<RetrievalRecord, ProviderError> {
        let entry = &self.chain[index];
        let provider = entry.client.id().to_string();

        info!(
            provider = %provider,
            attempt = index + 1,
            total = self.chain.len(),
            timeout_ms = entry.timeout.as_millis() as u64,
            "Cascade: trying provider"
        );

        let start = Instant::now();
        let call = async {
            let _permit = self
                .limiter
                .acquire()
                .await
                .map_err(|_| ProviderError::Transport {
                    provider: provider.clone(),
                    reason: "call limiter closed".into(),
                })?;
            entry.client.fetch(query, entry.timeout).await
        };

        let fetched = match cancel
            .run_until_cancelled(tokio::time::timeout(entry.timeout, call))
            .await
        {
            None => Err(ProviderError::Cancelled(provider.clone())),
            Some(Err(_)) => Err(ProviderError::Timeout {
                provider: provider.clone(),
                timeout_ms: entry.timeout.as_millis() as u64,
            }),
            Some(Ok(result)) => result,
        };

        let result = fetched.and_then(|answer| {
            if !answer.answer_present {
                return Err(ProviderError::LowSignal {
                    provider: provider.clone(),
                    reason: "answer missing".into(),
                });
            }
            let content = entry.client.normalize(&answer);
            if content.trim().is_empty() {
                return Err(ProviderError::LowSignal {
                    provider: provider.clone(),
                    reason: "answer normalized to empty text".into(),
                });
            }
            Ok(RetrievalRecord {
                source: RetrievalSource::Provider(provider.clone()),
                content,
                confidence: entry.confidence,
            })
        });

        if let Some(bus) = &self.event_bus {
            bus.publish(DomainEvent::ProviderAttempted {
                provider,
                success: result.is_ok(),
                duration_ms: start.elapsed().as_millis() as u64,
                timestamp: Utc::now(),
            });
        }

        result
    }

    fn commit(&self, record: RetrievalRecord) -> RetrievalRecord {
        info!(
            source = %record.source,
            confidence = record.confidence,
            "Cascade: committed retrieval record"
        );
        if let Some(bus) = &self.event_bus {
            bus.publish(DomainEvent::RetrievalResolved {
                source: record.source.to_string(),
                confidence: record.confidence,
                timestamp: Utc::now(),
            });
        }
        record
    }
}

impl Default for RetrievalCascade {
    fn default() -> Self {
        Self::new()
    }
}
