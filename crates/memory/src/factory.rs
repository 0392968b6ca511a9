//! Build memory components from configuration.

use std::sync::Arc;
use tracing::{info, warn};
use vantage_config::{ArchiveConfig, MemoryConfig};
use vantage_core::archive::{ArchiveSink, NoopArchive};
use vantage_core::cache::CacheStore;
use vantage_core::event::EventBus;

use crate::archive::JsonlArchive;
use crate::compactor::Compactor;
use crate::in_memory::InMemoryCache;
use crate::rest::RestCache;
use crate::store::MemoryStore;

/// Create the cache backend named by `config.cache`.
///
/// Unknown names and a `rest` backend without a URL fall back to the
/// in-process cache with a warning.
pub fn build_cache(config: &MemoryConfig) -> Arc<dyn CacheStore> {
    match config.cache.as_str() {
        "rest" => match config.cache_url.as_deref().filter(|u| !u.is_empty()) {
            Some(url) => {
                info!(url, "Using REST cache");
                Arc::new(RestCache::new(
                    url,
                    config.cache_token.clone().unwrap_or_default(),
                ))
            }
            None => {
                warn!("REST cache selected without cache_url; using in-memory cache");
                Arc::new(InMemoryCache::new())
            }
        },
        "in_memory" => Arc::new(InMemoryCache::new()),
        other => {
            warn!(backend = other, "Unknown cache backend; using in-memory cache");
            Arc::new(InMemoryCache::new())
        }
    }
}

/// Assemble a `MemoryStore` with the configured window, TTL and key prefix.
pub fn build_store(
    config: &MemoryConfig,
    cache: Arc<dyn CacheStore>,
    compactor: Arc<dyn Compactor>,
    event_bus: Arc<EventBus>,
) -> MemoryStore {
    MemoryStore::new(cache, compactor)
        .with_window_size(config.window_size)
        .with_ttl(config.ttl())
        .with_key_prefix(config.key_prefix.clone())
        .with_event_bus(event_bus)
}

/// Create the long-term archive sink.
pub fn build_archive(config: &ArchiveConfig) -> Arc<dyn ArchiveSink> {
    if config.enabled {
        Arc::new(JsonlArchive::new(config.resolved_path()))
    } else {
        Arc::new(NoopArchive)
    }
}
