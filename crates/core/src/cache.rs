//! Cache trait: the expiring key-value store behind conversation memory.
//!
//! Only `get` and `set` with a TTL are required; no multi-key transaction
//! guarantee is assumed. Implementations: in-process (tests, single node)
//! and REST key-value services.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::MemoryError;

#[async_trait]
pub trait CacheStore: Send + Sync {
    /// The backend name (e.g., "in_memory", "rest").
    fn name(&self) -> &str;

    /// Fetch a value. Expired and missing keys both read as `None`.
    async fn get(&self, key: &str) -> std::result::Result<Option<String>, MemoryError>;

    /// Store a value, replacing any previous one and resetting its TTL.
    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> std::result::Result<(), MemoryError>;
}
