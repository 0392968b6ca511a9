//! Conversation memory for Vantage.
//!
//! - [`MemoryStore`]: hot window plus compacted briefing per session
//! - [`Compactor`] / [`LlmCompactor`]: briefing generation
//! - cache backends: [`InMemoryCache`], [`RestCache`]
//! - long-term archive: [`JsonlArchive`]

pub mod archive;
pub mod compactor;
pub mod factory;
pub mod in_memory;
pub mod rest;
pub mod store;

pub use archive::JsonlArchive;
pub use compactor::{Compactor, LlmCompactor};
pub use factory::{build_archive, build_cache, build_store};
pub use in_memory::InMemoryCache;
pub use rest::RestCache;
pub use store::{AppendOutcome, MemorySnapshot, MemoryStore};
