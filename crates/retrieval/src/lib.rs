//! Retrieval for Vantage: external intelligence providers and the
//! failsafe cascade that tries them in priority order.
//!
//! All clients implement `vantage_core::ProviderClient`. The cascade never
//! fails: when every provider comes back empty it returns the Silence
//! Protocol record instead.

pub mod cascade;
pub mod clients;
pub mod factory;

pub use cascade::RetrievalCascade;
pub use clients::{AnswerSearchClient, InstantAnswerClient, WebSearchClient};
pub use factory::build_from_config;
