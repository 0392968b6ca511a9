//! Build the retrieval cascade from configuration.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::info;
use vantage_config::{ProviderKind, RetrievalConfig, RetrievalProviderConfig};
use vantage_core::retrieval::ProviderClient;

use crate::cascade::RetrievalCascade;
use crate::clients::{AnswerSearchClient, InstantAnswerClient, WebSearchClient};

/// Create a cascade with the enabled providers in configured order.
pub fn build_from_config(config: &RetrievalConfig) -> RetrievalCascade {
    let limiter = Arc::new(Semaphore::new(config.max_concurrent_calls.max(1)));
    let mut cascade = RetrievalCascade::new()
        .with_limiter(limiter)
        .with_race_top_two(config.race_top_two);

    for entry in config.providers.iter().filter(|p| p.enabled) {
        cascade = cascade.add(build_client(entry), entry.confidence, entry.timeout());
    }

    info!(
        providers = ?cascade.provider_ids(),
        race_top_two = config.race_top_two,
        "Retrieval cascade configured"
    );
    cascade
}

/// Instantiate the client for one provider entry.
pub fn build_client(entry: &RetrievalProviderConfig) -> Arc<dyn ProviderClient> {
    match entry.kind {
        ProviderKind::AnswerSearch => {
            let client = AnswerSearchClient::new(&entry.id, entry.api_key.clone());
            match &entry.api_url {
                Some(url) => Arc::new(client.with_api_url(url)),
                None => Arc::new(client),
            }
        }
        ProviderKind::WebSearch => {
            let client = WebSearchClient::new(&entry.id, entry.api_key.clone());
            match &entry.api_url {
                Some(url) => Arc::new(client.with_api_url(url)),
                None => Arc::new(client),
            }
        }
        ProviderKind::InstantAnswer => {
            let client = InstantAnswerClient::new(&entry.id);
            match &entry.api_url {
                Some(url) => Arc::new(client.with_api_url(url)),
                None => Arc::new(client),
            }
        }
    }
}
