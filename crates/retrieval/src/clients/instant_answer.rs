//! Instant-answer provider (DuckDuckGo JSON API). Keyless; lowest tier.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use vantage_core::error::ProviderError;
use vantage_core::retrieval::{ProviderAnswer, ProviderClient};

use super::{check_status, http_client, low_signal, transport_error};

const DEFAULT_API_URL: &str = "https://api.duckduckgo.com/";
const RELATED_IN_DIGEST: usize = 3;

pub struct InstantAnswerClient {
    id: String,
    api_url: String,
    client: reqwest::Client,
}

impl InstantAnswerClient {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            api_url: DEFAULT_API_URL.into(),
            client: http_client(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

#[async_trait]
impl ProviderClient for InstantAnswerClient {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self, query: &str, timeout: Duration) -> Result<ProviderAnswer, ProviderError> {
        debug!(provider = %self.id, "Querying instant answer API");

        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| transport_error(&self.id, timeout, e))?;

        let response = check_status(&self.id, response).await?;
        // The API sometimes answers with `application/x-javascript`; parse the body directly.
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(&self.id, timeout, e))?;
        let parsed: ApiResponse = serde_json::from_str(&body)
            .map_err(|e| low_signal(&self.id, format!("unparseable body: {e}")))?;

        match pick_answer(&parsed) {
            Some(text) => Ok(ProviderAnswer::text(text)),
            None => Err(low_signal(&self.id, "no instant answer")),
        }
    }
}

/// First non-empty of: direct answer, abstract, definition, related topics.
fn pick_answer(parsed: &ApiResponse) -> Option<String> {
    let non_empty = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };

    if let Some(answer) = non_empty(&parsed.answer) {
        return Some(answer);
    }
    if let Some(text) = non_empty(&parsed.abstract_text) {
        return Some(match non_empty(&parsed.abstract_source) {
            Some(source) => format!("{text} (via {source})"),
            None => text,
        });
    }
    if let Some(definition) = non_empty(&parsed.definition) {
        return Some(definition);
    }

    let related: Vec<String> = parsed
        .related_topics
        .iter()
        .filter_map(|t| t.text.as_deref().and_then(non_empty))
        .take(RELATED_IN_DIGEST)
        .map(|t| format!("- {t}"))
        .collect();
    (!related.is_empty()).then(|| related.join("\n"))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiResponse {
    #[serde(default)]
    answer: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(default)]
    abstract_source: String,
    #[serde(default)]
    definition: String,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RelatedTopic {
    // Topic groups nest their entries under `Topics` and have no `Text`.
    #[serde(default)]
    text: Option<String>,
}
