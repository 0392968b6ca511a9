//! Web search provider (Serper-compatible Google results API).
//!
//! Builds a digest from the answer box, the knowledge graph and the top
//! organic snippets. An empty digest is low signal.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use vantage_core::error::ProviderError;
use vantage_core::retrieval::{ProviderAnswer, ProviderClient};

use super::{check_status, http_client, low_signal, transport_error, truncate};

const DEFAULT_API_URL: &str = "https://google.serper.dev/search";
const RESULT_COUNT: u32 = 5;
const SNIPPETS_IN_DIGEST: usize = 4;

pub struct WebSearchClient {
    id: String,
    api_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl WebSearchClient {
    pub fn new(id: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            id: id.into(),
            api_url: DEFAULT_API_URL.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client: http_client(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

#[async_trait]
impl ProviderClient for WebSearchClient {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self, query: &str, timeout: Duration) -> Result<ProviderAnswer, ProviderError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ProviderError::MissingCredentials(self.id.clone()));
        };

        debug!(provider = %self.id, "Querying web search");

        let response = self
            .client
            .post(&self.api_url)
            .header("X-API-KEY", api_key)
            .timeout(timeout)
            .json(&ApiRequest {
                q: query,
                num: RESULT_COUNT,
            })
            .send()
            .await
            .map_err(|e| transport_error(&self.id, timeout, e))?;

        let response = check_status(&self.id, response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(&self.id, timeout, e))?;
        let parsed: ApiResponse = serde_json::from_str(&body)
            .map_err(|e| low_signal(&self.id, format!("unexpected response shape: {e}")))?;

        let digest = build_digest(&parsed);
        if digest.is_empty() {
            return Err(low_signal(&self.id, "no answer box, knowledge graph or snippets"));
        }
        Ok(ProviderAnswer::text(digest))
    }
}

fn build_digest(parsed: &ApiResponse) -> String {
    let mut lines = Vec::new();

    if let Some(answer_box) = &parsed.answer_box {
        if let Some(text) = answer_box
            .answer
            .as_deref()
            .or(answer_box.snippet.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            lines.push(format!("Answer: {text}"));
        }
    }

    if let Some(graph) = &parsed.knowledge_graph {
        let title = graph.title.as_deref().unwrap_or_default().trim();
        let description = graph.description.as_deref().unwrap_or_default().trim();
        if !description.is_empty() {
            if title.is_empty() {
                lines.push(description.to_string());
            } else {
                lines.push(format!("{title}: {description}"));
            }
        }
    }

    for item in parsed
        .organic
        .iter()
        .filter(|o| !o.snippet.trim().is_empty())
        .take(SNIPPETS_IN_DIGEST)
    {
        lines.push(format!(
            "- {}: {} ({})",
            item.title.trim(),
            truncate(item.snippet.trim(), 400),
            item.link
        ));
    }

    lines.join("\n")
}

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    q: &'a str,
    num: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    #[serde(default)]
    answer_box: Option<AnswerBox>,
    #[serde(default)]
    knowledge_graph: Option<KnowledgeGraph>,
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct AnswerBox {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KnowledgeGraph {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}
