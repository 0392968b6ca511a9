//! Answer-engine provider (Tavily-compatible `/search` endpoint).
//!
//! The highest-fidelity tier: the service synthesizes a direct answer and
//! returns the sources it used. A response without an `answer` is low signal.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use vantage_core::error::ProviderError;
use vantage_core::retrieval::{AnswerBody, ProviderAnswer, ProviderClient};

use super::{check_status, http_client, low_signal, transport_error, truncate};

const DEFAULT_API_URL: &str = "https://api.tavily.com/search";
const MAX_RESULTS: u32 = 5;
const SOURCES_IN_DIGEST: usize = 3;

pub struct AnswerSearchClient {
    id: String,
    api_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl AnswerSearchClient {
    pub fn new(id: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            id: id.into(),
            api_url: DEFAULT_API_URL.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client: http_client(),
        }
    }

    /// Point the client at a different endpoint (self-hosted or test server).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    fn request_body(query: &str) -> ApiRequest<'_> {
        ApiRequest {
            query,
            search_depth: "advanced",
            include_answer: true,
            max_results: MAX_RESULTS,
        }
    }
}

#[async_trait]
impl ProviderClient for AnswerSearchClient {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self, query: &str, timeout: Duration) -> Result<ProviderAnswer, ProviderError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ProviderError::MissingCredentials(self.id.clone()));
        };

        debug!(provider = %self.id, "Querying answer engine");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .timeout(timeout)
            .json(&Self::request_body(query))
            .send()
            .await
            .map_err(|e| transport_error(&self.id, timeout, e))?;

        let response = check_status(&self.id, response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(&self.id, timeout, e))?;
        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| low_signal(&self.id, format!("unparseable body: {e}")))?;

        let parsed: ApiResponse = serde_json::from_value(value.clone())
            .map_err(|e| low_signal(&self.id, format!("unexpected response shape: {e}")))?;

        let answer_present = parsed
            .answer
            .as_deref()
            .is_some_and(|a| !a.trim().is_empty());

        Ok(ProviderAnswer::structured(value, answer_present))
    }

    fn normalize(&self, answer: &ProviderAnswer) -> String {
        match &answer.raw {
            AnswerBody::Structured(value) => match serde_json::from_value::<ApiResponse>(value.clone()) {
                Ok(parsed) => render_digest(&parsed),
                Err(_) => answer.raw.to_text(),
            },
            AnswerBody::Text(text) => text.clone(),
        }
    }
}

fn render_digest(parsed: &ApiResponse) -> String {
    let mut out = parsed.answer.clone().unwrap_or_default().trim().to_string();
    let sources: Vec<String> = parsed
        .results
        .iter()
        .take(SOURCES_IN_DIGEST)
        .map(|r| format!("- {} ({})", r.title.trim(), r.url))
        .collect();
    if !out.is_empty() && !sources.is_empty() {
        out.push_str("\nSources:\n");
        out.push_str(&sources.join("\n"));
    }
    truncate(&out, 4000)
}

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
    include_answer: bool,
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<ApiResult>,
}

#[derive(Debug, Deserialize)]
struct ApiResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_fails_before_network() {
        let client = AnswerSearchClient::new("answer_search", None).with_api_url("http://127.0.0.1:9");
        let err = client
            .fetch("anything", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredentials(id) if id == "answer_search"));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let client = AnswerSearchClient::new("answer_search", Some("  ".into()));
        assert!(client.api_key.is_none());
    }

    #[test]
    fn request_asks_for_synthesized_answer() {
        let body = serde_json::to_value(AnswerSearchClient::request_body("mars rover")).unwrap();
        assert_eq!(body["query"], "mars rover");
        assert_eq!(body["include_answer"], true);
        assert_eq!(body["max_results"], 5);
    }

    #[test]
    fn normalize_renders_answer_and_sources() {
        let client = AnswerSearchClient::new("answer_search", Some("k".into()));
        let answer = ProviderAnswer::structured(
            serde_json::json!({
                "answer": "The launch moved to Friday.",
                "results": [
                    {"title": "Launch update", "url": "https://news.example/a"},
                    {"title": "Agency notice", "url": "https://agency.example/b"}
                ]
            }),
            true,
        );
        let text = client.normalize(&answer);
        assert!(text.starts_with("The launch moved to Friday."));
        assert!(text.contains("- Launch update (https://news.example/a)"));
        assert!(text.contains("Sources:"));
    }

    #[test]
    fn normalize_without_answer_is_empty() {
        let client = AnswerSearchClient::new("answer_search", Some("k".into()));
        let answer = ProviderAnswer::structured(
            serde_json::json!({"results": [{"title": "x", "url": "y"}]}),
            false,
        );
        assert!(client.normalize(&answer).is_empty());
    }

    // ── Over HTTP ──

    use crate::clients::stub::StubServer;

    fn client_for(server: &StubServer) -> AnswerSearchClient {
        AnswerSearchClient::new("answer_search", Some("tvly-key".into())).with_api_url(&server.url)
    }

    #[tokio::test]
    async fn fetch_posts_query_with_bearer_key() {
        let server = StubServer::start(
            200,
            r#"{"answer": "Friday.", "results": [{"title": "t", "url": "u"}]}"#,
        )
        .await;
        let answer = client_for(&server)
            .fetch("launch date", Duration::from_secs(5))
            .await
            .unwrap();
        assert!(answer.answer_present);

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].headers["authorization"], "Bearer tvly-key");
        let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(body["query"], "launch date");
        assert_eq!(body["include_answer"], true);
    }

    #[tokio::test]
    async fn ok_status_without_answer_is_not_an_answer() {
        let server = StubServer::start(200, r#"{"results": [{"title": "t", "url": "u"}]}"#).await;
        let answer = client_for(&server)
            .fetch("q", Duration::from_secs(5))
            .await
            .unwrap();
        assert!(!answer.answer_present);
    }

    #[tokio::test]
    async fn rejected_key_is_authentication_failure() {
        for status in [401, 403] {
            let server = StubServer::start(status, r#"{"detail": "bad key"}"#).await;
            let err = client_for(&server)
                .fetch("q", Duration::from_secs(5))
                .await
                .unwrap_err();
            assert!(
                matches!(&err, ProviderError::AuthenticationFailed(id) if id == "answer_search"),
                "{status}: {err}"
            );
        }
    }

    #[tokio::test]
    async fn other_error_status_is_api_error() {
        let server = StubServer::start(500, "upstream exploded").await;
        let err = client_for(&server)
            .fetch("q", Duration::from_secs(5))
            .await
            .unwrap_err();
        match err {
            ProviderError::ApiError {
                status_code,
                message,
                ..
            } => {
                assert_eq!(status_code, 500);
                assert!(message.contains("upstream exploded"));
            }
            other => panic!("expected ApiError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unexpected_shape_is_low_signal() {
        let server = StubServer::start(200, r#"{"answer": 42}"#).await;
        let err = client_for(&server)
            .fetch("q", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::LowSignal { .. }), "{err}");
    }
}
