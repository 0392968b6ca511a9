//! REST key-value cache (Upstash-compatible).
//!
//! `GET {base}/get/{key}` answers `{"result": <string|null>}`;
//! `POST {base}/set/{key}?EX={secs}` stores the request body with expiry.
//! Both calls carry a bearer token.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use vantage_core::cache::CacheStore;
use vantage_core::error::MemoryError;

const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

pub struct RestCache {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl RestCache {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client,
        }
    }

    fn get_url(&self, key: &str) -> String {
        format!("{}/get/{}", self.base_url, urlencoding::encode(key))
    }

    fn set_url(&self, key: &str, ttl: Duration) -> String {
        format!(
            "{}/set/{}?EX={}",
            self.base_url,
            urlencoding::encode(key),
            ttl.as_secs().max(1)
        )
    }
}

#[async_trait]
impl CacheStore for RestCache {
    fn name(&self) -> &str {
        "rest"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, MemoryError> {
        let response = self
            .client
            .get(self.get_url(key))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| MemoryError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MemoryError::Storage(format!(
                "GET {key} returned status {}",
                response.status().as_u16()
            )));
        }

        let body: RestReply = response
            .json()
            .await
            .map_err(|e| MemoryError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        debug!(key, hit = body.result.is_some(), "REST cache read");
        Ok(body.result)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), MemoryError> {
        let response = self
            .client
            .post(self.set_url(key, ttl))
            .bearer_auth(&self.token)
            .body(value.to_string())
            .send()
            .await
            .map_err(|e| MemoryError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MemoryError::Storage(format!(
                "SET {key} returned status {}",
                response.status().as_u16()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RestReply {
    #[serde(default)]
    result: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_built_from_base() {
        let cache = RestCache::new("https://kv.example.io/", "t");
        assert_eq!(
            cache.get_url("vantage:abc:window"),
            "https://kv.example.io/get/vantage%3Aabc%3Awindow"
        );
        assert_eq!(
            cache.set_url("vantage:abc:window", Duration::from_secs(3600)),
            "https://kv.example.io/set/vantage%3Aabc%3Awindow?EX=3600"
        );
    }

    #[test]
    fn sub_second_ttl_rounds_up() {
        let cache = RestCache::new("http://kv", "t");
        assert!(cache.set_url("k", Duration::from_millis(10)).ends_with("EX=1"));
    }

    #[test]
    fn keys_are_percent_encoded() {
        let cache = RestCache::new("http://kv", "t");
        assert_eq!(cache.get_url("a b/c"), "http://kv/get/a%20b%2Fc");
        assert_eq!(cache.get_url("plain-key_1.x"), "http://kv/get/plain-key_1.x");
    }

    #[test]
    fn reply_with_null_result_is_absent() {
        let reply: RestReply = serde_json::from_str(r#"{"result": null}"#).unwrap();
        assert!(reply.result.is_none());
        let reply: RestReply = serde_json::from_str(r#"{"result": "[]"}"#).unwrap();
        assert_eq!(reply.result.as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let cache = RestCache::new("http://127.0.0.1:9", "t");
        let err = cache.get("k").await.unwrap_err();
        assert!(matches!(err, MemoryError::Transport(_)));
    }
}
