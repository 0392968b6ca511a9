//! Completion service trait: the abstraction over the language-generation backend.
//!
//! The intent router, the compactor and the final persona synthesis all go
//! through this single operation. The core treats it as a black box:
//! messages in, text out, or a [`CompletionError`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::cancel::CancellationToken;
use crate::error::CompletionError;
use crate::message::Message;

/// A request to the completion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "gpt-4o-mini")
    pub model: String,

    /// The conversation messages
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Constrain the output shape (structured output)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

fn default_temperature() -> f32 {
    0.7
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: default_temperature(),
            max_tokens: None,
            response_format: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }
}

/// Output constraint for structured-output calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Any valid JSON object
    JsonObject,
    /// JSON conforming to the given schema
    JsonSchema {
        name: String,
        schema: serde_json::Value,
    },
}

/// A complete response from the completion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The generated text
    pub content: String,

    /// Which model actually responded (may differ from requested)
    pub model: String,

    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core completion trait.
///
/// Implementations are injected into every component that needs one;
/// there is no process-global client.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// A human-readable name for this backend (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, CompletionError>;

    /// Health check: can we reach the backend?
    async fn health_check(&self) -> std::result::Result<bool, CompletionError> {
        Ok(true)
    }
}

/// Run one completion call bounded by `timeout` and `cancel`.
///
/// Exceeding the budget or being cancelled is reported as this call's
/// failure, never as anything more.
pub async fn complete_within(
    service: &Arc<dyn CompletionService>,
    request: CompletionRequest,
    timeout: Duration,
    cancel: &CancellationToken,
) -> std::result::Result<CompletionResponse, CompletionError> {
    match cancel
        .run_until_cancelled(tokio::time::timeout(timeout, service.complete(request)))
        .await
    {
        None => Err(CompletionError::Cancelled),
        Some(Err(_)) => Err(CompletionError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }),
        Some(Ok(result)) => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowService;

    #[async_trait]
    impl CompletionService for SlowService {
        fn name(&self) -> &str {
            "slow"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> std::result::Result<CompletionResponse, CompletionError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(CompletionResponse {
                content: "late".into(),
                model: request.model,
                usage: None,
            })
        }
    }

    #[test]
    fn request_builder_defaults() {
        let req = CompletionRequest::new("gpt-4o-mini", vec![Message::user("hi")]);
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        assert!(req.response_format.is_none());
        assert!(req.max_tokens.is_none());
    }

    #[test]
    fn response_format_serializes_tagged() {
        let format = ResponseFormat::JsonSchema {
            name: "decision".into(),
            schema: serde_json::json!({"type": "object"}),
        };
        let json = serde_json::to_value(&format).unwrap();
        assert_eq!(json["type"], "json_schema");
        assert_eq!(json["name"], "decision");
    }

    #[tokio::test(start_paused = true)]
    async fn complete_within_times_out() {
        let service: Arc<dyn CompletionService> = Arc::new(SlowService);
        let req = CompletionRequest::new("m", vec![]);
        let err = complete_within(
            &service,
            req,
            Duration::from_millis(200),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CompletionError::Timeout { timeout_ms: 200 }));
    }

    #[tokio::test]
    async fn complete_within_reports_cancellation() {
        let service: Arc<dyn CompletionService> = Arc::new(SlowService);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = complete_within(
            &service,
            CompletionRequest::new("m", vec![]),
            Duration::from_secs(5),
            &cancel,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CompletionError::Cancelled));
    }
}
