//! Intent router: classifies one user message into a [`RouterDecision`].
//!
//! One structured-output call to the completion service, constrained by a
//! JSON schema. The reply is validated field by field; anything that does
//! not conform is a [`RouterError::MalformedDecision`]. Classification sees
//! only the current message.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use vantage_core::cancel::CancellationToken;
use vantage_core::completion::{
    CompletionRequest, CompletionService, ResponseFormat, complete_within,
};
use vantage_core::decision::{DEFAULT_CATEGORY, RouterAction, RouterDecision};
use vantage_core::error::RouterError;
use vantage_core::message::Message;

const ROUTER_INSTRUCTIONS: &str = "You are the intent router of a research assistant. \
Classify the user's message and reply with a single JSON object.\n\
- action: \"RETRIEVE\" when answering needs current or external facts (prices, news, \
schedules, statistics, anything that changes over time or that you cannot know reliably); \
\"RESPOND\" for conversation, opinions, reasoning, or questions about the conversation itself.\n\
- query: a concise standalone search query for RETRIEVE; repeat the message for RESPOND.\n\
- saveIntent: true only when the user asks to remember, track, watch, bookmark or save something.\n\
- savePayload: the exact thing to save when saveIntent is true, otherwise null.\n\
- category: one short lowercase word describing the topic (e.g. \"markets\", \"tech\", \"general\").";

const SCHEMA_NAME: &str = "router_decision";

/// JSON schema the completion service is constrained to.
pub fn decision_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "action": { "type": "string", "enum": ["RETRIEVE", "RESPOND"] },
            "query": { "type": "string" },
            "saveIntent": { "type": "boolean" },
            "savePayload": { "type": ["string", "null"] },
            "category": { "type": "string" }
        },
        "required": ["action", "query", "saveIntent", "savePayload", "category"],
        "additionalProperties": false
    })
}

/// Stateless single-shot classifier.
pub struct IntentRouter {
    completion: Arc<dyn CompletionService>,
    model: String,
    timeout: Duration,
}

impl IntentRouter {
    pub fn new(completion: Arc<dyn CompletionService>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            completion,
            model: model.into(),
            timeout,
        }
    }

    pub async fn classify(&self, message: &str) -> Result<RouterDecision, RouterError> {
        self.classify_with_cancel(message, &CancellationToken::new())
            .await
    }

    /// Classify `message`. Completion failures come back as
    /// [`RouterError::Completion`], non-conforming output as
    /// [`RouterError::MalformedDecision`].
    pub async fn classify_with_cancel(
        &self,
        message: &str,
        cancel: &CancellationToken,
    ) -> Result<RouterDecision, RouterError> {
        let request = CompletionRequest::new(
            self.model.clone(),
            vec![Message::system(ROUTER_INSTRUCTIONS), Message::user(message)],
        )
        .with_temperature(0.0)
        .with_response_format(ResponseFormat::JsonSchema {
            name: SCHEMA_NAME.into(),
            schema: decision_schema(),
        });

        let response = complete_within(&self.completion, request, self.timeout, cancel).await?;
        debug!(raw = %response.content, "Router reply");

        parse_decision(&response.content, message)
    }
}

/// Validate a raw router reply against the decision schema.
///
/// A blank `query` on a RETRIEVE decision is replaced by `message`, and a
/// blank category by the default one.
pub fn parse_decision(raw: &str, message: &str) -> Result<RouterDecision, RouterError> {
    let malformed = |reason: String| RouterError::MalformedDecision(reason);

    let value: serde_json::Value = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| malformed(format!("not JSON: {e}")))?;
    let object = value
        .as_object()
        .ok_or_else(|| malformed("not a JSON object".into()))?;

    let action_raw = object
        .get("action")
        .and_then(|v| v.as_str())
        .ok_or_else(|| malformed("missing string field 'action'".into()))?;
    let action = RouterAction::parse(action_raw)
        .ok_or_else(|| malformed(format!("unknown action '{action_raw}'")))?;

    let query = object
        .get("query")
        .and_then(|v| v.as_str())
        .ok_or_else(|| malformed("missing string field 'query'".into()))?;

    let save_intent = object
        .get("saveIntent")
        .and_then(|v| v.as_bool())
        .ok_or_else(|| malformed("missing boolean field 'saveIntent'".into()))?;

    let save_payload = match object.get("savePayload") {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(other) => return Err(malformed(format!("savePayload must be string or null, got {other}"))),
    };

    let category = object
        .get("category")
        .and_then(|v| v.as_str())
        .ok_or_else(|| malformed("missing string field 'category'".into()))?;

    let query = if query.trim().is_empty() {
        message.to_string()
    } else {
        query.trim().to_string()
    };
    let category = if category.trim().is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        category.trim().to_lowercase()
    };

    Ok(RouterDecision {
        action,
        query,
        save_intent,
        save_payload,
        category,
    })
}

/// Strip a surrounding Markdown code fence, if any.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.strip_prefix("json").unwrap_or(rest);
    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ScriptedCompletion;
    use vantage_core::error::CompletionError;

    #[test]
    fn parses_a_conforming_decision() {
        let raw = r#"{"action":"RETRIEVE","query":"NVDA price today","saveIntent":true,
            "savePayload":"NVDA","category":"Markets"}"#;
        let d = parse_decision(raw, "how is nvidia doing").unwrap();
        assert_eq!(d.action, RouterAction::Retrieve);
        assert_eq!(d.query, "NVDA price today");
        assert!(d.save_intent);
        assert_eq!(d.save_payload.as_deref(), Some("NVDA"));
        assert_eq!(d.category, "markets");
    }

    #[test]
    fn code_fences_are_stripped() {
        let raw = "```json\n{\"action\":\"RESPOND\",\"query\":\"hi\",\"saveIntent\":false,\"savePayload\":null,\"category\":\"general\"}\n```";
        let d = parse_decision(raw, "hi").unwrap();
        assert_eq!(d.action, RouterAction::Respond);
        assert!(d.save_payload.is_none());
    }

    #[test]
    fn unknown_action_is_malformed() {
        let raw = r#"{"action":"SEARCH","query":"x","saveIntent":false,"savePayload":null,"category":"general"}"#;
        assert!(matches!(
            parse_decision(raw, "x"),
            Err(RouterError::MalformedDecision(_))
        ));
    }

    #[test]
    fn lowercase_action_is_malformed() {
        let raw = r#"{"action":"respond","query":"x","saveIntent":false,"savePayload":null,"category":"general"}"#;
        assert!(parse_decision(raw, "x").is_err());
    }

    #[test]
    fn non_boolean_save_intent_is_malformed() {
        let raw = r#"{"action":"RESPOND","query":"x","saveIntent":"yes","savePayload":null,"category":"general"}"#;
        let err = parse_decision(raw, "x").unwrap_err();
        assert!(err.to_string().contains("saveIntent"));
    }

    #[test]
    fn missing_fields_are_malformed() {
        assert!(parse_decision(r#"{"action":"RESPOND"}"#, "x").is_err());
        assert!(parse_decision("[]", "x").is_err());
        assert!(parse_decision("Sure! Here's my answer.", "x").is_err());
    }

    #[test]
    fn blank_query_falls_back_to_message() {
        let raw = r#"{"action":"RETRIEVE","query":"  ","saveIntent":false,"savePayload":null,"category":""}"#;
        let d = parse_decision(raw, "latest mars rover news").unwrap();
        assert_eq!(d.query, "latest mars rover news");
        assert_eq!(d.category, DEFAULT_CATEGORY);
    }

    #[test]
    fn schema_requires_every_field() {
        let schema = decision_schema();
        assert_eq!(schema["required"].as_array().unwrap().len(), 5);
        assert_eq!(schema["properties"]["action"]["enum"][0], "RETRIEVE");
    }

    #[tokio::test]
    async fn classify_sends_structured_request() {
        let completion = Arc::new(ScriptedCompletion::new(vec![Ok(
            r#"{"action":"RESPOND","query":"hello","saveIntent":false,"savePayload":null,"category":"general"}"#.into(),
        )]));
        let router = IntentRouter::new(completion.clone(), "router-model", Duration::from_secs(5));

        let d = router.classify("hello").await.unwrap();
        assert_eq!(d.action, RouterAction::Respond);

        let requests = completion.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "router-model");
        assert!(requests[0].temperature.abs() < f32::EPSILON);
        assert!(matches!(
            requests[0].response_format,
            Some(ResponseFormat::JsonSchema { .. })
        ));
        // Only the message itself; no memory or retrieval context.
        assert_eq!(requests[0].messages.len(), 2);
        assert_eq!(requests[0].messages[1].content, "hello");
    }

    #[tokio::test]
    async fn completion_failure_is_not_malformed() {
        let completion = Arc::new(ScriptedCompletion::new(vec![Err(
            CompletionError::Network("down".into()),
        )]));
        let router = IntentRouter::new(completion, "m", Duration::from_secs(5));
        assert!(matches!(
            router.classify("hi").await,
            Err(RouterError::Completion(_))
        ));
    }
}
