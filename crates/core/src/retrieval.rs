//! Retrieval domain: external fact-finding providers and their normalized result.
//!
//! A [`ProviderClient`] wraps one remote intelligence service. Only three
//! outcomes matter to callers: success with an answer, success without an
//! answer (treated as failure), and transport failure.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ProviderError;

/// Fixed text returned when every provider failed.
pub const SILENCE_PROTOCOL_MESSAGE: &str = "SILENCE PROTOCOL: external intelligence is inconclusive \
for this query. No verified signal was found. Proceed on internal reasoning and state any \
uncertainty plainly.";

/// Confidence attached to the Silence Protocol record.
pub const SILENCE_CONFIDENCE: f32 = 0.2;

/// Wire name of the silence source.
pub const SILENCE_SOURCE: &str = "SILENCE";

/// The raw payload a provider returned.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerBody {
    Text(String),
    Structured(serde_json::Value),
}

impl AnswerBody {
    /// Best-effort text rendering of the payload.
    pub fn to_text(&self) -> String {
        match self {
            AnswerBody::Text(text) => text.clone(),
            AnswerBody::Structured(value) => match value {
                serde_json::Value::String(s) => s.clone(),
                other => serde_json::to_string_pretty(other).unwrap_or_default(),
            },
        }
    }
}

/// What a provider handed back on a transport-level success.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderAnswer {
    pub raw: AnswerBody,
    /// Whether the payload actually carries an answer.
    pub answer_present: bool,
}

impl ProviderAnswer {
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        let answer_present = !text.trim().is_empty();
        Self {
            raw: AnswerBody::Text(text),
            answer_present,
        }
    }

    pub fn structured(value: serde_json::Value, answer_present: bool) -> Self {
        Self {
            raw: AnswerBody::Structured(value),
            answer_present,
        }
    }
}

/// Uniform adapter around one external retrieval service.
///
/// Implementations do not retry; the retry policy belongs to the cascade.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Stable provider id; becomes the response `source` when this provider wins.
    fn id(&self) -> &str;

    /// Query the remote service within `timeout`.
    async fn fetch(
        &self,
        query: &str,
        timeout: Duration,
    ) -> std::result::Result<ProviderAnswer, ProviderError>;

    /// Flatten a successful answer into prompt-ready text.
    fn normalize(&self, answer: &ProviderAnswer) -> String {
        answer.raw.to_text()
    }
}

/// Where a retrieval record came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum RetrievalSource {
    Provider(String),
    Silence,
}

impl RetrievalSource {
    pub fn as_str(&self) -> &str {
        match self {
            RetrievalSource::Provider(id) => id,
            RetrievalSource::Silence => SILENCE_SOURCE,
        }
    }
}

impl From<RetrievalSource> for String {
    fn from(source: RetrievalSource) -> Self {
        source.as_str().to_string()
    }
}

impl From<String> for RetrievalSource {
    fn from(s: String) -> Self {
        if s == SILENCE_SOURCE {
            RetrievalSource::Silence
        } else {
            RetrievalSource::Provider(s)
        }
    }
}

impl std::fmt::Display for RetrievalSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exactly one of these is produced per retrieval cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalRecord {
    pub source: RetrievalSource,
    pub content: String,
    /// Fixed per provider tier, in `[0, 1]`.
    pub confidence: f32,
}

impl RetrievalRecord {
    /// The terminal no-signal record.
    pub fn silence() -> Self {
        Self {
            source: RetrievalSource::Silence,
            content: SILENCE_PROTOCOL_MESSAGE.to_string(),
            confidence: SILENCE_CONFIDENCE,
        }
    }

    pub fn is_silence(&self) -> bool {
        self.source == RetrievalSource::Silence
    }

    /// Render as a prompt section for synthesis.
    pub fn render(&self) -> String {
        format!(
            "## Retrieved Intelligence\nSource: {} (confidence {:.2})\n{}",
            self.source, self.confidence, self.content
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_record_is_fixed() {
        let record = RetrievalRecord::silence();
        assert!(record.is_silence());
        assert_eq!(record.content, SILENCE_PROTOCOL_MESSAGE);
        assert!((record.confidence - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn source_serializes_as_plain_string() {
        let json = serde_json::to_string(&RetrievalSource::Silence).unwrap();
        assert_eq!(json, "\"SILENCE\"");
        let json = serde_json::to_string(&RetrievalSource::Provider("web_search".into())).unwrap();
        assert_eq!(json, "\"web_search\"");

        let back: RetrievalSource = serde_json::from_str("\"SILENCE\"").unwrap();
        assert_eq!(back, RetrievalSource::Silence);
    }

    #[test]
    fn blank_text_answer_is_not_present() {
        assert!(!ProviderAnswer::text("   ").answer_present);
        assert!(ProviderAnswer::text("42").answer_present);
    }

    #[test]
    fn structured_body_renders_as_json() {
        let body = AnswerBody::Structured(serde_json::json!({"answer": "yes"}));
        assert!(body.to_text().contains("\"answer\""));
        let body = AnswerBody::Structured(serde_json::json!("plain"));
        assert_eq!(body.to_text(), "plain");
    }

    #[test]
    fn render_includes_source_and_confidence() {
        let record = RetrievalRecord {
            source: RetrievalSource::Provider("answer_search".into()),
            content: "Launch confirmed for Friday.".into(),
            confidence: 0.95,
        };
        let rendered = record.render();
        assert!(rendered.contains("answer_search"));
        assert!(rendered.contains("0.95"));
        assert!(rendered.contains("Launch confirmed"));
    }
}
