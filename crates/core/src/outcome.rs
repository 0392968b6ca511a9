//! The single caller-facing result of handling one message.

use serde::{Deserialize, Serialize};

use crate::decision::ArchiveDirective;
use crate::retrieval::{RetrievalSource, SILENCE_SOURCE};

/// Fixed user-visible text when synthesis could not run.
pub const DEGRADED_RESPONSE: &str = "I'm having trouble reaching my reasoning core right now. \
Please try again in a moment.";

const INTERNAL_CORE: &str = "INTERNAL_CORE";
const ERROR: &str = "ERROR";

/// Source strings with a fixed meaning. A provider id must not be one of
/// these, or its answers would read back as a different variant.
pub const RESERVED_SOURCE_IDS: [&str; 3] = [INTERNAL_CORE, SILENCE_SOURCE, ERROR];

/// Where the substance of a response came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ResponseSource {
    /// No retrieval was needed
    InternalCore,
    /// A retrieval provider, by id
    Provider(String),
    /// Every provider failed
    Silence,
    /// Synthesis failed; the response is the fixed degraded text
    Error,
}

impl ResponseSource {
    pub fn as_str(&self) -> &str {
        match self {
            ResponseSource::InternalCore => INTERNAL_CORE,
            ResponseSource::Provider(id) => id,
            ResponseSource::Silence => SILENCE_SOURCE,
            ResponseSource::Error => ERROR,
        }
    }
}

impl From<RetrievalSource> for ResponseSource {
    fn from(source: RetrievalSource) -> Self {
        match source {
            RetrievalSource::Provider(id) => ResponseSource::Provider(id),
            RetrievalSource::Silence => ResponseSource::Silence,
        }
    }
}

impl From<ResponseSource> for String {
    fn from(source: ResponseSource) -> Self {
        source.as_str().to_string()
    }
}

impl From<String> for ResponseSource {
    fn from(s: String) -> Self {
        match s.as_str() {
            INTERNAL_CORE => ResponseSource::InternalCore,
            SILENCE_SOURCE => ResponseSource::Silence,
            ERROR => ResponseSource::Error,
            _ => ResponseSource::Provider(s),
        }
    }
}

impl std::fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{response, source, saveData}` as returned by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandleOutcome {
    pub response: String,
    pub source: ResponseSource,
    pub save_data: Option<ArchiveDirective>,
}

impl HandleOutcome {
    /// The terminal degraded outcome.
    pub fn degraded() -> Self {
        Self {
            response: DEGRADED_RESPONSE.to_string(),
            source: ResponseSource::Error,
            save_data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_ids_never_parse_as_providers() {
        for id in RESERVED_SOURCE_IDS {
            let source = ResponseSource::from(id.to_string());
            assert!(!matches!(source, ResponseSource::Provider(_)), "{id}");
            assert_eq!(source.as_str(), id);
        }
        assert_eq!(
            ResponseSource::from("web_search".to_string()),
            ResponseSource::Provider("web_search".into())
        );
    }

    #[test]
    fn source_round_trips_through_strings() {
        for source in [
            ResponseSource::InternalCore,
            ResponseSource::Silence,
            ResponseSource::Error,
            ResponseSource::Provider("answer_search".into()),
        ] {
            let s: String = source.clone().into();
            assert_eq!(ResponseSource::from(s), source);
        }
    }

    #[test]
    fn retrieval_source_maps_to_response_source() {
        assert_eq!(
            ResponseSource::from(RetrievalSource::Silence),
            ResponseSource::Silence
        );
        assert_eq!(
            ResponseSource::from(RetrievalSource::Provider("web_search".into())).as_str(),
            "web_search"
        );
    }

    #[test]
    fn degraded_outcome_is_error_sourced() {
        let outcome = HandleOutcome::degraded();
        assert_eq!(outcome.source, ResponseSource::Error);
        assert_eq!(outcome.response, DEGRADED_RESPONSE);
        assert!(outcome.save_data.is_none());
    }
}
