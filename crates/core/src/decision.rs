//! Router decisions: what to do with one incoming user message.

use serde::{Deserialize, Serialize};

/// Whether a message needs external fact-finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RouterAction {
    /// Run the retrieval cascade before answering
    Retrieve,
    /// Answer from memory and internal reasoning only
    Respond,
}

impl RouterAction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "RETRIEVE" => Some(RouterAction::Retrieve),
            "RESPOND" => Some(RouterAction::Respond),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RouterAction::Retrieve => "RETRIEVE",
            RouterAction::Respond => "RESPOND",
        }
    }
}

/// Transient classification result; consumed once by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterDecision {
    pub action: RouterAction,
    pub query: String,
    pub save_intent: bool,
    pub save_payload: Option<String>,
    pub category: String,
}

/// Category used when nothing better is known.
pub const DEFAULT_CATEGORY: &str = "general";

impl RouterDecision {
    /// The fallback used whenever classification cannot be trusted.
    pub fn safe_default(message: &str) -> Self {
        Self {
            action: RouterAction::Respond,
            query: message.to_string(),
            save_intent: false,
            save_payload: None,
            category: DEFAULT_CATEGORY.to_string(),
        }
    }

    /// The archival directive implied by this decision, if any.
    ///
    /// A save intent without a payload archives the original message.
    pub fn archive_directive(&self, message: &str) -> Option<ArchiveDirective> {
        if !self.save_intent {
            return None;
        }
        let content = self
            .save_payload
            .clone()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| message.to_string());
        Some(ArchiveDirective {
            content,
            category: self.category.clone(),
        })
    }
}

/// What the caller should persist to long-term archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveDirective {
    pub content: String,
    pub category: String,
}
