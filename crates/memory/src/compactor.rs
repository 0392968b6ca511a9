//! Compaction: turning an overflowing turn history into a briefing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use vantage_core::cancel::CancellationToken;
use vantage_core::completion::{CompletionRequest, CompletionService, complete_within};
use vantage_core::error::CompactionError;
use vantage_core::message::{ConversationTurn, Message, render_turns};

const COMPACTION_INSTRUCTIONS: &str = "You compress conversation history into a briefing \
for the assistant that will continue this conversation. Keep names, figures, decisions, \
open questions and stated user preferences. Drop pleasantries and repetition. Write in \
third person, in short paragraphs, no more than 250 words. Output only the briefing.";

/// Produces a briefing from the complete history it is handed.
///
/// Each call summarizes exactly `turns`; the previous briefing is not an input.
#[async_trait]
pub trait Compactor: Send + Sync {
    async fn compact(&self, turns: &[ConversationTurn]) -> Result<String, CompactionError>;
}

/// Compacts through the completion service.
pub struct LlmCompactor {
    service: Arc<dyn CompletionService>,
    model: String,
    timeout: Duration,
}

impl LlmCompactor {
    pub fn new(service: Arc<dyn CompletionService>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            service,
            model: model.into(),
            timeout,
        }
    }

    fn request(&self, turns: &[ConversationTurn]) -> CompletionRequest {
        CompletionRequest::new(
            self.model.clone(),
            vec![
                Message::system(COMPACTION_INSTRUCTIONS),
                Message::user(format!("Conversation so far:\n{}", render_turns(turns))),
            ],
        )
        .with_temperature(0.2)
    }
}

#[async_trait]
impl Compactor for LlmCompactor {
    async fn compact(&self, turns: &[ConversationTurn]) -> Result<String, CompactionError> {
        // Detached from any request; only the timeout bounds it.
        let response = complete_within(
            &self.service,
            self.request(turns),
            self.timeout,
            &CancellationToken::new(),
        )
        .await?;

        let briefing = response.content.trim().to_string();
        if briefing.is_empty() {
            return Err(CompactionError::EmptySummary);
        }
        Ok(briefing)
    }
}
