//! The orchestrator: one inbound message in, one [`HandleOutcome`] out.
//!
//! Steps run strictly in sequence, each depending on the previous one:
//!
//! 1. **Classify** the message with the [`IntentRouter`]; malformed output
//!    falls back to the safe default decision
//! 2. **Retrieve** through the cascade when the decision asks for it
//! 3. **Read memory** (hot window + briefing) for the session
//! 4. **Assemble** the synthesis prompt from persona, memory and retrieval
//! 5. **Synthesize** with one completion call; failure yields the fixed
//!    degraded outcome
//! 6. **Return** `{response, source, save_data}`
//!
//! Appending the new turns to memory and archiving `save_data` are the
//! caller's job; `handle` only reads memory.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use vantage_core::cancel::CancellationToken;
use vantage_core::completion::{CompletionRequest, CompletionService, complete_within};
use vantage_core::decision::{RouterAction, RouterDecision};
use vantage_core::error::{CompletionError, RouterError};
use vantage_core::event::{DomainEvent, EventBus};
use vantage_core::message::{Message, SessionKey};
use vantage_core::outcome::{HandleOutcome, ResponseSource};
use vantage_core::retrieval::RetrievalRecord;
use vantage_memory::{MemorySnapshot, MemoryStore};
use vantage_retrieval::RetrievalCascade;

use crate::persona::Persona;
use crate::router::IntentRouter;

/// Synthesis call settings.
#[derive(Debug, Clone)]
pub struct SynthesisSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".into(),
            temperature: 0.7,
            max_tokens: None,
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct Orchestrator {
    router: IntentRouter,
    cascade: Arc<RetrievalCascade>,
    memory: Arc<MemoryStore>,
    completion: Arc<dyn CompletionService>,
    persona: Persona,
    synthesis: SynthesisSettings,
    event_bus: Arc<EventBus>,
}

impl Orchestrator {
    pub fn new(
        router: IntentRouter,
        cascade: Arc<RetrievalCascade>,
        memory: Arc<MemoryStore>,
        completion: Arc<dyn CompletionService>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            router,
            cascade,
            memory,
            completion,
            persona: Persona::default(),
            synthesis: SynthesisSettings::default(),
            event_bus,
        }
    }

    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    pub fn with_synthesis(mut self, synthesis: SynthesisSettings) -> Self {
        self.synthesis = synthesis;
        self
    }

    /// The memory store this orchestrator reads from.
    pub fn memory(&self) -> &Arc<MemoryStore> {
        &self.memory
    }

    pub async fn handle(&self, session: &SessionKey, message: &str) -> HandleOutcome {
        self.handle_with_cancel(session, message, &CancellationToken::new())
            .await
    }

    /// Handle one message. Never fails: every internal error resolves to a
    /// safe default or to the degraded outcome.
    ///
    /// Cancelling `cancel` aborts the in-flight provider or completion call;
    /// nothing is committed before the outcome is returned.
    pub async fn handle_with_cancel(
        &self,
        session: &SessionKey,
        message: &str,
        cancel: &CancellationToken,
    ) -> HandleOutcome {
        info!(session = %session, chars = message.len(), "Handling message");

        // ── 1. Classify ──
        let (decision, fallback) = match self.router.classify_with_cancel(message, cancel).await {
            Ok(decision) => (decision, false),
            Err(RouterError::MalformedDecision(reason)) => {
                warn!(session = %session, reason = %reason, "Malformed router decision, using safe default");
                (RouterDecision::safe_default(message), true)
            }
            Err(RouterError::Completion(e)) => {
                return self.degraded(session, "router", &e);
            }
        };

        self.event_bus.publish(DomainEvent::DecisionMade {
            session: session.to_string(),
            action: decision.action.as_str().to_string(),
            save_intent: decision.save_intent,
            fallback,
            timestamp: Utc::now(),
        });

        // ── 2. Retrieve ──
        let record = match decision.action {
            RouterAction::Retrieve => {
                let query = if decision.query.trim().is_empty() {
                    message
                } else {
                    decision.query.as_str()
                };
                Some(self.cascade.resolve_with_cancel(query, cancel).await)
            }
            RouterAction::Respond => None,
        };

        // ── 3. Memory ──
        let snapshot = self.memory.read(session).await;

        // ── 4. Assemble ──
        let messages = build_synthesis_messages(&self.persona, &snapshot, record.as_ref(), message);
        let request = CompletionRequest::new(self.synthesis.model.clone(), messages)
            .with_temperature(self.synthesis.temperature)
            .with_max_tokens(self.synthesis.max_tokens);

        // ── 5. Synthesize ──
        let response = match complete_within(&self.completion, request, self.synthesis.timeout, cancel).await {
            Ok(r) if !r.content.trim().is_empty() => r.content,
            Ok(_) => {
                let e = CompletionError::InvalidResponse("empty synthesis".into());
                return self.degraded(session, "synthesis", &e);
            }
            Err(e) => return self.degraded(session, "synthesis", &e),
        };

        // ── 6. Outcome ──
        let source = record
            .map(|r| ResponseSource::from(r.source))
            .unwrap_or(ResponseSource::InternalCore);

        info!(session = %session, source = %source, "Response generated");
        self.event_bus.publish(DomainEvent::ResponseGenerated {
            session: session.to_string(),
            source: source.to_string(),
            timestamp: Utc::now(),
        });

        HandleOutcome {
            response,
            source,
            save_data: decision.archive_directive(message),
        }
    }

    fn degraded(&self, session: &SessionKey, stage: &str, err: &CompletionError) -> HandleOutcome {
        error!(session = %session, stage, error = %err, "Completion unavailable, returning degraded response");
        self.event_bus.publish(DomainEvent::ErrorOccurred {
            context: format!("{stage}:{session}"),
            error_message: err.to_string(),
            timestamp: Utc::now(),
        });
        HandleOutcome::degraded()
    }
}

/// Persona directives, then memory context, then the retrieval record, then
/// the user's message.
pub fn build_synthesis_messages(
    persona: &Persona,
    snapshot: &MemorySnapshot,
    record: Option<&RetrievalRecord>,
    message: &str,
) -> Vec<Message> {
    let mut system = persona.system_prompt().to_string();

    let memory = snapshot.render_context();
    if !memory.is_empty() {
        system.push_str("\n\n## Conversation Memory\n");
        system.push_str(&memory);
    }

    if let Some(record) = record {
        system.push_str("\n\n");
        system.push_str(&record.render());
    }

    vec![Message::system(system), Message::user(message)]
}
