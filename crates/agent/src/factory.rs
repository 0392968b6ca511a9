//! Wire an [`Orchestrator`] from configuration.

use std::sync::Arc;
use tracing::info;
use vantage_config::AppConfig;
use vantage_core::completion::CompletionService;
use vantage_core::event::EventBus;
use vantage_memory::{LlmCompactor, build_cache, build_store};

use crate::orchestrator::{Orchestrator, SynthesisSettings};
use crate::persona::Persona;
use crate::router::IntentRouter;

/// Build the full request pipeline around one completion service.
///
/// The cache backend, retrieval providers, window size and persona all come
/// from `config`; every component shares `event_bus`.
pub fn build_from_config(
    config: &AppConfig,
    completion: Arc<dyn CompletionService>,
    event_bus: Arc<EventBus>,
) -> Orchestrator {
    let router = IntentRouter::new(
        completion.clone(),
        config.completion.router_model(),
        config.completion.timeout(),
    );

    let cascade = vantage_retrieval::build_from_config(&config.retrieval)
        .with_event_bus(event_bus.clone());

    let compactor = Arc::new(LlmCompactor::new(
        completion.clone(),
        config.completion.compaction_model(),
        config.memory.compaction_timeout(),
    ));
    let memory = build_store(
        &config.memory,
        build_cache(&config.memory),
        compactor,
        event_bus.clone(),
    );

    info!(
        model = %config.completion.model,
        window_size = config.memory.window_size,
        providers = cascade.len(),
        "Orchestrator ready"
    );

    Orchestrator::new(
        router,
        Arc::new(cascade),
        Arc::new(memory),
        completion,
        event_bus,
    )
    .with_persona(Persona::from_config(&config.persona))
    .with_synthesis(SynthesisSettings {
        model: config.completion.model.clone(),
        temperature: config.completion.temperature,
        max_tokens: config.completion.max_tokens,
        timeout: config.completion.timeout(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedCompletion, decision_json};
    use vantage_core::message::SessionKey;
    use vantage_core::outcome::ResponseSource;

    #[tokio::test]
    async fn default_config_pipeline_answers_respond_messages() {
        let completion = Arc::new(ScriptedCompletion::routed(
            &decision_json("RESPOND", "hi", None, "general"),
            "Hello from the pipeline.",
        ));
        let orch = build_from_config(
            &AppConfig::default(),
            completion.clone(),
            Arc::new(EventBus::default()),
        );

        let outcome = orch.handle(&SessionKey::from("cfg"), "hi").await;
        assert_eq!(outcome.source, ResponseSource::InternalCore);
        assert_eq!(outcome.response, "Hello from the pipeline.");
        assert_eq!(orch.memory().window_size(), 30);

        let requests = completion.requests();
        assert_eq!(requests[1].model, AppConfig::default().completion.model);
        assert!(requests[1].messages[0].content.starts_with("You are Vantage"));
    }
}
