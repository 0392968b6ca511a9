//! `vantage ask`: handle a single message in-process.
//!
//! Runs the same pipeline as `POST /v1/chat`, waits for the exchange to be
//! persisted, and prints the outcome as JSON on stdout.

use std::sync::Arc;
use vantage_config::AppConfig;
use vantage_core::event::EventBus;
use vantage_core::message::SessionKey;

pub async fn run(session: Option<String>, message: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No completion API key configured!");
        eprintln!();
        eprintln!("  Set VANTAGE_API_KEY (or OPENAI_API_KEY), or add api_key to:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let message = message.trim();
    if message.is_empty() {
        return Err("message must not be empty".into());
    }

    let session = session
        .filter(|s| !s.trim().is_empty())
        .map(SessionKey::from)
        .unwrap_or_else(SessionKey::new);

    let completion = vantage_providers::build_from_config(&config);
    let event_bus = Arc::new(EventBus::default());
    let orchestrator = vantage_agent::build_from_config(&config, completion, event_bus);
    let archive = vantage_memory::build_archive(&config.archive);

    let outcome = orchestrator.handle(&session, message).await;
    let compaction = vantage_gateway::persist_exchange(
        orchestrator.memory(),
        archive.as_ref(),
        &session,
        message,
        &outcome,
    )
    .await;
    // The process exits next; let a started compaction land first.
    if let Some(handle) = compaction {
        let _ = handle.await;
    }

    let output = serde_json::json!({
        "session_id": session.to_string(),
        "response": outcome.response,
        "source": outcome.source,
        "save_data": outcome.save_data,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
