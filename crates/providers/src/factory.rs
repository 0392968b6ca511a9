//! Completion backend construction from configuration.

use std::sync::Arc;
use tracing::info;
use vantage_core::completion::CompletionService;

use crate::openai_compat::OpenAiCompatProvider;

/// Build the completion service described by `config.completion`.
///
/// A missing API key still yields a service; it fails each call with
/// `NotConfigured`, which the orchestrator turns into the degraded response.
pub fn build_from_config(config: &vantage_config::AppConfig) -> Arc<dyn CompletionService> {
    let completion = &config.completion;
    let base_url = if completion.base_url.is_empty() {
        default_base_url(&completion.provider)
    } else {
        completion.base_url.clone()
    };

    info!(
        provider = %completion.provider,
        model = %completion.model,
        base_url = %base_url,
        "Completion backend configured"
    );

    Arc::new(OpenAiCompatProvider::new(
        &completion.provider,
        base_url,
        completion.api_key.clone().unwrap_or_default(),
    ))
}

/// Get the default base URL for well-known backends.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        _ => "https://api.openai.com/v1".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("openrouter").contains("openrouter.ai"));
        assert!(default_base_url("ollama").contains("localhost:11434"));
        assert!(default_base_url("unknown").contains("api.openai.com"));
    }

    #[test]
    fn build_from_default_config() {
        let config = vantage_config::AppConfig::default();
        let service = build_from_config(&config);
        assert_eq!(service.name(), "openai");
    }

    #[test]
    fn empty_base_url_uses_provider_default() {
        let mut config = vantage_config::AppConfig::default();
        config.completion.provider = "openrouter".into();
        config.completion.base_url = String::new();
        let service = build_from_config(&config);
        assert_eq!(service.name(), "openrouter");
    }
}
