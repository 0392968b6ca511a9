//! HTTP clients for the external intelligence providers.
//!
//! Each client maps its service's response into a [`ProviderAnswer`] and
//! reports every failure as a [`ProviderError`]. None of them retry.
//!
//! [`ProviderAnswer`]: vantage_core::retrieval::ProviderAnswer

pub mod answer_search;
pub mod instant_answer;
pub mod web_search;

pub use answer_search::AnswerSearchClient;
pub use instant_answer::InstantAnswerClient;
pub use web_search::WebSearchClient;

use std::time::Duration;
use vantage_core::error::ProviderError;

/// Connection-level ceiling; the cascade applies the real per-provider budget.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared client builder for provider adapters.
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(concat!("vantage/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Map a `reqwest` send/read failure into a provider error.
pub(crate) fn transport_error(provider: &str, timeout: Duration, err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout {
            provider: provider.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        ProviderError::Transport {
            provider: provider.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Reject non-success statuses. Returns the response untouched on 2xx.
pub(crate) async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status().as_u16();
    if response.status().is_success() {
        return Ok(response);
    }
    if status == 401 || status == 403 {
        return Err(ProviderError::AuthenticationFailed(provider.to_string()));
    }
    let message = response.text().await.unwrap_or_default();
    Err(ProviderError::ApiError {
        provider: provider.to_string(),
        status_code: status,
        message: truncate(&message, 300),
    })
}

pub(crate) fn low_signal(provider: &str, reason: impl Into<String>) -> ProviderError {
    ProviderError::LowSignal {
        provider: provider.to_string(),
        reason: reason.into(),
    }
}

/// Char-boundary-safe truncation for error bodies and snippets.
pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push('…');
    out
}
