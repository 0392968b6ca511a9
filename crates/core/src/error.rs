//! Error types for the Vantage domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; every one of them is
//! absorbed by the component that owns a safe default, so none of these
//! reach the HTTP caller as raw values.

use thiserror::Error;

/// The top-level error type for all Vantage operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Completion service errors ---
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    // --- Retrieval provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Intent router errors ---
    #[error("Router error: {0}")]
    Router(#[from] RouterError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Compaction errors ---
    #[error("Compaction error: {0}")]
    Compaction(#[from] CompactionError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// The completion service could not produce an answer.
///
/// Every variant means "completion unavailable" for this call; callers do
/// not distinguish between them beyond logging.
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by completion service, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Completion service not configured: {0}")]
    NotConfigured(String),

    #[error("Completion timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid completion response: {0}")]
    InvalidResponse(String),

    #[error("Completion cancelled")]
    Cancelled,
}

/// A single retrieval provider failed to produce a usable answer.
///
/// Recovered inside the retrieval cascade; never surfaced past it.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Missing credentials for provider '{0}'")]
    MissingCredentials(String),

    #[error("Authentication rejected by provider '{0}'")]
    AuthenticationFailed(String),

    #[error("Provider '{provider}' returned status {status_code}: {message}")]
    ApiError {
        provider: String,
        status_code: u16,
        message: String,
    },

    #[error("Transport error from provider '{provider}': {reason}")]
    Transport { provider: String, reason: String },

    #[error("Provider '{provider}' returned no usable answer: {reason}")]
    LowSignal { provider: String, reason: String },

    #[error("Provider '{provider}' timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    #[error("Provider '{0}' call cancelled")]
    Cancelled(String),
}

/// Failures of the intent router.
#[derive(Debug, Clone, Error)]
pub enum RouterError {
    /// The completion service answered, but not with a conforming decision.
    #[error("Malformed decision: {0}")]
    MalformedDecision(String),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

#[derive(Debug, Clone, Error)]
pub enum MemoryError {
    #[error("Cache storage error: {0}")]
    Storage(String),

    #[error("Cache transport error: {0}")]
    Transport(String),

    #[error("Corrupt cache value at '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

/// Compaction failures are logged and discarded by the memory store.
#[derive(Debug, Clone, Error)]
pub enum CompactionError {
    #[error("Compaction completion failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("Compaction produced an empty briefing")]
    EmptySummary,

    #[error("Failed to store briefing: {0}")]
    Store(#[from] MemoryError),
}
