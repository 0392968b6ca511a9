//! Configuration loading, validation, and management for Vantage.
//!
//! Loads configuration from `~/.vantage/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use vantage_core::outcome::RESERVED_SOURCE_IDS;

/// The root configuration structure.
///
/// Maps directly to `~/.vantage/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion service settings
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Retrieval cascade settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Conversation memory settings
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Long-term archive settings
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Persona directives for synthesis
    #[serde(default)]
    pub persona: PersonaConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

fn default_true() -> bool {
    true
}

// ── Completion ────────────────────────────────────────────────────────────

#[derive(Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Backend name used in logs (e.g., "openai", "openrouter")
    #[serde(default = "default_completion_provider")]
    pub provider: String,

    #[serde(default = "default_completion_url")]
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model for persona synthesis
    #[serde(default = "default_model")]
    pub model: String,

    /// Model for intent classification (defaults to `model`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router_model: Option<String>,

    /// Model for briefing compaction (defaults to `model`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compaction_model: Option<String>,

    /// Synthesis temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Per-call budget for every completion request
    #[serde(default = "default_completion_timeout")]
    pub timeout_secs: u64,
}

fn default_completion_provider() -> String {
    "openai".into()
}
fn default_completion_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_completion_timeout() -> u64 {
    30
}

impl CompletionConfig {
    pub fn router_model(&self) -> &str {
        self.router_model.as_deref().unwrap_or(&self.model)
    }

    pub fn compaction_model(&self) -> &str {
        self.compaction_model.as_deref().unwrap_or(&self.model)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: default_completion_provider(),
            base_url: default_completion_url(),
            api_key: None,
            model: default_model(),
            router_model: None,
            compaction_model: None,
            temperature: default_temperature(),
            max_tokens: None,
            timeout_secs: default_completion_timeout(),
        }
    }
}

impl std::fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("router_model", &self.router_model)
            .field("compaction_model", &self.compaction_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// ── Retrieval ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Process-wide cap on concurrent outbound provider calls
    #[serde(default = "default_max_concurrent_calls")]
    pub max_concurrent_calls: usize,

    /// Race the first two providers instead of trying them in turn
    #[serde(default)]
    pub race_top_two: bool,

    /// Providers in priority order (highest fidelity first)
    #[serde(default = "default_retrieval_providers")]
    pub providers: Vec<RetrievalProviderConfig>,
}

fn default_max_concurrent_calls() -> usize {
    16
}

fn default_retrieval_providers() -> Vec<RetrievalProviderConfig> {
    vec![
        RetrievalProviderConfig::new("answer_search", ProviderKind::AnswerSearch, 0.95, 8),
        RetrievalProviderConfig::new("web_search", ProviderKind::WebSearch, 0.8, 6),
        RetrievalProviderConfig::new("instant_answer", ProviderKind::InstantAnswer, 0.6, 5),
    ]
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            providers: default_retrieval_providers(),
            max_concurrent_calls: default_max_concurrent_calls(),
            race_top_two: false,
        }
    }
}

/// Which adapter backs a retrieval provider entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// AI-answer search service (Tavily-compatible)
    AnswerSearch,
    /// Web search service (Serper-compatible)
    WebSearch,
    /// Keyless instant-answer fallback (DuckDuckGo-compatible)
    InstantAnswer,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RetrievalProviderConfig {
    pub id: String,

    pub kind: ProviderKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Fixed confidence tier in `[0, 1]`
    pub confidence: f32,

    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_provider_timeout() -> u64 {
    8
}

impl RetrievalProviderConfig {
    pub fn new(id: &str, kind: ProviderKind, confidence: f32, timeout_secs: u64) -> Self {
        Self {
            id: id.into(),
            kind,
            api_key: None,
            api_url: None,
            confidence,
            timeout_secs,
            enabled: true,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl std::fmt::Debug for RetrievalProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalProviderConfig")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("confidence", &self.confidence)
            .field("timeout_secs", &self.timeout_secs)
            .field("enabled", &self.enabled)
            .finish()
    }
}

// ── Memory ────────────────────────────────────────────────────────────────

#[derive(Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Hot window capacity (W)
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Sliding idle expiry for window and briefing
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// "in_memory" or "rest"
    #[serde(default = "default_cache_backend")]
    pub cache: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_token: Option<String>,

    #[serde(default = "default_compaction_timeout")]
    pub compaction_timeout_secs: u64,
}

fn default_window_size() -> usize {
    30
}
fn default_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}
fn default_key_prefix() -> String {
    "vantage".into()
}
fn default_cache_backend() -> String {
    "in_memory".into()
}
fn default_compaction_timeout() -> u64 {
    60
}

impl MemoryConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn compaction_timeout(&self) -> Duration {
        Duration::from_secs(self.compaction_timeout_secs)
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            ttl_secs: default_ttl_secs(),
            key_prefix: default_key_prefix(),
            cache: default_cache_backend(),
            cache_url: None,
            cache_token: None,
            compaction_timeout_secs: default_compaction_timeout(),
        }
    }
}

impl std::fmt::Debug for MemoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryConfig")
            .field("window_size", &self.window_size)
            .field("ttl_secs", &self.ttl_secs)
            .field("key_prefix", &self.key_prefix)
            .field("cache", &self.cache)
            .field("cache_url", &self.cache_url)
            .field("cache_token", &redact(&self.cache_token))
            .field("compaction_timeout_secs", &self.compaction_timeout_secs)
            .finish()
    }
}

// ── Archive / persona / gateway ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// JSON-lines file; defaults to `~/.vantage/archive.jsonl`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ArchiveConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| AppConfig::config_dir().join("archive.jsonl"))
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    #[serde(default = "default_persona_name")]
    pub name: String,

    /// Replace the built-in persona directives entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,
}

fn default_persona_name() -> String {
    "Vantage".into()
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: default_persona_name(),
            system_prompt_override: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    42618
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from the default path (~/.vantage/config.toml).
    ///
    /// Environment variables override file values:
    /// - `VANTAGE_API_KEY`, then `OPENAI_API_KEY` (completion key)
    /// - `VANTAGE_MODEL` (synthesis model)
    /// - `TAVILY_API_KEY` / `SERPER_API_KEY` (retrieval keys by provider kind)
    /// - `VANTAGE_CACHE_URL` / `VANTAGE_CACHE_TOKEN`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup` (injectable for tests).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.completion.api_key.is_none() {
            self.completion.api_key =
                lookup("VANTAGE_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(model) = lookup("VANTAGE_MODEL") {
            self.completion.model = model;
        }

        for provider in &mut self.retrieval.providers {
            if provider.api_key.is_some() {
                continue;
            }
            provider.api_key = match provider.kind {
                ProviderKind::AnswerSearch => lookup("TAVILY_API_KEY"),
                ProviderKind::WebSearch => lookup("SERPER_API_KEY"),
                ProviderKind::InstantAnswer => None,
            };
        }

        if let Some(url) = lookup("VANTAGE_CACHE_URL") {
            self.memory.cache_url = Some(url);
            self.memory.cache = "rest".into();
        }
        if let Some(token) = lookup("VANTAGE_CACHE_TOKEN") {
            self.memory.cache_token = Some(token);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".vantage")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.completion.temperature) {
            return Err(ConfigError::ValidationError(
                "completion.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.completion.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "completion.timeout_secs must be > 0".into(),
            ));
        }

        if self.memory.window_size == 0 {
            return Err(ConfigError::ValidationError(
                "memory.window_size must be >= 1".into(),
            ));
        }

        if self.memory.cache == "rest" && self.memory.cache_url.is_none() {
            return Err(ConfigError::ValidationError(
                "memory.cache = \"rest\" requires memory.cache_url".into(),
            ));
        }

        if self.retrieval.max_concurrent_calls == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.max_concurrent_calls must be >= 1".into(),
            ));
        }

        let mut seen = HashSet::new();
        for provider in &self.retrieval.providers {
            if provider.id.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "retrieval provider id must not be empty".into(),
                ));
            }
            if RESERVED_SOURCE_IDS.contains(&provider.id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "retrieval provider id '{}' is reserved",
                    provider.id
                )));
            }
            if !seen.insert(provider.id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate retrieval provider id '{}'",
                    provider.id
                )));
            }
            if !(0.0..=1.0).contains(&provider.confidence) {
                return Err(ConfigError::ValidationError(format!(
                    "confidence for '{}' must be between 0.0 and 1.0",
                    provider.id
                )));
            }
            if provider.timeout_secs == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "timeout_secs for '{}' must be > 0",
                    provider.id
                )));
            }
        }

        Ok(())
    }

    /// Check if a completion API key is available.
    pub fn has_api_key(&self) -> bool {
        self.completion.api_key.is_some()
    }

    /// Generate a default config TOML string (for `init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
