//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main Saini configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Embedding provider settings.
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,

    /// Memory storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Similarity retrieval settings.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Reply generation settings.
    #[serde(default)]
    pub reply: ReplyConfig,

    /// Check-in history settings.
    #[serde(default)]
    pub checkins: CheckinsConfig,

    /// Inactivity nudge settings.
    #[serde(default)]
    pub nudge: NudgeConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Embeddings configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    /// Embeddings provider.
    #[serde(default)]
    pub provider: EmbeddingsProvider,

    /// Endpoint URL. Required for `titan`, optional base URL override for `openai`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Model identifier, also used as the provider tag on stored records.
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Expected vector length. Responses of any other length are rejected.
    /// When unset, OpenAI models with a published size still check it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,

    /// Environment variable holding the API key or bearer token. Defaults to
    /// `OPENAI_API_KEY` for `openai` and `SAINI_EMBEDDINGS_TOKEN` for `titan`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingsProvider::default(),
            endpoint: None,
            model: default_embedding_model(),
            dimension: None,
            api_key_env: None,
        }
    }
}

/// Embeddings provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingsProvider {
    #[default]
    Openai,
    /// Titan-style JSON endpoint (`{"inputText": ...}`).
    Titan,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage backend.
    #[serde(default)]
    pub backend: StorageBackend,

    /// File or database path. Defaults under the data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Memory storage backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local, lost on exit.
    Memory,
    /// Single JSON document, atomically rewritten.
    File,
    /// SQLite database with an owner index.
    #[default]
    Sqlite,
}

/// Retrieval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of related memories to return.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Records fetched per storage page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_top_k() -> usize {
    3
}

fn default_page_size() -> usize {
    100
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            page_size: default_page_size(),
        }
    }
}

/// Reply generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyConfig {
    /// Reply provider.
    #[serde(default)]
    pub provider: ReplyProvider,

    /// Chat model.
    #[serde(default = "default_reply_model")]
    pub model: String,

    /// Base URL override for OpenAI-compatible APIs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Environment variable holding the API key.
    #[serde(default = "default_reply_key_env")]
    pub api_key_env: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum completion tokens.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_reply_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_reply_key_env() -> String {
    crate::env::vars::OPENAI_API_KEY.to_string()
}

fn default_temperature() -> f32 {
    0.8
}

fn default_max_tokens() -> u32 {
    350
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            provider: ReplyProvider::default(),
            model: default_reply_model(),
            endpoint: None,
            api_key_env: default_reply_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Reply provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyProvider {
    /// Fixed per-tier replies, no network.
    #[default]
    Fallback,
    Openai,
}

/// Check-in history configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckinsConfig {
    /// History file path. Defaults under the data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Nudge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NudgeConfig {
    /// Days without a check-in before a user is nudged.
    #[serde(default = "default_inactive_days")]
    pub inactive_days: u32,
}

fn default_inactive_days() -> u32 {
    2
}

impl Default for NudgeConfig {
    fn default() -> Self {
        Self {
            inactive_days: default_inactive_days(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.embeddings.provider, EmbeddingsProvider::Openai);
        assert_eq!(config.embeddings.dimension, None);
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.reply.provider, ReplyProvider::Fallback);
    }

    #[test]
    fn test_retrieval_config_default() {
        let config = RetrievalConfig::default();
        assert_eq!(config.top_k, 3);
        assert_eq!(config.page_size, 100);
    }

    #[test]
    fn test_nudge_default_is_two_days() {
        assert_eq!(NudgeConfig::default().inactive_days, 2);
    }

    #[test]
    fn test_partial_section_fills_defaults() {
        let parsed: Config = serde_json::from_str(r#"{"retrieval": {"top_k": 5}}"#).unwrap();
        assert_eq!(parsed.retrieval.top_k, 5);
        assert_eq!(parsed.retrieval.page_size, 100);
        assert_eq!(parsed.reply.model, "gpt-4o-mini");
    }

    #[test]
    fn test_partial_embeddings_section_matches_default() {
        let absent: Config = serde_json::from_str("{}").unwrap();
        let partial: Config =
            serde_json::from_str(r#"{"embeddings": {"provider": "openai"}}"#).unwrap();
        let default = EmbeddingsConfig::default();

        for embeddings in [&absent.embeddings, &partial.embeddings] {
            assert_eq!(embeddings.provider, default.provider);
            assert_eq!(embeddings.model, default.model);
            assert_eq!(embeddings.dimension, default.dimension);
            assert_eq!(embeddings.api_key_env, default.api_key_env);
            assert_eq!(embeddings.endpoint, default.endpoint);
        }
    }

    #[test]
    fn test_storage_backend_serde() {
        let parsed: StorageBackend = serde_json::from_str("\"file\"").unwrap();
        assert_eq!(parsed, StorageBackend::File);
        assert_eq!(serde_json::to_string(&StorageBackend::Sqlite).unwrap(), "\"sqlite\"");
    }

    #[test]
    fn test_log_level_default_is_info() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
        assert_eq!(LogLevel::default().as_directive(), "info");
    }
}
