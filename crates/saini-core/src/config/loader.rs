//! Configuration loading and persistence.

use super::{Config, EmbeddingsProvider, ReplyProvider, StorageBackend};
use crate::env;
use crate::error::ConfigError;
use crate::paths;
use std::fs;
use std::path::{Path, PathBuf};

/// Largest page the storage layer is asked for.
const MAX_PAGE_SIZE: usize = 1000;

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = paths::config_file()?;
        Self::load(&path)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Save configuration to the default path.
    pub fn save_default(&self) -> Result<(), ConfigError> {
        let path = paths::config_file()?;
        self.save(&path)
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_json5()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Serialize to JSON5 string.
    pub fn to_json5(&self) -> Result<String, ConfigError> {
        // json5 doesn't have a serializer, so we use serde_json with pretty print
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        // 1. Embeddings
        if self.embeddings.model.trim().is_empty() {
            errors.push("Embeddings model must not be empty".to_string());
        }
        if self.embeddings.dimension == Some(0) {
            errors.push("Embeddings dimension must be greater than 0".to_string());
        }
        if self.embeddings.provider == EmbeddingsProvider::Titan && self.embeddings.endpoint.is_none()
        {
            errors.push("Titan embeddings require an endpoint".to_string());
        }
        if let Some(endpoint) = &self.embeddings.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                errors.push(format!(
                    "Embeddings endpoint '{}' must be an http(s) URL",
                    endpoint
                ));
            }
        }

        // 2. Retrieval limits
        if self.retrieval.top_k == 0 {
            errors.push("Retrieval top_k must be greater than 0".to_string());
        }
        if self.retrieval.page_size == 0 {
            errors.push("Retrieval page_size must be greater than 0".to_string());
        }
        if self.retrieval.page_size > MAX_PAGE_SIZE {
            errors.push(format!(
                "Retrieval page_size {} exceeds maximum of {}",
                self.retrieval.page_size, MAX_PAGE_SIZE
            ));
        }

        // 3. Reply generation
        if self.reply.provider == ReplyProvider::Openai && self.reply.model.trim().is_empty() {
            errors.push("Reply model must not be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.reply.temperature) {
            errors.push(format!(
                "Reply temperature must be 0.0-2.0, got {}",
                self.reply.temperature
            ));
        }

        // 4. Nudges
        if self.nudge.inactive_days == 0 {
            errors.push("Nudge inactive_days must be greater than 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }

    /// Load configuration from the default path, falling back to defaults if no file exists.
    pub fn load_or_default() -> Self {
        match Self::load_default() {
            Ok(config) => config,
            Err(ConfigError::NotFound(_)) => Self::from_env_defaults(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load config, using defaults");
                Self::from_env_defaults()
            }
        }
    }

    /// Create a Config from defaults, enhanced by environment variable detection.
    ///
    /// Selects the OpenAI reply provider when `OPENAI_API_KEY` is set, and
    /// honors `SAINI_TOP_K` and `SAINI_LOG_JSON`.
    pub fn from_env_defaults() -> Self {
        let mut config = Self::default();

        if env::get_var(env::vars::OPENAI_API_KEY).is_some() {
            config.reply.provider = ReplyProvider::Openai;
        }
        if let Some(top_k) = env::get_usize(env::vars::SAINI_TOP_K) {
            config.retrieval.top_k = top_k;
        }
        if env::get_bool(env::vars::SAINI_LOG_JSON) {
            config.logging.json = true;
        }

        config
    }

    /// Resolve the memory store location for the configured backend.
    pub fn memory_store_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.storage.path {
            return Ok(path.clone());
        }
        match self.storage.backend {
            StorageBackend::Sqlite => paths::memory_db(),
            StorageBackend::File | StorageBackend::Memory => paths::memory_file(),
        }
    }

    /// Resolve the check-in history location.
    pub fn checkins_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.checkins.path {
            Some(path) => Ok(path.clone()),
            None => paths::checkins_file(),
        }
    }

    /// Read the secret named by `var`, failing if it is unset.
    pub fn require_env(var: &str) -> Result<String, ConfigError> {
        env::get_var(var).ok_or_else(|| ConfigError::MissingEnv(var.to_string()))
    }
}

/// Configuration builder for creating configs programmatically.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new config builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the embeddings provider and model.
    pub fn embeddings(mut self, provider: EmbeddingsProvider, model: impl Into<String>) -> Self {
        self.config.embeddings.provider = provider;
        self.config.embeddings.model = model.into();
        self
    }

    /// Set the embeddings endpoint.
    pub fn embeddings_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.embeddings.endpoint = Some(endpoint.into());
        self
    }

    /// Set the expected embedding dimension.
    pub fn dimension(mut self, dimension: usize) -> Self {
        self.config.embeddings.dimension = Some(dimension);
        self
    }

    /// Set the storage backend.
    pub fn storage(mut self, backend: StorageBackend) -> Self {
        self.config.storage.backend = backend;
        self
    }

    /// Set the storage path.
    pub fn storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.storage.path = Some(path.into());
        self
    }

    /// Set the retrieval depth.
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.config.retrieval.top_k = top_k;
        self
    }

    /// Set the storage page size.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.config.retrieval.page_size = page_size;
        self
    }

    /// Set the reply provider.
    pub fn reply_provider(mut self, provider: ReplyProvider) -> Self {
        self.config.reply.provider = provider;
        self
    }

    /// Set the check-in history path.
    pub fn checkins_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.checkins.path = Some(path.into());
        self
    }

    /// Set the nudge inactivity threshold.
    pub fn inactive_days(mut self, days: u32) -> Self {
        self.config.nudge.inactive_days = days;
        self
    }

    /// Set the log level.
    pub fn log_level(mut self, level: super::LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Build the config.
    pub fn build(self) -> Config {
        self.config
    }

    /// Validate and build the config, returning an error if validation fails.
    pub fn build_validated(self) -> Result<Config, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
