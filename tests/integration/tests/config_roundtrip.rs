//! Config save/load roundtrip integration tests.
//!
//! These tests verify that configuration can be serialized, written to disk,
//! and loaded back with identical field values.

use saini_core::config::{Config, EmbeddingsProvider, ReplyProvider, StorageBackend};
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("saini.json5");

    let config = Config::default();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.retrieval.top_k, config.retrieval.top_k);
    assert_eq!(loaded.retrieval.page_size, config.retrieval.page_size);
    assert_eq!(loaded.embeddings.model, config.embeddings.model);
    assert_eq!(loaded.embeddings.dimension, config.embeddings.dimension);
    assert_eq!(loaded.storage.backend, StorageBackend::Sqlite);
    assert_eq!(loaded.nudge.inactive_days, 2);
    loaded.validate().unwrap();
}

#[test]
fn test_config_modify_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("saini.json5");

    let mut config = Config::default();
    config.embeddings.provider = EmbeddingsProvider::Titan;
    config.embeddings.endpoint = Some("https://embed.internal/v1".into());
    config.embeddings.dimension = Some(1024);
    config.reply.provider = ReplyProvider::Openai;
    config.retrieval.top_k = 5;
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.embeddings.provider, EmbeddingsProvider::Titan);
    assert_eq!(loaded.embeddings.dimension, Some(1024));
    assert_eq!(loaded.reply.provider, ReplyProvider::Openai);
    assert_eq!(loaded.retrieval.top_k, 5);
}

#[test]
fn test_json5_with_comments() {
    let config = Config::parse(
        r#"{
            // embeddings served by a local proxy
            embeddings: { provider: "titan", endpoint: "http://localhost:9000/embed", dimension: 1024 },
            storage: { backend: "file" },
            nudge: { inactive_days: 3, },
        }"#,
    )
    .unwrap();
    assert_eq!(config.embeddings.provider, EmbeddingsProvider::Titan);
    assert_eq!(config.storage.backend, StorageBackend::File);
    assert_eq!(config.nudge.inactive_days, 3);
    assert_eq!(config.retrieval.top_k, 3);
    config.validate().unwrap();
}

#[test]
fn test_config_load_nonexistent() {
    let result = Config::load(Path::new("/nonexistent/saini.json5"));
    assert!(result.is_err());
}

#[test]
fn test_config_parse_invalid() {
    let result = Config::parse("not valid json");
    assert!(result.is_err());
}

#[test]
fn test_validation_collects_every_error() {
    let mut config = Config::default();
    config.retrieval.top_k = 0;
    config.nudge.inactive_days = 0;
    config.embeddings.provider = EmbeddingsProvider::Titan;
    config.embeddings.endpoint = None;

    let message = config.validate().unwrap_err().to_string();
    assert!(message.contains("top_k"));
    assert!(message.contains("inactive_days"));
    assert!(message.contains("endpoint"));
}
