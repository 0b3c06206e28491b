//! CLI command routing against real stores and a mock embedding endpoint.

use clap::Parser;
use saini_checkin::{CheckinStore, FileCheckinStore};
use saini_cli::{run, Cli};
use saini_core::config::{Config, StorageBackend};
use saini_core::Tier;
use saini_integration_tests::{mock_titan, temp_config};
use saini_memory::{FileMemoryStore, MemoryStore};
use tempfile::TempDir;

async fn saini(config: &Config, args: &[&str]) -> anyhow::Result<()> {
    let argv = std::iter::once("saini").chain(args.iter().copied());
    let cli = Cli::try_parse_from(argv)?;
    run(cli, config.clone()).await
}

#[tokio::test]
async fn test_memory_commands() {
    let dir = TempDir::new().unwrap();
    let server = mock_titan(&[("walk", vec![1.0, 0.0])], vec![0.0, 1.0]).await;
    let config = temp_config(dir.path(), &server, StorageBackend::File);

    saini(&config, &["memory", "store", "--user", "u1", "evening walk", "--meta", "tier=Stable"])
        .await
        .unwrap();
    saini(&config, &["memory", "store", "--user", "u1", "rough day"])
        .await
        .unwrap();
    saini(&config, &["memory", "retrieve", "--user", "u1", "a walk", "-k", "1"])
        .await
        .unwrap();
    saini(&config, &["memory", "retrieve", "--user", "ghost", "a walk", "--json"])
        .await
        .unwrap();

    let store = FileMemoryStore::open(dir.path().join("memories.json")).unwrap();
    let records = store.load_owner("u1", 10).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].meta_str("tier"), Some("Stable"));

    assert!(saini(&config, &["memory", "store", "--user", "u1", "x", "--meta", "bad"])
        .await
        .is_err());
}

#[tokio::test]
async fn test_checkin_history_analytics_nudge() {
    let dir = TempDir::new().unwrap();
    let server = mock_titan(&[], vec![0.5, 0.5]).await;
    let config = temp_config(dir.path(), &server, StorageBackend::File);

    saini(&config, &["checkin", "--user", "u1", "So stressed about the exam"])
        .await
        .unwrap();
    saini(&config, &["checkin", "--user", "u1", "Feeling okay", "--json"])
        .await
        .unwrap();
    saini(&config, &["history", "--user", "u1", "--limit", "1"])
        .await
        .unwrap();
    saini(&config, &["users"]).await.unwrap();
    saini(&config, &["analytics", "--user", "u1"]).await.unwrap();
    assert!(saini(&config, &["analytics", "--user", "nobody"]).await.is_err());

    let checkins = FileCheckinStore::open(dir.path().join("checkins.json")).unwrap();
    let history = checkins.list(Some("u1")).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().any(|c| c.tier == Tier::AtRisk));
    assert!(history.iter().any(|c| c.tier == Tier::Stirred));

    // The check-in command waits for the memory write.
    let memories = FileMemoryStore::open(dir.path().join("memories.json")).unwrap();
    assert_eq!(memories.count("u1").await.unwrap(), 2);

    // Nobody is inactive yet.
    saini(&config, &["nudge"]).await.unwrap();
    let checkins = FileCheckinStore::open(dir.path().join("checkins.json")).unwrap();
    assert_eq!(checkins.list(None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let server = mock_titan(&[], vec![1.0]).await;
    let mut config = temp_config(dir.path(), &server, StorageBackend::File);
    config.retrieval.page_size = 0;

    assert!(saini(&config, &["checkin", "--user", "u1", "hi"]).await.is_err());
}

#[tokio::test]
async fn test_config_commands() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("saini.json5");
    let path_arg = path.to_str().unwrap();
    let config = Config::default();

    saini(&config, &["--config", path_arg, "config", "init"]).await.unwrap();
    saini(&config, &["--config", path_arg, "config", "validate"]).await.unwrap();
    saini(&config, &["--config", path_arg, "config", "show"]).await.unwrap();
    assert!(saini(&config, &["--config", path_arg, "config", "init"]).await.is_err());
}

#[tokio::test]
async fn test_version() {
    saini(&Config::default(), &["version"]).await.unwrap();
}
