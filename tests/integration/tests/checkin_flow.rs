//! Check-in flow across crates: classification, memory, history, analytics, nudges.

use chrono::{Duration, Utc};
use saini_checkin::{
    CheckInService, CheckinStore, FallbackReplies, FileCheckinStore, NudgeRunner, UserAnalytics,
};
use saini_core::{CheckIn, Tier};
use saini_memory::testing::StaticEmbeddings;
use saini_memory::{
    EmbeddingProvider, EmbeddingStore, MemoryStore, SimilarityRetriever, SqliteMemoryStore,
};
use std::sync::Arc;
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    memories: Arc<SqliteMemoryStore>,
    checkins: Arc<FileCheckinStore>,
    service: CheckInService,
}

async fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(
        StaticEmbeddings::new("static")
            .with("Missed my train and I'm so tired", vec![1.0, 0.0, 0.0])
            .with("tired again after work", vec![0.5, 0.25, 0.0])
            .with("Feeling fine today", vec![0.0, 1.0, 0.0])
            .with_fallback(vec![0.0, 0.0, 1.0]),
    );
    let memories = Arc::new(
        SqliteMemoryStore::connect(&dir.path().join("memories.db"))
            .await
            .unwrap(),
    );
    let checkins = Arc::new(FileCheckinStore::open(dir.path().join("checkins.json")).unwrap());
    let service = CheckInService::new(
        SimilarityRetriever::new(provider.clone(), memories.clone()),
        EmbeddingStore::new(provider, memories.clone()),
        Arc::new(FallbackReplies),
        checkins.clone(),
    )
    .with_top_k(2);

    Fixture {
        dir,
        memories,
        checkins,
        service,
    }
}

async fn check_in(f: &Fixture, owner: &str, message: &str) -> saini_checkin::CheckInOutcome {
    let (outcome, handle) = f.service.check_in_tracked(owner, message).await.unwrap();
    handle.await.unwrap();
    outcome
}

#[tokio::test]
async fn test_memories_feed_later_check_ins() {
    let f = fixture().await;

    let first = check_in(&f, "u1", "Missed my train and I'm so tired").await;
    assert_eq!(first.tier, Tier::AtRisk);
    assert!(first.related_memories.is_empty());

    check_in(&f, "u1", "Feeling fine today").await;
    check_in(&f, "u2", "tired again after work").await;

    let later = check_in(&f, "u1", "tired again after work").await;
    assert_eq!(later.related_memories.len(), 2);
    let top = &later.related_memories[0];
    assert_eq!(top.record.text, "Missed my train and I'm so tired");
    assert_eq!(top.record.meta_str("tier"), Some("At-Risk"));
    assert_eq!(
        top.record.meta_str("response"),
        Some(FallbackReplies::text_for(Tier::AtRisk))
    );
    assert!(later
        .related_memories
        .iter()
        .all(|m| m.record.owner_id == "u1"));

    assert_eq!(f.memories.count("u1").await.unwrap(), 3);
    assert_eq!(f.memories.count("u2").await.unwrap(), 1);
}

#[tokio::test]
async fn test_history_and_analytics() {
    let f = fixture().await;
    check_in(&f, "u1", "Missed my train and I'm so tired").await;
    check_in(&f, "u1", "Feeling fine today").await;
    check_in(&f, "u1", "I can't stop shaking").await;
    check_in(&f, "u2", "Great run this morning").await;

    // History is durable.
    let reopened = FileCheckinStore::open(f.dir.path().join("checkins.json")).unwrap();
    assert_eq!(reopened.users().await.unwrap(), vec!["u1", "u2"]);

    let history = reopened.list(Some("u1")).await.unwrap();
    assert_eq!(history.len(), 3);

    let stats = UserAnalytics::compute("u1", &history).unwrap();
    assert_eq!(stats.total_reflections, 3);
    assert_eq!(stats.tier_distribution[&Tier::AtRisk], 1);
    assert_eq!(stats.tier_distribution[&Tier::Stirred], 1);
    assert_eq!(stats.tier_distribution[&Tier::Critical], 1);
    assert_eq!(stats.tone_distribution["gentle"], 3);
    assert_eq!(stats.last_checkin, history[0].timestamp);

    let other = f.checkins.list(Some("u2")).await.unwrap();
    assert_eq!(other[0].tier, Tier::Stable);
}

#[tokio::test]
async fn test_nudges_inactive_users() {
    let f = fixture().await;
    let now = Utc::now();
    f.checkins
        .put(CheckIn::new("quiet", "meh", Tier::Stirred, "r").at(now - Duration::days(4)))
        .await
        .unwrap();
    check_in(&f, "active", "Feeling fine today").await;

    let runner = NudgeRunner::new(f.checkins.clone(), Arc::new(FallbackReplies), 2);
    assert_eq!(runner.run(now).await.unwrap(), vec!["quiet"]);

    let reopened = FileCheckinStore::open(f.dir.path().join("checkins.json")).unwrap();
    let latest = &reopened.list(Some("quiet")).await.unwrap()[0];
    assert!(latest.is_auto);
    assert_eq!(latest.tier, Tier::Auto);
    assert_eq!(latest.message, "[AUTO] Daily nudge");

    // Nudges do not touch semantic memory.
    assert_eq!(f.memories.count("quiet").await.unwrap(), 0);
}
