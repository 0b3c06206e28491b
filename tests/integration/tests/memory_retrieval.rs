//! Semantic memory end to end: HTTP embeddings, SQLite storage, retrieval.

use saini_core::config::StorageBackend;
use saini_integration_tests::{mock_titan, temp_config, MOCK_MODEL};
use saini_memory::{
    EmbeddingProvider, EmbeddingStore, MemoryError, MemoryRecord, MemoryStore, Metadata,
    RetrievalStatus, SimilarityRetriever, SqliteMemoryStore, TitanEmbeddings,
};
use std::sync::Arc;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    _server: wiremock::MockServer,
    store: Arc<SqliteMemoryStore>,
    ingest: EmbeddingStore,
    retriever: SimilarityRetriever,
}

async fn fixture(vectors: &[(&str, Vec<f32>)]) -> Fixture {
    let dir = TempDir::new().unwrap();
    let server = mock_titan(vectors, vec![0.0, 0.0, 1.0]).await;
    let config = temp_config(dir.path(), &server, StorageBackend::Sqlite);

    let provider: Arc<dyn EmbeddingProvider> = Arc::new(
        TitanEmbeddings::new(config.embeddings.endpoint.clone().unwrap(), MOCK_MODEL).unwrap(),
    );
    let store = Arc::new(
        SqliteMemoryStore::connect(&config.memory_store_path().unwrap())
            .await
            .unwrap(),
    );
    Fixture {
        ingest: EmbeddingStore::new(provider.clone(), store.clone()),
        retriever: SimilarityRetriever::new(provider, store.clone())
            .with_page_size(config.retrieval.page_size),
        store,
        _dir: dir,
        _server: server,
    }
}

#[tokio::test]
async fn test_u1_scenario_over_http_and_sqlite() {
    let f = fixture(&[
        ("anxious", vec![0.5, 0.5, 0.0]),
        ("deadline", vec![0.5, 0.25, 0.0]),
        ("walk", vec![0.0, 0.25, 0.5]),
        ("meeting", vec![0.25, 0.5, 0.0]),
    ])
    .await;

    for text in ["deadline stress", "a long walk", "meeting went badly"] {
        f.ingest.store("u1", text, Metadata::new()).await.unwrap();
    }
    f.ingest.store("u2", "deadline for someone else", Metadata::new()).await.unwrap();

    let result = f.retriever.retrieve("u1", "anxious today", 2).await.unwrap();
    assert_eq!(result.status, RetrievalStatus::Found);
    assert_eq!(result.candidates, 3);
    assert_eq!(result.memories.len(), 2);
    assert!(result.memories.iter().all(|m| m.record.owner_id == "u1"));
    assert!(result.memories[0].similarity >= result.memories[1].similarity);
    assert!(result
        .memories
        .iter()
        .all(|m| (-1.0..=1.0).contains(&m.similarity)));
    assert!(result
        .memories
        .iter()
        .all(|m| m.record.text != "a long walk"));
}

#[tokio::test]
async fn test_cosine_ordering_and_determinism() {
    let f = fixture(&[
        ("query", vec![1.0, 0.0, 0.0]),
        ("same", vec![1.0, 0.0, 0.0]),
        ("orthogonal", vec![0.0, 1.0, 0.0]),
        ("opposite", vec![-1.0, 0.0, 0.0]),
    ])
    .await;

    for text in ["orthogonal", "opposite", "same"] {
        f.ingest.store("u1", text, Metadata::new()).await.unwrap();
    }

    let first = f.retriever.retrieve("u1", "query", 3).await.unwrap();
    let ranked: Vec<_> = first
        .memories
        .iter()
        .map(|m| (m.record.text.as_str(), m.similarity))
        .collect();
    assert_eq!(
        ranked,
        vec![("same", 1.0), ("orthogonal", 0.0), ("opposite", -1.0)]
    );

    for _ in 0..3 {
        let again = f.retriever.retrieve("u1", "query", 3).await.unwrap();
        let ids: Vec<_> = again.memories.iter().map(|m| &m.record.record_id).collect();
        let expected: Vec<_> = first.memories.iter().map(|m| &m.record.record_id).collect();
        assert_eq!(ids, expected);
    }
}

#[tokio::test]
async fn test_pagination_loads_every_record() {
    let f = fixture(&[("query", vec![1.0, 0.0, 0.0]), ("target", vec![1.0, 0.0, 0.0])]).await;

    // Page size is 2; seven records span four pages.
    for n in 0..6 {
        f.ingest
            .store("u1", &format!("filler {n}"), Metadata::new())
            .await
            .unwrap();
    }
    f.ingest.store("u1", "target", Metadata::new()).await.unwrap();

    let result = f.retriever.retrieve("u1", "query", 10).await.unwrap();
    assert_eq!(result.candidates, 7);
    assert_eq!(result.memories.len(), 7);
    assert_eq!(result.memories[0].record.text, "target");
}

#[tokio::test]
async fn test_identical_inputs_store_twice() {
    let f = fixture(&[]).await;
    let a = f.ingest.store("u1", "same words", Metadata::new()).await.unwrap();
    let b = f.ingest.store("u1", "same words", Metadata::new()).await.unwrap();
    assert_ne!(a, b);
    assert_eq!(f.store.count("u1").await.unwrap(), 2);
}

#[tokio::test]
async fn test_unknown_owner_and_zero_k() {
    let f = fixture(&[]).await;
    f.ingest.store("u1", "something", Metadata::new()).await.unwrap();

    let unknown = f.retriever.retrieve("ghost", "anything", 3).await.unwrap();
    assert_eq!(unknown.status, RetrievalStatus::NoMemories);
    assert!(unknown.memories.is_empty());

    let zero = f.retriever.retrieve("u1", "anything", 0).await.unwrap();
    assert_eq!(zero.status, RetrievalStatus::Found);
    assert!(zero.memories.is_empty());
}

#[tokio::test]
async fn test_query_dimension_mismatch_is_rejected() {
    let f = fixture(&[("query", vec![0.5; 1024])]).await;
    f.store
        .append(MemoryRecord::new("u1", "legacy", vec![0.5; 768], MOCK_MODEL))
        .await
        .unwrap();

    let err = f.retriever.retrieve("u1", "query", 3).await.unwrap_err();
    assert!(matches!(err, MemoryError::Validation(_)));
}

#[tokio::test]
async fn test_dimension_change_is_not_stored() {
    let f = fixture(&[("widened", vec![0.5; 4])]).await;
    f.ingest.store("u1", "first entry", Metadata::new()).await.unwrap();

    let err = f
        .ingest
        .store("u1", "widened model output", Metadata::new())
        .await
        .unwrap_err();
    assert!(matches!(err, MemoryError::Validation(_)));
    assert_eq!(f.store.count("u1").await.unwrap(), 1);

    let retrieval = f.retriever.retrieve("u1", "anything", 3).await.unwrap();
    assert_eq!(retrieval.status, RetrievalStatus::Found);
    assert_eq!(retrieval.memories.len(), 1);
    assert_eq!(retrieval.memories[0].record.text, "first entry");
}

#[tokio::test]
async fn test_metadata_survives_storage() {
    let f = fixture(&[]).await;
    let mut metadata = Metadata::new();
    metadata.insert("tier".into(), serde_json::json!("Stirred"));
    metadata.insert("response".into(), serde_json::json!("Want to talk about it?"));
    f.ingest.store("u1", "feeling meh", metadata).await.unwrap();

    let records = f.store.load_owner("u1", 10).await.unwrap();
    assert_eq!(records[0].meta_str("tier"), Some("Stirred"));
    assert_eq!(records[0].model, MOCK_MODEL);
    assert_eq!(records[0].embedding, vec![0.0, 0.0, 1.0]);
}
