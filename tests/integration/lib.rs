//! Shared fixtures for the integration tests.

use saini_core::config::{Config, ConfigBuilder, EmbeddingsProvider, StorageBackend};
use std::path::Path;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Model tag used by the mock embedding endpoint.
pub const MOCK_MODEL: &str = "amazon.titan-embed-text-v2:0";

/// Serve a Titan-style embedding endpoint at `/embed`.
///
/// Each `(needle, vector)` answers requests whose body contains `needle`;
/// anything else gets `fallback` in the batch shape. Mocks are matched in
/// registration order.
pub async fn mock_titan(vectors: &[(&str, Vec<f32>)], fallback: Vec<f32>) -> MockServer {
    let server = MockServer::start().await;
    for (needle, vector) in vectors {
        Mock::given(method("POST"))
            .and(path("/embed"))
            .and(body_string_contains(*needle))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "embedding": vector })),
            )
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "embeddings": [fallback] })),
        )
        .mount(&server)
        .await;
    server
}

/// Config pointing at `server`, with every file under `dir`.
pub fn temp_config(dir: &Path, server: &MockServer, backend: StorageBackend) -> Config {
    let storage = match backend {
        StorageBackend::Sqlite => dir.join("memories.db"),
        _ => dir.join("memories.json"),
    };
    let mut config = ConfigBuilder::new()
        .embeddings(EmbeddingsProvider::Titan, MOCK_MODEL)
        .embeddings_endpoint(format!("{}/embed", server.uri()))
        .storage(backend)
        .storage_path(storage)
        .checkins_path(dir.join("checkins.json"))
        .page_size(2)
        .build();
    config.embeddings.dimension = None;
    config
}
