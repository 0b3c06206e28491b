//! Builds providers and stores from the loaded configuration.

use anyhow::Context as _;
use saini_checkin::{
    ChatReplyGenerator, CheckInService, CheckinStore, FallbackReplies, FileCheckinStore,
    InMemoryCheckinStore, ReplyGenerator, WithFallback,
};
use saini_core::config::{
    Config, EmbeddingsConfig, EmbeddingsProvider, ReplyConfig, ReplyProvider, StorageBackend,
};
use saini_core::env;
use saini_memory::{
    EmbeddingProvider, EmbeddingStore, FileMemoryStore, InMemoryStore, MemoryStore,
    OpenAIEmbeddings, SimilarityRetriever, SqliteMemoryStore, TitanEmbeddings,
};
use std::sync::Arc;
use tracing::debug;

/// Create the configured embedding provider.
pub fn embedding_provider(config: &EmbeddingsConfig) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.provider {
        EmbeddingsProvider::Titan => {
            let endpoint = config
                .endpoint
                .as_deref()
                .context("embeddings.endpoint is required for the titan provider")?;
            let mut titan = TitanEmbeddings::new(endpoint, &config.model)?;
            if let Some(dimension) = config.dimension {
                titan = titan.with_dimension(dimension);
            }
            let token_var = config
                .api_key_env
                .as_deref()
                .unwrap_or(env::vars::SAINI_EMBEDDINGS_TOKEN);
            if let Some(token) = env::get_var(token_var) {
                titan = titan.with_token(token);
            }
            Arc::new(titan)
        }
        EmbeddingsProvider::Openai => {
            let key_var = config
                .api_key_env
                .as_deref()
                .unwrap_or(env::vars::OPENAI_API_KEY);
            let api_key = Config::require_env(key_var)?;
            let mut openai = OpenAIEmbeddings::new(api_key)?.with_model(&config.model);
            if let Some(dimension) = config.dimension {
                openai = openai.with_dimension(dimension);
            }
            if let Some(endpoint) = &config.endpoint {
                openai = openai.with_base_url(endpoint);
            }
            Arc::new(openai)
        }
    };

    debug!(model = provider.model(), dimension = ?provider.dimension(), "Embedding provider ready");
    Ok(provider)
}

/// Open the configured memory store.
pub async fn memory_store(config: &Config) -> anyhow::Result<Arc<dyn MemoryStore>> {
    Ok(match config.storage.backend {
        StorageBackend::Memory => Arc::new(InMemoryStore::new()),
        StorageBackend::File => Arc::new(FileMemoryStore::open(config.memory_store_path()?)?),
        StorageBackend::Sqlite => {
            Arc::new(SqliteMemoryStore::connect(&config.memory_store_path()?).await?)
        }
    })
}

/// Open the check-in history store. The `memory` backend keeps history in
/// memory too.
pub fn checkin_store(config: &Config) -> anyhow::Result<Arc<dyn CheckinStore>> {
    Ok(match config.storage.backend {
        StorageBackend::Memory => Arc::new(InMemoryCheckinStore::new()),
        StorageBackend::File | StorageBackend::Sqlite => {
            Arc::new(FileCheckinStore::open(config.checkins_path()?)?)
        }
    })
}

/// Create the configured reply generator. Remote generators fall back to
/// fixed replies on failure.
pub fn reply_generator(config: &ReplyConfig) -> anyhow::Result<Arc<dyn ReplyGenerator>> {
    Ok(match config.provider {
        ReplyProvider::Fallback => Arc::new(FallbackReplies),
        ReplyProvider::Openai => Arc::new(WithFallback::new(ChatReplyGenerator::from_config(
            config,
        )?)),
    })
}

/// Everything a command needs, wired from one config.
pub struct App {
    pub config: Config,
    pub provider: Arc<dyn EmbeddingProvider>,
    pub memories: Arc<dyn MemoryStore>,
    pub checkins: Arc<dyn CheckinStore>,
    pub generator: Arc<dyn ReplyGenerator>,
}

impl App {
    /// Build every component.
    pub async fn build(config: &Config) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self {
            provider: embedding_provider(&config.embeddings)?,
            memories: memory_store(config).await?,
            checkins: checkin_store(config)?,
            generator: reply_generator(&config.reply)?,
            config: config.clone(),
        })
    }

    pub fn retriever(&self) -> SimilarityRetriever {
        SimilarityRetriever::new(self.provider.clone(), self.memories.clone())
            .with_page_size(self.config.retrieval.page_size)
    }

    pub fn ingest(&self) -> EmbeddingStore {
        EmbeddingStore::new(self.provider.clone(), self.memories.clone())
    }

    pub fn service(&self) -> CheckInService {
        CheckInService::new(
            self.retriever(),
            self.ingest(),
            self.generator.clone(),
            self.checkins.clone(),
        )
        .with_top_k(self.config.retrieval.top_k)
    }
}
