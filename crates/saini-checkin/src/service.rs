//! The check-in flow.

use crate::classifier::TierClassifier;
use crate::error::CheckinError;
use crate::reply::{ContextTurn, Reply, ReplyGenerator, ReplyRequest};
use crate::store::CheckinStore;
use crate::Result;
use saini_core::{CheckIn, Tier};
use saini_memory::{EmbeddingStore, Metadata, ScoredMemory, SimilarityRetriever};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default number of related memories fetched as context.
pub const DEFAULT_TOP_K: usize = 3;

/// What a check-in produced.
#[derive(Debug, Clone, Serialize)]
pub struct CheckInOutcome {
    /// Tier assigned to the message.
    pub tier: Tier,

    /// Reply shown to the user.
    pub reply: Reply,

    /// Past memories passed to the generator as context.
    pub related_memories: Vec<ScoredMemory>,
}

/// Classifies a message, recalls related memories, replies, and records
/// the exchange.
pub struct CheckInService {
    classifier: TierClassifier,
    retriever: SimilarityRetriever,
    ingest: EmbeddingStore,
    generator: Arc<dyn ReplyGenerator>,
    checkins: Arc<dyn CheckinStore>,
    top_k: usize,
}

impl CheckInService {
    pub fn new(
        retriever: SimilarityRetriever,
        ingest: EmbeddingStore,
        generator: Arc<dyn ReplyGenerator>,
        checkins: Arc<dyn CheckinStore>,
    ) -> Self {
        Self {
            classifier: TierClassifier::default(),
            retriever,
            ingest,
            generator,
            checkins,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Set how many related memories are fetched.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Replace the tier classifier.
    pub fn with_classifier(mut self, classifier: TierClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Run one check-in and return the reply.
    ///
    /// Memory retrieval failures degrade to an empty context. The exchange
    /// is embedded in a background task; see [`check_in_tracked`](Self::check_in_tracked)
    /// to await it.
    pub async fn check_in(&self, owner_id: &str, message: &str) -> Result<CheckInOutcome> {
        self.check_in_tracked(owner_id, message)
            .await
            .map(|(outcome, _)| outcome)
    }

    /// Like [`check_in`](Self::check_in) but also returns the handle of the
    /// background memory write.
    pub async fn check_in_tracked(
        &self,
        owner_id: &str,
        message: &str,
    ) -> Result<(CheckInOutcome, JoinHandle<()>)> {
        let owner_id = owner_id.trim();
        let message = message.trim();
        if owner_id.is_empty() {
            return Err(CheckinError::validation("owner_id must not be empty"));
        }
        if message.is_empty() {
            return Err(CheckinError::validation("message must not be empty"));
        }

        let tier = self.classifier.classify(message);
        debug!(owner_id, %tier, "Classified check-in");

        let related_memories = match self.retriever.retrieve(owner_id, message, self.top_k).await
        {
            Ok(retrieval) => retrieval.memories,
            Err(e) => {
                warn!(owner_id, error = %e, "Memory retrieval failed, continuing without context");
                Vec::new()
            }
        };

        let context = related_memories
            .iter()
            .map(|m| ContextTurn {
                message: m.record.text.clone(),
                response: m.record.meta_str("response").map(str::to_string),
            })
            .collect();
        let request = ReplyRequest::new(owner_id, message, tier).with_context(context);
        let reply = self.generator.generate(&request).await?;

        let checkin = CheckIn::new(owner_id, message, tier, reply.text.clone())
            .with_tone(reply.tone.clone())
            .with_source(reply.source.clone());
        self.checkins.put(checkin).await?;

        let mut metadata = Metadata::new();
        metadata.insert("tier".into(), serde_json::json!(tier));
        metadata.insert("response".into(), serde_json::json!(reply.text));
        metadata.insert("tone".into(), serde_json::json!(reply.tone));

        let ingest = self.ingest.clone();
        let (owner, text) = (owner_id.to_string(), message.to_string());
        let handle = tokio::spawn(async move {
            if let Err(e) = ingest.store(&owner, &text, metadata).await {
                warn!(owner_id = %owner, error = %e, "Failed to store memory");
            }
        });

        info!(owner_id, %tier, related = related_memories.len(), "Check-in complete");
        Ok((
            CheckInOutcome {
                tier,
                reply,
                related_memories,
            },
            handle,
        ))
    }
}
