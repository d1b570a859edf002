//! Similarity retrieval over a chunk store.
//!
//! [`SimilarityRetriever`] applies a [`RetrievalConfig`] (similarity threshold
//! and top-k limit) to a [`ChunkStore`] similarity query. It owns no ranking
//! logic itself; ordering and filtering are the store's contract.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use colloq_core::config::RetrievalConfig;
use colloq_core::error::Result;
use colloq_core::model::SimilarityMatch;
use colloq_core::store::ChunkStore;

/// Threshold + top-k retrieval over a [`ChunkStore`].
pub struct SimilarityRetriever {
    chunks: Arc<dyn ChunkStore>,
    config: RetrievalConfig,
}

impl SimilarityRetriever {
    /// Create a retriever with the default [`RetrievalConfig`]
    /// (threshold 0.70, top-k 3).
    pub fn new(chunks: Arc<dyn ChunkStore>) -> Self {
        Self::with_config(chunks, RetrievalConfig::default())
    }

    /// Create a retriever with an explicit configuration.
    pub fn with_config(chunks: Arc<dyn ChunkStore>, config: RetrievalConfig) -> Self {
        Self { chunks, config }
    }

    /// Return a reference to the retrieval configuration.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Retrieve the chunks in `room_id` most similar to the query embedding.
    ///
    /// Returns at most `top_k` matches, each scoring strictly above the
    /// similarity threshold, ordered by descending score. An empty result
    /// means the room holds no relevant context.
    ///
    /// # Errors
    ///
    /// Propagates the store error if the similarity query fails.
    pub async fn retrieve(&self, room_id: Uuid, query: &[f32]) -> Result<Vec<SimilarityMatch>> {
        let matches = self
            .chunks
            .query_by_similarity(
                room_id,
                query,
                self.config.similarity_threshold,
                self.config.top_k,
            )
            .await?;
        debug!(
            room_id = %room_id,
            matches = matches.len(),
            threshold = self.config.similarity_threshold,
            "similarity retrieval"
        );
        Ok(matches)
    }
}
