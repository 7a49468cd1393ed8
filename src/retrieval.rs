//! Retrieval engine
//!
//! Orchestrates query embedding, nearest-neighbour search, distance-to-
//! similarity normalization, and threshold filtering. Retrieval degrades
//! to an empty result set on any provider or index fault so the
//! surrounding conversation keeps working with "no context".

use crate::chunker::{self, Chunk};
use crate::config::KnowledgeConfig;
use crate::error::{KbChatError, Result};
use crate::index::{IndexStats, VectorIndex};
use crate::providers::EmbeddingProvider;
use std::sync::{Arc, RwLock};

/// A chunk returned for a query, with its normalized similarity score
///
/// Produced transiently per query; never stored.
#[derive(Debug, Clone)]
pub struct RetrievedPassage {
    /// The matched knowledge-base chunk
    pub chunk: Chunk,
    /// Similarity in [0, 1]; higher is more relevant
    pub score: f32,
}

/// Query-time retrieval over the vector index
///
/// The index is published whole behind a read lock: `initialize` (and any
/// later rebuild) swaps in a fully-formed immutable index, so concurrent
/// `retrieve` calls never observe a partial build.
pub struct RetrievalEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    index: RwLock<Option<Arc<VectorIndex>>>,
}

impl RetrievalEngine {
    /// Create an engine with no index yet
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            index: RwLock::new(None),
        }
    }

    /// Load the persisted index, or (re)build it from the source document
    ///
    /// Load behavior:
    /// - a valid persisted index is used as-is;
    /// - a missing index directory means "not built yet" and triggers a
    ///   build from source;
    /// - a corrupt index is logged as a warning and rebuilt from source.
    ///
    /// # Errors
    ///
    /// Propagates fatal startup faults: an unreadable source file
    /// (`Config`), an empty source (`EmptyKnowledgeBase`), or an embedding
    /// backend failure during the build.
    pub async fn initialize(&self, knowledge: &KnowledgeConfig) -> Result<()> {
        match VectorIndex::load(&knowledge.index_dir) {
            Ok(Some(index)) => {
                self.install(index);
                Ok(())
            }
            Ok(None) => {
                tracing::info!("No persisted index found, building from source");
                self.rebuild(knowledge).await
            }
            Err(e)
                if e.downcast_ref::<KbChatError>()
                    .is_some_and(KbChatError::is_index_corrupt) =>
            {
                tracing::warn!("Persisted index unusable ({}), rebuilding from source", e);
                self.rebuild(knowledge).await
            }
            Err(e) => Err(e),
        }
    }

    /// Build a fresh index from the knowledge-base source and swap it in
    ///
    /// The new index is persisted before publication so a crash between
    /// build and persist leaves the previous on-disk state intact.
    pub async fn rebuild(&self, knowledge: &KnowledgeConfig) -> Result<()> {
        let text = std::fs::read_to_string(&knowledge.data_file).map_err(|e| {
            KbChatError::Config(format!(
                "cannot read knowledge base {}: {}",
                knowledge.data_file, e
            ))
        })?;

        let chunks = chunker::split(
            &text,
            &knowledge.data_file,
            knowledge.chunk_size,
            knowledge.chunk_overlap,
        )?;
        tracing::info!("Chunked knowledge base into {} chunks", chunks.len());

        let index = VectorIndex::build(chunks, self.embedder.as_ref()).await?;
        index.persist(&knowledge.index_dir)?;
        self.install(index);
        Ok(())
    }

    /// Publish a fully-built index, replacing any previous one
    pub fn install(&self, index: VectorIndex) {
        let mut slot = self
            .index
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(Arc::new(index));
    }

    fn current_index(&self) -> Option<Arc<VectorIndex>> {
        self.index
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Retrieve the passages most relevant to `query`
    ///
    /// Returns at most `k` passages, every score at least
    /// `score_threshold`, in descending score order; fewer than `k` clear
    /// the threshold means fewer are returned, never padded. An absent
    /// index or a failed embedding call yields an empty vector rather
    /// than a fault.
    pub async fn retrieve(
        &self,
        query: &str,
        k: usize,
        score_threshold: f32,
    ) -> Vec<RetrievedPassage> {
        let Some(index) = self.current_index() else {
            tracing::warn!("Retrieval requested before an index was built");
            return Vec::new();
        };

        let query_vector = match self.embedder.embed(query).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Query embedding failed, returning no context: {}", e);
                return Vec::new();
            }
        };

        let passages: Vec<RetrievedPassage> = index
            .search(&query_vector, k)
            .into_iter()
            .filter_map(|(position, distance)| {
                let score = distance_to_score(distance);
                if score < score_threshold {
                    return None;
                }
                index.chunk(position).map(|chunk| RetrievedPassage {
                    chunk: chunk.clone(),
                    score,
                })
            })
            .collect();

        tracing::info!(
            "Retrieved {} passages for query: {:.50}",
            passages.len(),
            query
        );
        passages
    }

    /// Statistics about the currently published index
    ///
    /// Reports zeros when no index has been built yet.
    pub fn index_stats(&self) -> IndexStats {
        self.current_index()
            .map(|index| index.stats())
            .unwrap_or(IndexStats {
                total_vectors: 0,
                dimension: 0,
            })
    }
}

/// Convert a search distance into a similarity score in [0, 1]
///
/// Monotonically decreasing: distance 0 maps to 1.0 and the score
/// approaches 0 as distance grows. The exact formula is a normalization
/// choice; the bounded, higher-is-more-relevant contract is the invariant.
pub fn distance_to_score(distance: f32) -> f32 {
    if distance > 0.0 {
        1.0 / (1.0 + distance)
    } else {
        1.0
    }
}
