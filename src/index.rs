//! Vector index for knowledge-base chunks
//!
//! Stores one embedding per chunk and answers nearest-neighbour queries
//! with a brute-force L2 scan, which is exact and fast enough at this
//! corpus scale. The index persists to a directory holding a format
//! version marker, the vector payload, and the chunk metadata keyed by
//! the same ordering. Persistence is atomic: the payload is staged into
//! a sibling temp directory and renamed into place, so a concurrent load
//! never observes a partially-written index.

use crate::chunker::Chunk;
use crate::error::{KbChatError, Result};
use crate::providers::EmbeddingProvider;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;

/// Current on-disk format version
pub const FORMAT_VERSION: u32 = 1;

/// First line of the version marker file
const VERSION_MARKER: &str = "kbchat-index/1";

/// Name of the version marker file inside the index directory
const VERSION_FILE: &str = "version";

/// Name of the vector payload file
const VECTORS_FILE: &str = "vectors.json";

/// Name of the chunk metadata file
const CHUNKS_FILE: &str = "chunks.json";

/// Summary statistics about a built index
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of indexed vectors (one per chunk)
    pub total_vectors: usize,
    /// Embedding dimension shared by every vector
    pub dimension: usize,
}

/// Similarity-searchable store of chunk embeddings
///
/// Immutable once built: `search` takes `&self` and may be called
/// concurrently from many retrieval calls without locking. Rebuilds
/// produce a fresh index that callers swap in whole.
#[derive(Debug)]
pub struct VectorIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
    chunks: Vec<Chunk>,
    // Serializes concurrent persist attempts; not part of the payload.
    persist_lock: Mutex<()>,
}

/// Serialized form of the vector payload
#[derive(Serialize, Deserialize)]
struct VectorPayload {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    /// Build an index by embedding every chunk
    ///
    /// # Arguments
    ///
    /// * `chunks` - Chunks produced by one chunker batch
    /// * `embedder` - The embedding backend
    ///
    /// # Errors
    ///
    /// Returns `EmptyKnowledgeBase` for an empty chunk batch, a provider
    /// error if any embedding call fails, and `IndexCorrupt` if the
    /// provider returns vectors of inconsistent dimension. A failed build
    /// never yields a partially-filled index.
    pub async fn build(chunks: Vec<Chunk>, embedder: &dyn EmbeddingProvider) -> Result<Self> {
        if chunks.is_empty() {
            return Err(
                KbChatError::EmptyKnowledgeBase("no chunks to index".to_string()).into(),
            );
        }

        let mut vectors = Vec::with_capacity(chunks.len());
        let mut dimension = 0usize;

        for chunk in &chunks {
            let embedding = embedder.embed(&chunk.content).await?;
            if dimension == 0 {
                dimension = embedding.len();
                if dimension == 0 {
                    return Err(KbChatError::Provider(
                        "embedding backend returned a zero-dimension vector".to_string(),
                    )
                    .into());
                }
            } else if embedding.len() != dimension {
                return Err(KbChatError::IndexCorrupt(format!(
                    "embedding dimension mismatch: expected {}, got {} for chunk {}",
                    dimension,
                    embedding.len(),
                    chunk.chunk_index
                ))
                .into());
            }
            vectors.push(embedding);
        }

        tracing::info!(
            "Built vector index: {} vectors, dimension {}",
            vectors.len(),
            dimension
        );

        Ok(Self {
            dimension,
            vectors,
            chunks,
            persist_lock: Mutex::new(()),
        })
    }

    /// Find the `k` nearest chunks to `query` by L2 distance
    ///
    /// Returns `(chunk position, distance)` pairs in ascending distance
    /// order. A query of the wrong dimension returns no results.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        if query.len() != self.dimension || k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, l2_distance(query, v)))
            .collect();

        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }

    /// Look up the chunk stored at `position`
    pub fn chunk(&self, position: usize) -> Option<&Chunk> {
        self.chunks.get(position)
    }

    /// Summary statistics for this index
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_vectors: self.vectors.len(),
            dimension: self.dimension,
        }
    }

    /// Persist the index to `dir` atomically
    ///
    /// The payload is written into a sibling staging directory and then
    /// renamed over the target, so either a fully-written valid index is
    /// on disk or the previous state is untouched. Concurrent persist
    /// attempts on the same index are serialized.
    pub fn persist<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let _guard = self
            .persist_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let dir = dir.as_ref();
        let staging = dir.with_extension("staging");

        if staging.exists() {
            std::fs::remove_dir_all(&staging)?;
        }
        std::fs::create_dir_all(&staging)?;

        std::fs::write(staging.join(VERSION_FILE), VERSION_MARKER)?;

        let payload = VectorPayload {
            dimension: self.dimension,
            vectors: self.vectors.clone(),
        };
        std::fs::write(
            staging.join(VECTORS_FILE),
            serde_json::to_vec(&payload).map_err(KbChatError::from)?,
        )?;
        std::fs::write(
            staging.join(CHUNKS_FILE),
            serde_json::to_vec(&self.chunks).map_err(KbChatError::from)?,
        )?;

        if dir.exists() {
            std::fs::remove_dir_all(dir)?;
        }
        std::fs::rename(&staging, dir)?;

        tracing::info!("Persisted vector index to {}", dir.display());
        Ok(())
    }

    /// Load a persisted index from `dir`
    ///
    /// A missing directory is not an error: it signals "index does not
    /// exist yet" and returns `Ok(None)`. A present directory with a
    /// missing or mismatched version marker, an unreadable payload, or
    /// inconsistent contents fails with `IndexCorrupt`, which the caller
    /// treats as "rebuild from source".
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Option<Self>> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Ok(None);
        }

        let marker = std::fs::read_to_string(dir.join(VERSION_FILE))
            .map_err(|e| KbChatError::IndexCorrupt(format!("missing version marker: {}", e)))?;
        if marker.trim() != VERSION_MARKER {
            return Err(KbChatError::IndexCorrupt(format!(
                "version marker mismatch: expected '{}', found '{}'",
                VERSION_MARKER,
                marker.trim()
            ))
            .into());
        }

        let vectors_raw = std::fs::read(dir.join(VECTORS_FILE))
            .map_err(|e| KbChatError::IndexCorrupt(format!("missing vector payload: {}", e)))?;
        let payload: VectorPayload = serde_json::from_slice(&vectors_raw)
            .map_err(|e| KbChatError::IndexCorrupt(format!("unreadable vector payload: {}", e)))?;

        let chunks_raw = std::fs::read(dir.join(CHUNKS_FILE))
            .map_err(|e| KbChatError::IndexCorrupt(format!("missing chunk metadata: {}", e)))?;
        let chunks: Vec<Chunk> = serde_json::from_slice(&chunks_raw)
            .map_err(|e| KbChatError::IndexCorrupt(format!("unreadable chunk metadata: {}", e)))?;

        if payload.vectors.len() != chunks.len() {
            return Err(KbChatError::IndexCorrupt(format!(
                "payload mismatch: {} vectors but {} chunks",
                payload.vectors.len(),
                chunks.len()
            ))
            .into());
        }
        if payload
            .vectors
            .iter()
            .any(|v| v.len() != payload.dimension)
        {
            return Err(KbChatError::IndexCorrupt(
                "vector payload contains mixed dimensions".to_string(),
            )
            .into());
        }

        tracing::info!(
            "Loaded vector index from {}: {} vectors, dimension {}",
            dir.display(),
            payload.vectors.len(),
            payload.dimension
        );

        Ok(Some(Self {
            dimension: payload.dimension,
            vectors: payload.vectors,
            chunks,
            persist_lock: Mutex::new(()),
        }))
    }
}

/// Euclidean (L2) distance between two equal-length vectors
fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
