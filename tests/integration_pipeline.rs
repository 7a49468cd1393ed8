//! Integration tests for the indexing and retrieval pipeline
//!
//! Exercises the complete workflow of chunking a knowledge base, building
//! and persisting a vector index, reloading it in a fresh engine, and
//! answering retrieval queries against it.

mod common;

use common::{FailingEmbedding, KeywordEmbedding};
use kbchat::config::KnowledgeConfig;
use kbchat::providers::EmbeddingProvider;
use kbchat::retrieval::RetrievalEngine;
use std::sync::Arc;
use tempfile::TempDir;

const KNOWLEDGE_BASE: &str = "\
The minimum investment amount is fifty dollars per deposit.

Withdrawal requests are processed within two business days. Payment is \
sent to the bank account on file.

Our support team is reachable around the clock through the help center.";

fn knowledge_config(dir: &TempDir) -> KnowledgeConfig {
    let data_file = dir.path().join("kb.txt");
    std::fs::write(&data_file, KNOWLEDGE_BASE).expect("Failed to write knowledge base");
    KnowledgeConfig {
        data_file: data_file.to_string_lossy().to_string(),
        index_dir: dir.path().join("index").to_string_lossy().to_string(),
        chunk_size: 120,
        chunk_overlap: 20,
    }
}

#[tokio::test]
async fn test_build_persist_reload_and_retrieve() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let knowledge = knowledge_config(&dir);
    let embedder = Arc::new(KeywordEmbedding::default());

    let engine = RetrievalEngine::new(Arc::clone(&embedder) as Arc<dyn EmbeddingProvider>);
    engine.initialize(&knowledge).await.expect("initial build");

    let built = engine.index_stats();
    assert!(built.total_vectors >= 3, "expected one vector per paragraph");
    assert!(built.dimension > 0);

    // Version marker and payload files are on disk
    let index_dir = std::path::Path::new(&knowledge.index_dir);
    assert!(index_dir.join("version").is_file());
    assert!(index_dir.join("vectors.json").is_file());
    assert!(index_dir.join("chunks.json").is_file());

    // A fresh engine loads the persisted index instead of re-embedding
    let reloaded = RetrievalEngine::new(Arc::clone(&embedder) as Arc<dyn EmbeddingProvider>);
    reloaded.initialize(&knowledge).await.expect("reload");
    assert_eq!(reloaded.index_stats().total_vectors, built.total_vectors);

    let passages = reloaded.retrieve("minimum investment amount", 5, 0.6).await;
    assert!(!passages.is_empty());
    assert!(passages[0].chunk.content.contains("minimum investment"));
    for passage in &passages {
        assert!(passage.score >= 0.6);
        assert!(passage.score <= 1.0);
    }
}

#[tokio::test]
async fn test_rebuild_replaces_persisted_index() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let knowledge = knowledge_config(&dir);
    let embedder = Arc::new(KeywordEmbedding::default());

    let engine = RetrievalEngine::new(Arc::clone(&embedder) as Arc<dyn EmbeddingProvider>);
    engine.initialize(&knowledge).await.expect("initial build");
    let first = engine.index_stats();

    // Shrink the knowledge base and force a rebuild
    std::fs::write(&knowledge.data_file, "Only one short paragraph about payment.")
        .expect("Failed to rewrite knowledge base");
    engine.rebuild(&knowledge).await.expect("rebuild");
    assert_eq!(engine.index_stats().total_vectors, 1);
    assert!(engine.index_stats().total_vectors < first.total_vectors);

    // The persisted copy reflects the rebuild
    let reloaded = RetrievalEngine::new(embedder);
    reloaded.initialize(&knowledge).await.expect("reload");
    assert_eq!(reloaded.index_stats().total_vectors, 1);
}

#[tokio::test]
async fn test_corrupt_index_directory_is_rebuilt() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let knowledge = knowledge_config(&dir);
    let embedder = Arc::new(KeywordEmbedding::default());

    let engine = RetrievalEngine::new(Arc::clone(&embedder) as Arc<dyn EmbeddingProvider>);
    engine.initialize(&knowledge).await.expect("initial build");
    let expected = engine.index_stats().total_vectors;

    // Corrupt the payload on disk
    let index_dir = std::path::Path::new(&knowledge.index_dir);
    std::fs::write(index_dir.join("vectors.json"), "{not json").expect("Failed to corrupt");

    let recovered = RetrievalEngine::new(embedder);
    recovered
        .initialize(&knowledge)
        .await
        .expect("recovery rebuild");
    assert_eq!(recovered.index_stats().total_vectors, expected);
}

#[tokio::test]
async fn test_embedding_outage_degrades_to_no_context() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let knowledge = knowledge_config(&dir);

    // Build with a working embedder, then query through a failing one
    let builder = Arc::new(KeywordEmbedding::default());
    let engine = RetrievalEngine::new(builder as Arc<dyn EmbeddingProvider>);
    engine.initialize(&knowledge).await.expect("initial build");

    let degraded = RetrievalEngine::new(Arc::new(FailingEmbedding));
    degraded.initialize(&knowledge).await.expect("load");
    let passages = degraded.retrieve("minimum investment amount", 5, 0.0).await;
    assert!(passages.is_empty());
}

#[tokio::test]
async fn test_initialize_fails_on_missing_knowledge_base() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let knowledge = KnowledgeConfig {
        data_file: dir.path().join("missing.txt").to_string_lossy().to_string(),
        index_dir: dir.path().join("index").to_string_lossy().to_string(),
        chunk_size: 1000,
        chunk_overlap: 200,
    };

    let engine = RetrievalEngine::new(Arc::new(KeywordEmbedding::default()));
    let result = engine.initialize(&knowledge).await;
    assert!(result.is_err());
}
