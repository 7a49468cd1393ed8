//! Embedding and text-generation backends
//!
//! This module defines the provider traits the retrieval pipeline and chat
//! service depend on, plus the Google Generative Language implementation.

pub mod base;
pub mod gemini;

pub use base::{EmbeddingProvider, TextGenerator};
pub use gemini::GeminiProvider;
