//! KBChat - Knowledge-base question answering library
//!
//! This library provides retrieval-augmented question answering over a
//! fixed knowledge base: text chunking, embedding-backed vector search,
//! prompt assembly, generation with graceful degradation, and bounded
//! per-session conversation memory.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `chunker`: Boundary-aware splitting of the knowledge-base text
//! - `index`: Brute-force vector index with atomic directory persistence
//! - `retrieval`: Query embedding, search, scoring, and thresholding
//! - `providers`: Embedding/generation trait seam and the Google backend
//! - `session`: Bounded, expiring per-conversation message history
//! - `chat`: Orchestration of retrieval, prompting, and generation
//! - `prompts`: Context and history rendering for the generation prompt
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use kbchat::config::Config;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::load("config.yaml")?;
//! config.validate()?;
//! // Service wiring would go here
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod chunker;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod index;
pub mod prompts;
pub mod providers;
pub mod retrieval;
pub mod session;

#[cfg(test)]
pub mod test_utils;

pub use chat::{ChatReply, ChatService};
pub use config::Config;
pub use error::{KbChatError, Result};
pub use retrieval::{RetrievalEngine, RetrievedPassage};
pub use session::SessionStore;
