//! Configuration management for KBChat
//!
//! This module handles loading, parsing, and validating configuration
//! from a YAML file with environment-variable fallbacks for credentials.

use crate::error::{KbChatError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for KBChat
///
/// Holds all configuration needed to build the retrieval pipeline and
/// the chat service: knowledge-base location, provider settings,
/// retrieval parameters, and session retention.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Knowledge-base source and index settings
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Embedding/generation provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Retrieval ranking settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Session retention settings
    #[serde(default)]
    pub session: SessionConfig,
}

/// Knowledge-base source and index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Path to the UTF-8 knowledge-base text file
    #[serde(default = "default_data_file")]
    pub data_file: String,

    /// Directory where the vector index is persisted
    #[serde(default = "default_index_dir")]
    pub index_dir: String,

    /// Target chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_data_file() -> String {
    "data/data.txt".to_string()
}

fn default_index_dir() -> String {
    "data/vector_index".to_string()
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            index_dir: default_index_dir(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

/// Provider configuration for the Google Generative Language API
///
/// The API key can be supplied here or via the `GOOGLE_API_KEY`
/// environment variable. `api_base` exists so tests can point the
/// provider at a mock server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key; falls back to the GOOGLE_API_KEY environment variable
    #[serde(default)]
    pub api_key: Option<String>,

    /// Embedding model identifier
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Generation model identifier
    #[serde(default = "default_generation_model")]
    pub generation_model: String,

    /// Optional API base URL override (useful for tests and local mocks)
    #[serde(default)]
    pub api_base: Option<String>,

    /// Request timeout for provider calls (seconds)
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,
}

fn default_embedding_model() -> String {
    "models/embedding-001".to_string()
}

fn default_generation_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            embedding_model: default_embedding_model(),
            generation_model: default_generation_model(),
            api_base: None,
            timeout_seconds: default_request_timeout(),
        }
    }
}

impl ProviderConfig {
    /// Resolve the API key from configuration or the environment
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok().filter(|k| !k.is_empty()))
    }
}

/// Retrieval ranking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum number of passages to return per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum similarity score for a passage to be returned (0.0-1.0)
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,
}

fn default_top_k() -> usize {
    5
}

fn default_score_threshold() -> f32 {
    0.6
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            score_threshold: default_score_threshold(),
        }
    }
}

/// Session retention configuration
///
/// The per-session message cap is fixed (sized for generation-context
/// limits) and intentionally not configurable here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Hours of inactivity after which a session is reported inactive
    #[serde(default = "default_session_timeout_hours")]
    pub timeout_hours: i64,

    /// Days of inactivity after which cleanup removes a session
    #[serde(default = "default_cleanup_retention_days")]
    pub cleanup_retention_days: i64,
}

fn default_session_timeout_hours() -> i64 {
    24
}

fn default_cleanup_retention_days() -> i64 {
    7
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_hours: default_session_timeout_hours(),
            cleanup_retention_days: default_cleanup_retention_days(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// A missing file yields the default configuration; a present but
    /// malformed file is an error.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Examples
    ///
    /// ```
    /// use kbchat::config::Config;
    ///
    /// let config = Config::load("does/not/exist.yaml").unwrap();
    /// assert_eq!(config.knowledge.chunk_size, 1000);
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| KbChatError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Validate the configuration for serving traffic
    ///
    /// # Errors
    ///
    /// Returns `KbChatError::Config` if the knowledge-base file is missing
    /// or no provider API key can be resolved. Both are fatal at startup.
    pub fn validate(&self) -> Result<()> {
        if self.provider.resolve_api_key().is_none() {
            return Err(KbChatError::Config(
                "provider API key is required; set provider.api_key or GOOGLE_API_KEY".to_string(),
            )
            .into());
        }

        if !Path::new(&self.knowledge.data_file).exists() {
            return Err(KbChatError::Config(format!(
                "knowledge-base file not found: {}",
                self.knowledge.data_file
            ))
            .into());
        }

        if self.knowledge.chunk_overlap >= self.knowledge.chunk_size {
            return Err(KbChatError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.knowledge.chunk_overlap, self.knowledge.chunk_size
            ))
            .into());
        }

        Ok(())
    }
}
