//! Error types for KBChat
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for KBChat operations
///
/// This enum encompasses all possible errors that can occur during
/// configuration loading, knowledge-base indexing, retrieval, and
/// provider interactions.
///
/// The taxonomy mirrors how failures are handled:
/// - `Config` and `EmptyKnowledgeBase` are fatal at startup.
/// - `IndexCorrupt` is recovered automatically by rebuilding from source.
/// - `Provider` is absorbed at the call site (empty retrieval results,
///   fallback reply). It never crashes a request.
/// - An unknown session is not an error at all; store operations return
///   boolean/empty sentinels instead.
#[derive(Error, Debug)]
pub enum KbChatError {
    /// Configuration-related errors (missing knowledge-base file, credentials)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The knowledge-base source produced zero chunks
    #[error("Empty knowledge base: {0}")]
    EmptyKnowledgeBase(String),

    /// Persisted index is unreadable or carries an incompatible format version
    #[error("Index corrupt: {0}")]
    IndexCorrupt(String),

    /// Provider-related errors (embedding or generation API calls, timeouts)
    #[error("Provider error: {0}")]
    Provider(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl KbChatError {
    /// Returns true if this error means the persisted index should be
    /// discarded and rebuilt from the knowledge-base source.
    pub fn is_index_corrupt(&self) -> bool {
        matches!(self, KbChatError::IndexCorrupt(_))
    }
}

/// Result type alias for KBChat operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = KbChatError::Config("missing API key".to_string());
        assert_eq!(error.to_string(), "Configuration error: missing API key");
    }

    #[test]
    fn test_empty_knowledge_base_error_display() {
        let error = KbChatError::EmptyKnowledgeBase("data/data.txt".to_string());
        assert_eq!(error.to_string(), "Empty knowledge base: data/data.txt");
    }

    #[test]
    fn test_index_corrupt_error_display() {
        let error = KbChatError::IndexCorrupt("version mismatch".to_string());
        assert_eq!(error.to_string(), "Index corrupt: version mismatch");
        assert!(error.is_index_corrupt());
    }

    #[test]
    fn test_provider_error_display() {
        let error = KbChatError::Provider("API timeout".to_string());
        assert_eq!(error.to_string(), "Provider error: API timeout");
        assert!(!error.is_index_corrupt());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: KbChatError = io_error.into();
        assert!(matches!(error, KbChatError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_str = "{invalid json}";
        let json_error = serde_json::from_str::<serde_json::Value>(json_str).unwrap_err();
        let error: KbChatError = json_error.into();
        assert!(matches!(error, KbChatError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_str = "invalid: : yaml";
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>(yaml_str).unwrap_err();
        let error: KbChatError = yaml_error.into();
        assert!(matches!(error, KbChatError::Yaml(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KbChatError>();
    }
}
