//! Base provider traits for KBChat
//!
//! The retrieval engine and chat service talk to external backends only
//! through these traits, so tests and alternative providers plug in at
//! this seam.

use crate::error::Result;
use async_trait::async_trait;

/// Maps text to a fixed-dimension numeric vector
///
/// Implementations call an external embedding backend and are expected to
/// bound each request with a timeout; a slow or hung call must surface as
/// an error rather than blocking the caller indefinitely. Provider failures
/// (quota, network, auth, timeout) are reported as errors and absorbed by
/// the caller, which degrades to an empty-context path.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed `text` into the provider's vector space
    ///
    /// # Errors
    ///
    /// Returns a provider error on quota/network/auth failure or timeout.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Produces a free-text completion for a fully rendered prompt
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a reply for `prompt`
    ///
    /// # Errors
    ///
    /// Returns a provider error on quota/network/auth failure or timeout.
    /// Callers fall back to a fixed apology response instead of
    /// propagating the fault to the user.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
