//! Shared test doubles for unit tests
//!
//! Deterministic provider implementations so retrieval and chat behavior
//! can be asserted without a network or a live API key.

use crate::error::{KbChatError, Result};
use crate::providers::{EmbeddingProvider, TextGenerator};
use async_trait::async_trait;

/// Embeds text as keyword presence over a fixed vocabulary
///
/// Component `i` is 1.0 when the text contains `topics[i]`, else 0.0.
/// Texts sharing topics land close together in L2 space, which makes
/// threshold and ranking assertions exact.
pub struct KeywordEmbedding {
    topics: Vec<&'static str>,
}

impl Default for KeywordEmbedding {
    fn default() -> Self {
        Self {
            topics: vec![
                "investment",
                "minimum",
                "property",
                "support",
                "payment",
                "withdrawal",
                "business",
            ],
        }
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lowered = text.to_lowercase();
        Ok(self
            .topics
            .iter()
            .map(|topic| if lowered.contains(topic) { 1.0 } else { 0.0 })
            .collect())
    }
}

/// Always fails, simulating quota exhaustion or a network fault
pub struct FailingEmbedding;

#[async_trait]
impl EmbeddingProvider for FailingEmbedding {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(KbChatError::Provider("embedding backend unavailable".to_string()).into())
    }
}

/// Returns a canned reply and records the prompt it was given
pub struct ScriptedGenerator {
    pub reply: String,
    pub prompts: std::sync::Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, in call order
    pub fn seen_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

/// Always fails, exercising the fallback-reply path
pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(KbChatError::Provider("generation backend unavailable".to_string()).into())
    }
}
