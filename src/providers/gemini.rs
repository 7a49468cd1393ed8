//! Google Generative Language provider for KBChat
//!
//! Implements both `EmbeddingProvider` (embedContent) and `TextGenerator`
//! (generateContent) against the Generative Language REST API. Every call
//! shares a reqwest client with a request-level timeout so a hung backend
//! cannot starve the calling task.

use crate::config::ProviderConfig;
use crate::error::{KbChatError, Result};
use crate::providers::{EmbeddingProvider, TextGenerator};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Generation sampling temperature, matching the reference deployment
const GENERATION_TEMPERATURE: f32 = 0.7;

/// Generation output cap in tokens
const GENERATION_MAX_OUTPUT_TOKENS: u32 = 2048;

/// Google Generative Language API provider
///
/// # Examples
///
/// ```no_run
/// use kbchat::config::ProviderConfig;
/// use kbchat::providers::{EmbeddingProvider, GeminiProvider};
///
/// # async fn example() -> kbchat::error::Result<()> {
/// let mut config = ProviderConfig::default();
/// config.api_key = Some("key".to_string());
/// let provider = GeminiProvider::new(&config)?;
/// let vector = provider.embed("minimum investment amount").await?;
/// # Ok(())
/// # }
/// ```
pub struct GeminiProvider {
    client: Client,
    api_base: String,
    api_key: String,
    embedding_model: String,
    generation_model: String,
}

/// Request body for embedContent
#[derive(Debug, Serialize)]
struct EmbedRequest {
    model: String,
    content: ContentParts,
}

/// Request body for generateContent
#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<ContentParts>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContentParts {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TextPart {
    text: String,
}

/// Response from embedContent
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

/// Response from generateContent
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ContentParts,
}

impl GeminiProvider {
    /// Create a provider from configuration
    ///
    /// # Errors
    ///
    /// Returns `KbChatError::Config` when no API key can be resolved from
    /// the configuration or the `GOOGLE_API_KEY` environment variable.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            KbChatError::Config(
                "provider API key is required; set provider.api_key or GOOGLE_API_KEY".to_string(),
            )
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(KbChatError::from)?;

        Ok(Self {
            client,
            api_base: config
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            api_key,
            embedding_model: config.embedding_model.clone(),
            generation_model: config.generation_model.clone(),
        })
    }

    fn embed_url(&self) -> String {
        format!(
            "{}/v1beta/{}:embedContent?key={}",
            self.api_base, self.embedding_model, self.api_key
        )
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.api_base, self.generation_model, self.api_key
        )
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbedRequest {
            model: self.embedding_model.clone(),
            content: ContentParts {
                parts: vec![TextPart {
                    text: text.to_string(),
                }],
            },
        };

        let response = self
            .client
            .post(self.embed_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| KbChatError::Provider(format!("embedContent request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KbChatError::Provider(format!(
                "embedContent returned {}: {}",
                status, body
            ))
            .into());
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| KbChatError::Provider(format!("invalid embedContent response: {}", e)))?;

        if parsed.embedding.values.is_empty() {
            return Err(
                KbChatError::Provider("embedContent returned an empty vector".to_string()).into(),
            );
        }

        Ok(parsed.embedding.values)
    }
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![ContentParts {
                parts: vec![TextPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: GENERATION_TEMPERATURE,
                max_output_tokens: GENERATION_MAX_OUTPUT_TOKENS,
            },
        };

        let response = self
            .client
            .post(self.generate_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| KbChatError::Provider(format!("generateContent request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KbChatError::Provider(format!(
                "generateContent returned {}: {}",
                status, body
            ))
            .into());
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            KbChatError::Provider(format!("invalid generateContent response: {}", e))
        })?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| {
                KbChatError::Provider("generateContent returned no candidates".to_string())
            })?;

        Ok(text)
    }
}
