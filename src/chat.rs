//! Chat orchestration
//!
//! Ties retrieval, prompt assembly, generation, and session memory into a
//! single request path. Generation failures never surface to the caller;
//! the service answers with a fixed fallback and the conversation keeps
//! its state.

use crate::config::RetrievalConfig;
use crate::error::{KbChatError, Result};
use crate::prompts;
use crate::providers::TextGenerator;
use crate::retrieval::{RetrievalEngine, RetrievedPassage};
use crate::session::{Role, SessionStore};

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Reply sent when the generation backend fails
pub const FALLBACK_REPLY: &str = "I apologize, but I'm experiencing technical \
difficulties right now. Please try again in a moment.";

/// Longest source excerpt included in a reply, in characters
const SOURCE_EXCERPT_CHARS: usize = 200;

/// A knowledge-base source that grounded a reply
#[derive(Debug, Clone, serde::Serialize)]
pub struct SourceRef {
    /// Leading excerpt of the matched chunk
    pub excerpt: String,
    /// Similarity score of the match
    pub score: f32,
}

/// One completed chat turn
#[derive(Debug, Clone, serde::Serialize)]
pub struct ChatReply {
    /// Assistant answer text
    pub message: String,
    /// Session the turn was recorded under
    pub session_id: Uuid,
    /// Sources behind the answer; empty unless requested
    pub sources: Vec<SourceRef>,
    /// When the reply was produced
    pub timestamp: DateTime<Utc>,
}

/// Retrieval-augmented chat service
pub struct ChatService {
    retrieval: Arc<RetrievalEngine>,
    generator: Arc<dyn TextGenerator>,
    sessions: Arc<SessionStore>,
    retrieval_config: RetrievalConfig,
}

impl ChatService {
    pub fn new(
        retrieval: Arc<RetrievalEngine>,
        generator: Arc<dyn TextGenerator>,
        sessions: Arc<SessionStore>,
        retrieval_config: RetrievalConfig,
    ) -> Self {
        Self {
            retrieval,
            generator,
            sessions,
            retrieval_config,
        }
    }

    /// Answer one user message within a session
    ///
    /// A missing or unknown `session_id` starts a fresh session. Retrieval
    /// and generation faults degrade (empty context, fallback reply); both
    /// the user message and the reply are recorded in session history
    /// either way.
    ///
    /// # Errors
    ///
    /// Returns `KbChatError::Config` only for a blank input message.
    pub async fn respond(
        &self,
        message: &str,
        session_id: Option<Uuid>,
        include_sources: bool,
    ) -> Result<ChatReply> {
        if message.trim().is_empty() {
            return Err(KbChatError::Config("message must not be empty".to_string()).into());
        }

        let session_id = match session_id {
            Some(id) if self.sessions.session_info(id).is_some() => id,
            Some(id) => {
                tracing::warn!("Unknown session {}, starting a new one", id);
                self.sessions.create_session()
            }
            None => self.sessions.create_session(),
        };

        // History before this turn is the "previous conversation"
        let history = self.sessions.history(session_id, None);

        let passages = self
            .retrieval
            .retrieve(
                message,
                self.retrieval_config.top_k,
                self.retrieval_config.score_threshold,
            )
            .await;

        let prompt = prompts::build_prompt(message, &passages, &history);
        let reply_text = match self.generator.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Generation failed, using fallback reply: {}", e);
                FALLBACK_REPLY.to_string()
            }
        };

        self.sessions
            .append(session_id, Role::User, message, HashMap::new());
        let mut reply_metadata = HashMap::new();
        reply_metadata.insert(
            "sources_count".to_string(),
            serde_json::Value::from(passages.len()),
        );
        self.sessions
            .append(session_id, Role::Assistant, reply_text.clone(), reply_metadata);

        let sources = if include_sources {
            passages.iter().map(source_ref).collect()
        } else {
            Vec::new()
        };

        Ok(ChatReply {
            message: reply_text,
            session_id,
            sources,
            timestamp: Utc::now(),
        })
    }

    /// The session store backing this service
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}

fn source_ref(passage: &RetrievedPassage) -> SourceRef {
    let content = &passage.chunk.content;
    let excerpt = if content.chars().count() > SOURCE_EXCERPT_CHARS {
        let truncated: String = content.chars().take(SOURCE_EXCERPT_CHARS).collect();
        format!("{}...", truncated)
    } else {
        content.clone()
    };
    SourceRef {
        excerpt,
        score: passage.score,
    }
}
