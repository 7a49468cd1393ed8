//! Prompt assembly
//!
//! Renders retrieved passages and session history into the single text
//! prompt handed to the generation backend. Formatting here is part of the
//! model contract: the source numbering and relevance figures are what the
//! assistant is instructed to ground its answers in.

use crate::retrieval::RetrievedPassage;
use crate::session::{Message, Role};

/// Placeholder text when retrieval produced no passages
pub const NO_CONTEXT: &str = "No relevant context found.";

/// Placeholder text for a session with no prior turns
pub const NO_HISTORY: &str = "No previous conversation.";

/// Prompt skeleton; `{context}`, `{chat_history}` and `{question}` are
/// substituted at render time
const PROMPT_TEMPLATE: &str = "\
You are a helpful assistant answering questions about a knowledge base.

Use the following context to answer the question. If the context does not \
contain the information needed, say that you don't have that information \
rather than guessing.

Context:
{context}

Previous conversation:
{chat_history}

User question: {question}

Answer:";

/// Render retrieved passages as numbered, relevance-annotated sources
pub fn format_context(passages: &[RetrievedPassage]) -> String {
    if passages.is_empty() {
        return NO_CONTEXT.to_string();
    }

    passages
        .iter()
        .enumerate()
        .map(|(i, passage)| {
            format!(
                "Source {} (Relevance: {:.2}):\n{}",
                i + 1,
                passage.score,
                passage.chunk.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render prior turns as alternating speaker-labelled lines
pub fn format_chat_history(messages: &[Message]) -> String {
    if messages.is_empty() {
        return NO_HISTORY.to_string();
    }

    messages
        .iter()
        .map(|message| {
            let speaker = match message.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            format!("{}: {}", speaker, message.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Assemble the full generation prompt
pub fn build_prompt(question: &str, passages: &[RetrievedPassage], history: &[Message]) -> String {
    PROMPT_TEMPLATE
        .replace("{context}", &format_context(passages))
        .replace("{chat_history}", &format_chat_history(history))
        .replace("{question}", question)
}
