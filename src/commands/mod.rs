/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes four top-level command modules:

- `ask`   — Answer a single question
- `chat`  — Interactive chat loop with session memory
- `index` — Build or rebuild the vector index
- `stats` — Report statistics about the persisted index

These handlers are intentionally small and wire together the library
components: provider, retrieval engine, session store, and chat service.
*/

use crate::chat::ChatService;
use crate::config::Config;
use crate::error::Result;
use crate::providers::{EmbeddingProvider, GeminiProvider, TextGenerator};
use crate::retrieval::RetrievalEngine;
use crate::session::SessionStore;
use std::sync::Arc;

/// Build the full chat service from configuration
///
/// Initializes the retrieval engine (loading or building the index), so
/// this can fail on startup faults: missing credentials, unreadable or
/// empty knowledge base, or an embedding failure during an index build.
async fn build_chat_service(config: &Config) -> Result<ChatService> {
    let provider = Arc::new(GeminiProvider::new(&config.provider)?);

    let retrieval = Arc::new(RetrievalEngine::new(
        Arc::clone(&provider) as Arc<dyn EmbeddingProvider>
    ));
    retrieval.initialize(&config.knowledge).await?;

    let sessions = Arc::new(SessionStore::with_timeout(chrono::Duration::hours(
        config.session.timeout_hours,
    )));

    Ok(ChatService::new(
        retrieval,
        provider as Arc<dyn TextGenerator>,
        sessions,
        config.retrieval.clone(),
    ))
}

fn print_sources(sources: &[crate::chat::SourceRef]) {
    use colored::Colorize;

    if sources.is_empty() {
        println!("{}", "No sources matched this question.".dimmed());
        return;
    }
    for (i, source) in sources.iter().enumerate() {
        println!(
            "{}",
            format!("Source {} (Relevance: {:.2}):", i + 1, source.score).dimmed()
        );
        println!("{}", source.excerpt.dimmed());
    }
}

// One-shot question handler
pub mod ask {
    //! Answers a single question and prints the reply.

    use super::*;
    use uuid::Uuid;

    /// Answer `message` and print the reply to stdout
    pub async fn run_ask(
        config: Config,
        message: String,
        session: Option<Uuid>,
        sources: bool,
    ) -> Result<()> {
        let service = build_chat_service(&config).await?;
        let reply = service.respond(&message, session, sources).await?;

        println!("{}", reply.message);
        if sources {
            println!();
            print_sources(&reply.sources);
        }
        tracing::debug!("Answered under session {}", reply.session_id);
        Ok(())
    }
}

// Interactive chat handler
pub mod chat {
    //! Interactive chat loop.
    //!
    //! Creates one session for the lifetime of the loop so follow-up
    //! questions see prior turns, and reads lines with rustyline.

    use super::*;
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Run the interactive chat loop until EOF or an exit command
    pub async fn run_chat(config: Config, sources: bool) -> Result<()> {
        let service = build_chat_service(&config).await?;
        let session_id = service.sessions().create_session();

        let mut rl = DefaultEditor::new()?;

        println!("{}", "KBChat interactive mode".bold());
        println!("Ask a question, or type 'exit' to quit.\n");

        loop {
            match rl.readline("you> ") {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    if trimmed == "exit" || trimmed == "quit" {
                        break;
                    }
                    rl.add_history_entry(trimmed)?;

                    let reply = service.respond(trimmed, Some(session_id), sources).await?;
                    println!("{} {}", "assistant>".green().bold(), reply.message);
                    if sources {
                        print_sources(&reply.sources);
                    }
                    println!();
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            }
        }

        println!("Goodbye.");
        Ok(())
    }
}

// Index management handler
pub mod index {
    //! Builds or rebuilds the persisted vector index.

    use super::*;

    /// Build the index if absent, or rebuild it unconditionally
    pub async fn run_index(config: Config, rebuild: bool) -> Result<()> {
        let provider = Arc::new(GeminiProvider::new(&config.provider)?);
        let retrieval = RetrievalEngine::new(provider as Arc<dyn EmbeddingProvider>);

        if rebuild {
            retrieval.rebuild(&config.knowledge).await?;
        } else {
            retrieval.initialize(&config.knowledge).await?;
        }

        let stats = retrieval.index_stats();
        println!(
            "Index ready: {} vectors, dimension {} ({})",
            stats.total_vectors, stats.dimension, config.knowledge.index_dir
        );
        Ok(())
    }
}

// Statistics handler
pub mod stats {
    //! Reports statistics about the persisted index without touching the
    //! provider, so no API key is needed.

    use super::*;
    use crate::index::{IndexStats, VectorIndex};

    /// Print statistics for the persisted index
    pub async fn run_stats(config: Config, json: bool) -> Result<()> {
        let stats = match VectorIndex::load(&config.knowledge.index_dir)? {
            Some(index) => index.stats(),
            None => IndexStats {
                total_vectors: 0,
                dimension: 0,
            },
        };

        if json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else if stats.total_vectors == 0 {
            println!(
                "No index found at {} (run `kbchat index` to build one)",
                config.knowledge.index_dir
            );
        } else {
            println!("Index directory: {}", config.knowledge.index_dir);
            println!("Total vectors:   {}", stats.total_vectors);
            println!("Dimension:       {}", stats.dimension);
        }
        Ok(())
    }
}
