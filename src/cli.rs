//! Command-line interface definition for KBChat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for one-shot questions, interactive chat, index
//! management, and statistics.

use clap::{Parser, Subcommand};
use uuid::Uuid;

/// KBChat - Knowledge-base question answering CLI
///
/// Answer questions over a fixed knowledge base using retrieval-augmented
/// generation, with short-term session memory in interactive mode.
#[derive(Parser, Debug, Clone)]
#[command(name = "kbchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for KBChat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Ask a single question against the knowledge base
    Ask {
        /// The question to answer
        message: String,

        /// Continue an existing session instead of starting a new one
        #[arg(short, long)]
        session: Option<Uuid>,

        /// Show the knowledge-base sources behind the answer
        #[arg(long)]
        sources: bool,
    },

    /// Start an interactive chat session
    Chat {
        /// Show the knowledge-base sources after each answer
        #[arg(long)]
        sources: bool,
    },

    /// Build or rebuild the vector index from the knowledge-base source
    Index {
        /// Rebuild from source even when a valid index already exists
        #[arg(long)]
        rebuild: bool,
    },

    /// Show statistics about the persisted index
    Stats {
        /// Emit statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
