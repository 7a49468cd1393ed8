//! KBChat - Knowledge-base question answering CLI
//!
#![doc = "KBChat - Knowledge-base question answering CLI"]
#![doc = "Main entry point for the KBChat application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kbchat::cli::{Cli, Commands};
use kbchat::commands;
use kbchat::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path)?;

    // Execute command
    match cli.command {
        Commands::Ask {
            message,
            session,
            sources,
        } => {
            config.validate()?;
            commands::ask::run_ask(config, message, session, sources).await?;
            Ok(())
        }
        Commands::Chat { sources } => {
            tracing::info!("Starting interactive chat mode");
            config.validate()?;
            commands::chat::run_chat(config, sources).await?;
            Ok(())
        }
        Commands::Index { rebuild } => {
            tracing::info!("Starting index build (rebuild: {})", rebuild);
            config.validate()?;
            commands::index::run_index(config, rebuild).await?;
            Ok(())
        }
        Commands::Stats { json } => {
            // Stats only reads the persisted index; no credentials needed
            commands::stats::run_stats(config, json).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` takes precedence; otherwise `--verbose` lowers the default
/// level to debug.
fn init_tracing(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(verbose)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "kbchat=debug"
    } else {
        "kbchat=info"
    }
}
