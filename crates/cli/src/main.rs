//! LifeChat CLI: the main entry point.
//!
//! Commands:
//! - `onboard` : Write the default config
//! - `serve`   : Start the HTTP API
//! - `chat`    : Log a chat message (or chat interactively)
//! - `events`  : List events in a period
//! - `feelings`: List feelings in a period
//! - `advice`  : Advice or a motivational speech for a period

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "lifechat",
    about = "LifeChat: journal your day by chatting",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    Onboard,

    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Log what happened; without --message, chat interactively
    Chat {
        #[arg(short, long)]
        message: Option<String>,
    },

    /// List events whose start lies in [start, end)
    Events {
        #[command(flatten)]
        range: commands::RangeArgs,
    },

    /// List feelings recorded in [start, end)
    Feelings {
        #[command(flatten)]
        range: commands::RangeArgs,
    },

    /// Ask for advice about a period
    Advice {
        #[command(flatten)]
        range: commands::RangeArgs,

        /// A motivational speech instead of advice
        #[arg(long)]
        motivational: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Secrets usually live in a .env file
    let _ = dotenvy::dotenv();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    if cli.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Events { range } => commands::records::events(range).await?,
        Commands::Feelings { range } => commands::records::feelings(range).await?,
        Commands::Advice {
            range,
            motivational,
        } => commands::advice::run(range, motivational).await?,
    }

    Ok(())
}
