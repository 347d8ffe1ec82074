//! Pixie CLI — the main entry point.
//!
//! Commands:
//! - `serve`    — Start the SMS webhook server
//! - `status`   — Show configuration and today's usage
//! - `history`  — Print the most recent conversation entries
//! - `init`     — Write a starter `pixie.toml`

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "pixie",
    about = "Pixie — an SMS persona bridge",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP webhook server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Log replies instead of sending them through Twilio
        #[arg(long)]
        dry_run: bool,
    },

    /// Show configuration and today's usage
    Status,

    /// Print recent conversation entries
    History {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },

    /// Write a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port, dry_run } => commands::serve::run(port, dry_run).await?,
        Commands::Status => commands::status::run().await?,
        Commands::History { count } => commands::history::run(count).await?,
        Commands::Init { force } => commands::init::run(force)?,
    }

    Ok(())
}
