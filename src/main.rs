use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mailbrief::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "mailbrief",
    version,
    about = "Newsletter email ingestion with per-sender parsers and cross-source dedup",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); defaults to the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// TOML configuration file (environment variables are used otherwise)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse, dedup and store a batch of newsletter messages
    Ingest {
        /// JSON array or JSON Lines file of messages
        #[arg(short, long)]
        input: PathBuf,

        /// SQLite database path (overrides config)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Maximum number of messages to process
        #[arg(short, long)]
        limit: Option<usize>,

        /// Parse and report without writing to the database
        #[arg(long, default_value = "false")]
        dry_run: bool,

        /// Pretty-print the JSON report
        #[arg(long, default_value = "false")]
        pretty: bool,
    },

    /// Show which parser a sender routes to
    Route {
        /// From header value, e.g. "TLDR <dan@tldrnewsletter.com>"
        from: String,
    },

    /// Print the canonical form and dedup key of a URL
    Canonicalize {
        /// URL to canonicalize
        url: String,
    },

    /// List registered newsletter sources
    Sources {
        /// Output as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    // Initialize tracing/logging
    let log_format = cli.log_format.as_deref().unwrap_or(&config.logging.format);
    setup_tracing(log_format, &config.logging.level, cli.verbose)?;

    config.validate()?;

    match cli.command {
        Commands::Ingest {
            input,
            db,
            limit,
            dry_run,
            pretty,
        } => {
            tracing::info!(input = %input.display(), ?limit, dry_run, "Starting ingest command");
            commands::ingest(
                &config,
                commands::IngestParams {
                    input,
                    db,
                    limit,
                    dry_run,
                    pretty,
                },
            )?;
        }
        Commands::Route { from } => {
            commands::route(&config, &from)?;
        }
        Commands::Canonicalize { url } => {
            commands::canonicalize(&url)?;
        }
        Commands::Sources { json } => {
            commands::sources(&config, json)?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            tracing_subscriber::EnvFilter::new("mailbrief=debug,info")
        } else {
            tracing_subscriber::EnvFilter::new(format!("mailbrief={level},warn"))
        }
    });

    // Logs go to stderr so stdout stays machine-readable
    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
