use anyhow::{Context, Result};
use std::path::PathBuf;

use mailbrief::config::Config;
use mailbrief::ingest::Ingestor;
use mailbrief::mailbox::{JsonMessageFile, MessageSource};
use mailbrief::storage::{create_memory_store, create_sqlite_store};

/// Arguments for the ingest command
#[derive(Debug, Clone)]
pub struct IngestParams {
    pub input: PathBuf,
    pub db: Option<PathBuf>,
    pub limit: Option<usize>,
    pub dry_run: bool,
    pub pretty: bool,
}

pub fn ingest(config: &Config, params: IngestParams) -> Result<()> {
    let registry = config.registry()?;

    let mut messages = JsonMessageFile::new(&params.input).fetch()?;
    let limit = params.limit.unwrap_or(config.ingest.max_messages);
    if messages.len() > limit {
        tracing::info!(total = messages.len(), limit, "Truncating batch to message limit");
        messages.truncate(limit);
    }

    let dry_run = params.dry_run || config.ingest.dry_run;
    let store = if dry_run {
        tracing::info!("Dry run: articles are kept in memory only");
        create_memory_store()
    } else {
        let db_path = params.db.unwrap_or_else(|| config.storage.sqlite_path.clone());
        create_sqlite_store(&db_path)
            .with_context(|| format!("Failed to open article store: {}", db_path.display()))?
    };

    let report = Ingestor::new(&registry, store).process_messages(&messages);

    let json = if params.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    eprintln!("{}", report.stats);

    Ok(())
}
