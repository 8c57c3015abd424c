//! Batch ingestion orchestrator
//!
//! Routes each message to its parser, isolates parser failures, collapses
//! duplicate candidates across the whole batch and writes the survivors
//! through the [`ArticleStore`]. Per-item failures never escape
//! [`Ingestor::process_messages`]; they are counted and logged.

pub mod log;

pub use log::{IngestStats, LogLevel, MessageLog, LOG_TARGET};

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::canonical::normalize_url;
use crate::error::{Error, MailbriefErrorTrait};
use crate::models::{ArticleCandidate, ParsedNewsletter, RawMessage};
use crate::parser::NewsletterParser;
use crate::registry::ParserRegistry;
use crate::storage::{dedup_by_canonical_url, SharedArticleStore};
use crate::utils::error::ParseError;

/// Outcome of one batch
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub stats: IngestStats,
    /// One record per input message, in input order
    pub messages: Vec<MessageLog>,
    /// Candidates written to the store
    pub articles: Vec<ArticleCandidate>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Storage-phase outcome for one candidate
enum Persisted {
    Saved,
    Exists,
}

/// Batch orchestrator over a registry and a store
pub struct Ingestor<'a> {
    registry: &'a ParserRegistry,
    store: SharedArticleStore,
}

impl<'a> Ingestor<'a> {
    pub fn new(registry: &'a ParserRegistry, store: SharedArticleStore) -> Self {
        Self { registry, store }
    }

    /// Process a batch of messages sequentially
    pub fn process_messages(&self, messages: &[RawMessage]) -> IngestReport {
        let started_at = Utc::now();
        let timer = Instant::now();

        let mut stats = IngestStats {
            processed: messages.len(),
            ..Default::default()
        };
        let mut logs = Vec::with_capacity(messages.len());
        let mut batch: Vec<(usize, ArticleCandidate)> = Vec::new();

        // Parse phase
        for (index, message) in messages.iter().enumerate() {
            let mut log = MessageLog::new(message);

            let Some(found) = self.registry.find_parser(&message.from) else {
                logs.push(log);
                continue;
            };

            log.newsletter_source = Some(found.source.clone());
            log.parser_name = Some(found.parser.name().to_string());

            match parse_isolated(found.parser.as_ref(), message) {
                Ok(parsed) => {
                    log.candidates_extracted_count = parsed.candidates.len();
                    let published_at = parsed.published_at;

                    for mut candidate in parsed.candidates {
                        if !candidate.is_emittable() {
                            tracing::trace!(title = %candidate.title, "Dropping candidate that breaks the extraction invariant");
                            continue;
                        }
                        candidate.newsletter_date = Some(published_at);
                        log.candidates_emitted_count += 1;
                        batch.push((index, candidate));
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        message_id = %message.id,
                        parser = found.parser.name(),
                        category = %e.category(),
                        error = %e,
                        "Parser failed for message, continuing batch"
                    );
                    stats.errors += 1;
                    log.errors.push(e.to_string());
                }
            }

            logs.push(log);
        }

        // Dedup phase
        let (kept, deduped) = dedup_by_canonical_url(batch, |(_, candidate)| candidate);
        stats.deduped = deduped;

        // Storage phase
        let mut articles = Vec::new();
        for (index, candidate) in kept {
            match self.persist(&candidate).map_err(Error::Storage) {
                Ok(Persisted::Saved) => {
                    stats.saved += 1;
                    articles.push(candidate);
                }
                Ok(Persisted::Exists) => stats.skipped += 1,
                Err(e) => {
                    tracing::error!(
                        title = %candidate.title,
                        url = candidate.url.as_deref().unwrap_or(""),
                        category = %e.category(),
                        recoverable = e.is_recoverable(),
                        error = %e,
                        "Failed to persist candidate"
                    );
                    stats.errors += 1;
                    logs[index].errors.push(format!("persist '{}': {e}", candidate.title));
                }
            }
        }

        for log in &mut logs {
            log.finish();
        }

        let duration_ms = u64::try_from(timer.elapsed().as_millis()).unwrap_or(u64::MAX);
        stats.emit_summary(duration_ms);

        IngestReport {
            stats,
            messages: logs,
            articles,
            started_at,
            duration_ms,
        }
    }

    /// Existence check on the original or canonical URL, or the content hash
    /// for URL-less candidates, then insert
    fn persist(&self, candidate: &ArticleCandidate) -> anyhow::Result<Persisted> {
        let exists = match candidate.url.as_deref() {
            Some(url) => {
                self.store.exists_by_url(url)? || self.store.exists_by_url(&normalize_url(url))?
            }
            None => match candidate.content_hash() {
                Some(hash) => self.store.exists_by_content_hash(&hash)?,
                None => false,
            },
        };

        if exists {
            tracing::debug!(title = %candidate.title, "Article already stored, skipping");
            return Ok(Persisted::Exists);
        }

        let id = self.store.insert(candidate)?;
        tracing::debug!(%id, title = %candidate.title, source = %candidate.source_name, "Stored article");
        Ok(Persisted::Saved)
    }
}

/// Run a parser, turning a panic into a [`ParseError::Panicked`]
fn parse_isolated(
    parser: &dyn NewsletterParser,
    message: &RawMessage,
) -> Result<ParsedNewsletter, ParseError> {
    panic::catch_unwind(AssertUnwindSafe(|| parser.parse(message))).unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| String::from("unknown panic"));
        Err(ParseError::Panicked(reason))
    })
}
