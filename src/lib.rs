//! mailbrief - Newsletter email ingestion
//!
//! Turns newsletter emails into normalized, deduplicated article records
//! ready for later scraping and summarization stages.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`registry`] - Sender-to-parser routing
//! - [`parser`] - Per-source newsletter parsers and shared extraction rules
//! - [`canonical`] - URL canonicalization used as the dedup key
//! - [`ingest`] - Batch orchestrator with per-message structured logs
//! - [`storage`] - Batch deduplication and the article store (SQLite, memory)
//! - [`mailbox`] - Message sources
//! - [`config`] - Configuration management and settings
//! - [`models`] - Core data structures and types
//! - [`utils`] - Common utilities and error types
//!
//! # Example
//!
//! ```no_run
//! use mailbrief::ingest::Ingestor;
//! use mailbrief::mailbox::{JsonMessageFile, MessageSource};
//! use mailbrief::registry::ParserRegistry;
//! use mailbrief::storage::create_sqlite_store;
//!
//! fn main() -> anyhow::Result<()> {
//!     let registry = ParserRegistry::with_builtin_sources()?;
//!     let store = create_sqlite_store("data/mailbrief.db")?;
//!     let messages = JsonMessageFile::new("messages.jsonl").fetch()?;
//!
//!     let report = Ingestor::new(&registry, store).process_messages(&messages);
//!     println!("{}", report.stats);
//!     Ok(())
//! }
//! ```

pub mod canonical;
pub mod config;
pub mod error;
pub mod ingest;
pub mod mailbox;
pub mod models;
pub mod parser;
pub mod registry;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::canonical::{canonicalize, normalize_url};
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, MailbriefErrorTrait, Result};
    pub use crate::ingest::{IngestReport, IngestStats, Ingestor};
    pub use crate::models::{ArticleCandidate, ExtractionMethod, ParsedNewsletter, RawMessage};
    pub use crate::parser::NewsletterParser;
    pub use crate::registry::{MatchType, ParserMatch, ParserRegistry};
    pub use crate::storage::{ArticleStore, SharedArticleStore};
}

// Direct re-exports for convenience
pub use models::{ArticleCandidate, ExtractionMethod, ParsedNewsletter, RawMessage};
