//! Article persistence and batch deduplication
//!
//! This module handles the final phase of ingestion: collapsing duplicate
//! candidates within a batch and writing survivors through an
//! [`ArticleStore`] (SQLite in production, memory for tests and dry runs).

pub mod dedup;
pub mod repository;

pub use dedup::{dedup_by_canonical_url, deduplicate_candidates_by_url, DedupOutcome};
pub use repository::{
    create_memory_store, create_sqlite_store, ArticleStore, MemoryArticleStore, SharedArticleStore,
    SqliteArticleStore, StoredArticle,
};
