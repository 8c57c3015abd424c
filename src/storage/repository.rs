//! Repository Pattern for Article Persistence
//!
//! This module provides the storage collaborator the ingestion orchestrator
//! writes through:
//! - [`ArticleStore`] trait with existence checks and inserts
//! - [`SqliteArticleStore`] backed by a single SQLite file
//! - [`MemoryArticleStore`] for tests and dry runs
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Ingestion Orchestrator                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ArticleStore trait                       │
//! └─────────────────────────────────────────────────────────────┘
//!                   ┌──────────┴──────────┐
//!                   ▼                     ▼
//!          ┌─────────────────┐   ┌─────────────────┐
//!          │     SQLite      │   │     Memory      │
//!          │  Implementation │   │ Implementation  │
//!          └─────────────────┘   └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use mailbrief::storage::{ArticleStore, SqliteArticleStore};
//!
//! // Production: use SQLite
//! let store = SqliteArticleStore::new("data/mailbrief.db")?;
//!
//! // Testing and dry runs: use memory
//! let store = MemoryArticleStore::new();
//! ```

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use uuid::Uuid;

use crate::canonical::normalize_url;
use crate::models::{ArticleCandidate, ExtractionMethod};

// ============================================================================
// Core Types
// ============================================================================

/// Persisted article row
#[derive(Debug, Clone, Serialize)]
pub struct StoredArticle {
    pub id: Uuid,
    pub title: String,
    pub url: Option<String>,
    /// Dedup key of `url`
    pub canonical_url: Option<String>,
    pub summary: String,
    pub content: Option<String>,
    /// SHA-256 of `content`, for URL-less inline articles
    pub content_hash: Option<String>,
    pub source_name: String,
    pub extraction_method: ExtractionMethod,
    pub reading_time: Option<String>,
    pub section: Option<String>,
    pub title_inferred: bool,
    pub newsletter_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl StoredArticle {
    /// Build the row for a candidate
    pub fn from_candidate(candidate: &ArticleCandidate) -> Self {
        let url = candidate
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string);

        Self {
            id: Uuid::new_v4(),
            title: candidate.title.clone(),
            canonical_url: url.as_deref().map(normalize_url),
            url,
            summary: candidate.summary.clone(),
            content: candidate.content.clone(),
            content_hash: candidate.content_hash(),
            source_name: candidate.source_name.clone(),
            extraction_method: candidate.extraction_method,
            reading_time: candidate.reading_time.clone(),
            section: candidate.section.clone(),
            title_inferred: candidate.title_inferred.unwrap_or(false),
            newsletter_date: candidate.newsletter_date,
            created_at: Utc::now(),
        }
    }
}

// ============================================================================
// Repository Trait
// ============================================================================

/// Storage collaborator used by the orchestrator's final phase
pub trait ArticleStore: Send + Sync {
    /// Check if an article exists whose original or canonical URL equals `url`
    fn exists_by_url(&self, url: &str) -> Result<bool>;

    /// Check if an article with the given content hash exists
    fn exists_by_content_hash(&self, hash: &str) -> Result<bool>;

    /// Persist a candidate, returning the new article ID
    fn insert(&self, candidate: &ArticleCandidate) -> Result<Uuid>;

    /// Count stored articles
    fn count(&self) -> Result<usize>;

    /// Most recently stored articles, newest first
    fn recent(&self, limit: usize) -> Result<Vec<StoredArticle>>;
}

// ============================================================================
// SQLite Implementation
// ============================================================================

/// SQLite implementation of ArticleStore
///
/// Uses `Mutex` to ensure thread-safety for the SQLite connection.
pub struct SqliteArticleStore {
    conn: Mutex<Connection>,
}

impl SqliteArticleStore {
    /// Open (or create) a store at `path`
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Create parent directory if needed
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let conn = Connection::open(path).context("Failed to open SQLite database")?;

        // Enable WAL mode for better concurrency
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;

        tracing::info!(path = %path.display(), "SQLite article store initialized");
        Ok(store)
    }

    /// Create in-memory store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to create in-memory SQLite")?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("SQLite connection mutex poisoned"))
    }

    /// Create database schema
    fn create_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
                CREATE TABLE IF NOT EXISTS articles (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    url TEXT,
                    canonical_url TEXT UNIQUE,
                    summary TEXT NOT NULL DEFAULT '',
                    content TEXT,
                    content_hash TEXT,
                    source_name TEXT NOT NULL,
                    extraction_method TEXT NOT NULL,
                    reading_time TEXT,
                    section TEXT,
                    title_inferred INTEGER NOT NULL DEFAULT 0,
                    newsletter_date TEXT,
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_articles_url
                    ON articles(url);

                CREATE INDEX IF NOT EXISTS idx_articles_content_hash
                    ON articles(content_hash);

                CREATE INDEX IF NOT EXISTS idx_articles_newsletter_date
                    ON articles(newsletter_date);
                "#,
        )
        .context("Failed to create SQLite schema")?;

        Ok(())
    }

    fn row_to_article(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredArticle> {
        let id: String = row.get(0)?;
        let method: String = row.get(8)?;
        let newsletter_date: Option<String> = row.get(12)?;
        let created_at: String = row.get(13)?;

        Ok(StoredArticle {
            id: Uuid::parse_str(&id).unwrap_or_else(|_| Uuid::nil()),
            title: row.get(1)?,
            url: row.get(2)?,
            canonical_url: row.get(3)?,
            summary: row.get(4)?,
            content: row.get(5)?,
            content_hash: row.get(6)?,
            source_name: row.get(7)?,
            extraction_method: if method == ExtractionMethod::EmailInline.as_str() {
                ExtractionMethod::EmailInline
            } else {
                ExtractionMethod::EmailLinks
            },
            reading_time: row.get(9)?,
            section: row.get(10)?,
            title_inferred: row.get(11)?,
            newsletter_date: newsletter_date
                .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

impl ArticleStore for SqliteArticleStore {
    fn exists_by_url(&self, url: &str) -> Result<bool> {
        let conn = self.lock()?;
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM articles WHERE url = ?1 OR canonical_url = ?1)",
                params![url],
                |row| row.get(0),
            )
            .context("Failed to check URL")?;

        Ok(exists)
    }

    fn exists_by_content_hash(&self, hash: &str) -> Result<bool> {
        let conn = self.lock()?;
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM articles WHERE content_hash = ?1)",
                params![hash],
                |row| row.get(0),
            )
            .context("Failed to check content hash")?;

        Ok(exists)
    }

    fn insert(&self, candidate: &ArticleCandidate) -> Result<Uuid> {
        let article = StoredArticle::from_candidate(candidate);
        let conn = self.lock()?;

        conn.execute(
            r#"
                INSERT INTO articles (
                    id, title, url, canonical_url, summary, content, content_hash,
                    source_name, extraction_method, reading_time, section,
                    title_inferred, newsletter_date, created_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                "#,
            params![
                article.id.to_string(),
                article.title,
                article.url,
                article.canonical_url,
                article.summary,
                article.content,
                article.content_hash,
                article.source_name,
                article.extraction_method.as_str(),
                article.reading_time,
                article.section,
                article.title_inferred,
                article.newsletter_date.map(|d| d.to_string()),
                article.created_at.to_rfc3339(),
            ],
        )
        .with_context(|| format!("Failed to insert article: {}", article.title))?;

        Ok(article.id)
    }

    fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(total as usize)
    }

    fn recent(&self, limit: usize) -> Result<Vec<StoredArticle>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, title, url, canonical_url, summary, content, content_hash,
                        source_name, extraction_method, reading_time, section,
                        title_inferred, newsletter_date, created_at
                 FROM articles ORDER BY created_at DESC, rowid DESC LIMIT ?1",
            )
            .context("Failed to prepare recent query")?;

        let articles = stmt
            .query_map(params![limit as i64], Self::row_to_article)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read articles")?;

        Ok(articles)
    }
}

impl SqliteArticleStore {
    /// Look up one article by its canonical URL
    pub fn get_by_canonical_url(&self, url: &str) -> Result<Option<StoredArticle>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, title, url, canonical_url, summary, content, content_hash,
                    source_name, extraction_method, reading_time, section,
                    title_inferred, newsletter_date, created_at
             FROM articles WHERE canonical_url = ?1",
            params![normalize_url(url)],
            Self::row_to_article,
        )
        .optional()
        .context("Failed to get article")
    }
}

// ============================================================================
// In-memory Implementation
// ============================================================================

/// In-memory implementation of ArticleStore
#[derive(Default)]
pub struct MemoryArticleStore {
    articles: RwLock<Vec<StoredArticle>>,
}

impl MemoryArticleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArticleStore for MemoryArticleStore {
    fn exists_by_url(&self, url: &str) -> Result<bool> {
        let articles = self.articles.read().map_err(|_| anyhow!("Article store lock poisoned"))?;
        Ok(articles
            .iter()
            .any(|a| a.url.as_deref() == Some(url) || a.canonical_url.as_deref() == Some(url)))
    }

    fn exists_by_content_hash(&self, hash: &str) -> Result<bool> {
        let articles = self.articles.read().map_err(|_| anyhow!("Article store lock poisoned"))?;
        Ok(articles.iter().any(|a| a.content_hash.as_deref() == Some(hash)))
    }

    fn insert(&self, candidate: &ArticleCandidate) -> Result<Uuid> {
        let article = StoredArticle::from_candidate(candidate);
        let mut articles = self.articles.write().map_err(|_| anyhow!("Article store lock poisoned"))?;

        if let Some(canonical) = &article.canonical_url {
            if articles.iter().any(|a| a.canonical_url.as_ref() == Some(canonical)) {
                return Err(anyhow!("Article already stored: {canonical}"));
            }
        }

        let id = article.id;
        articles.push(article);
        Ok(id)
    }

    fn count(&self) -> Result<usize> {
        let articles = self.articles.read().map_err(|_| anyhow!("Article store lock poisoned"))?;
        Ok(articles.len())
    }

    fn recent(&self, limit: usize) -> Result<Vec<StoredArticle>> {
        let articles = self.articles.read().map_err(|_| anyhow!("Article store lock poisoned"))?;
        Ok(articles.iter().rev().take(limit).cloned().collect())
    }
}

// ============================================================================
// Shared Store Types
// ============================================================================

/// Thread-safe shared store wrapper
pub type SharedArticleStore = Arc<dyn ArticleStore>;

/// Create a shared SQLite store
pub fn create_sqlite_store(path: impl AsRef<Path>) -> Result<SharedArticleStore> {
    let store = SqliteArticleStore::new(path)?;
    Ok(Arc::new(store))
}

/// Create a shared in-memory store
pub fn create_memory_store() -> SharedArticleStore {
    Arc::new(MemoryArticleStore::new())
}

// ============================================================================
// Tests
// ============================================================================
