//! Error scenario integration tests
//!
//! Tests failure isolation in the ingestion pipeline:
//! 1. Garbled HTML next to a well-formed issue
//! 2. Parsers that panic or return errors
//! 3. Store failures on insert and on existence checks
//! 4. Unknown senders and empty issues

use std::sync::Arc;

use anyhow::{anyhow, Result};
use mailbrief::ingest::{Ingestor, LogLevel};
use mailbrief::models::{ArticleCandidate, ParsedNewsletter, RawMessage};
use mailbrief::parser::NewsletterParser;
use mailbrief::registry::{ParserRegistration, ParserRegistry};
use mailbrief::storage::{ArticleStore, MemoryArticleStore, StoredArticle};
use mailbrief::utils::error::ParseError;
use uuid::Uuid;

use crate::common::{create_message, GARBLED_HTML, MORNING_BREW_FROM, TLDR_FROM, TLDR_HTML};

// ============================================================================
// Test Doubles
// ============================================================================

struct PanickingParser;

impl NewsletterParser for PanickingParser {
    fn name(&self) -> &str {
        "PanickingParser"
    }

    fn source_name(&self) -> &str {
        "Panics Weekly"
    }

    fn parse(&self, _message: &RawMessage) -> Result<ParsedNewsletter, ParseError> {
        panic!("selector state corrupted")
    }
}

struct FailingParser;

impl NewsletterParser for FailingParser {
    fn name(&self) -> &str {
        "FailingParser"
    }

    fn source_name(&self) -> &str {
        "Fails Daily"
    }

    fn parse(&self, _message: &RawMessage) -> Result<ParsedNewsletter, ParseError> {
        Err(ParseError::MalformedMarkup("table soup".into()))
    }
}

/// Store that rejects inserts whose URL contains a marker
struct FlakyStore {
    inner: MemoryArticleStore,
    reject: &'static str,
    fail_lookups: bool,
}

impl FlakyStore {
    fn rejecting(reject: &'static str) -> Self {
        Self {
            inner: MemoryArticleStore::new(),
            reject,
            fail_lookups: false,
        }
    }

    fn unreachable() -> Self {
        Self {
            inner: MemoryArticleStore::new(),
            reject: "",
            fail_lookups: true,
        }
    }
}

impl ArticleStore for FlakyStore {
    fn exists_by_url(&self, url: &str) -> Result<bool> {
        if self.fail_lookups {
            return Err(anyhow!("connection refused"));
        }
        self.inner.exists_by_url(url)
    }

    fn exists_by_content_hash(&self, hash: &str) -> Result<bool> {
        if self.fail_lookups {
            return Err(anyhow!("connection refused"));
        }
        self.inner.exists_by_content_hash(hash)
    }

    fn insert(&self, candidate: &ArticleCandidate) -> Result<Uuid> {
        if !self.reject.is_empty() && candidate.url.as_deref().is_some_and(|u| u.contains(self.reject)) {
            return Err(anyhow!("disk full"));
        }
        self.inner.insert(candidate)
    }

    fn count(&self) -> Result<usize> {
        self.inner.count()
    }

    fn recent(&self, limit: usize) -> Result<Vec<StoredArticle>> {
        self.inner.recent(limit)
    }
}

fn registry_with(parser: Arc<dyn NewsletterParser>, domain: &str) -> ParserRegistry {
    let mut registry = ParserRegistry::with_builtin_sources().unwrap();
    registry.register(ParserRegistration::new(parser).domain(domain)).unwrap();
    registry
}

fn tldr_issue() -> RawMessage {
    create_message("good", TLDR_FROM, "TLDR AI", TLDR_HTML)
}

// ============================================================================
// Malformed Input
// ============================================================================

#[test]
fn test_garbled_message_does_not_block_batch() {
    let registry = ParserRegistry::with_builtin_sources().unwrap();
    let ingestor = Ingestor::new(&registry, Arc::new(MemoryArticleStore::new()));

    let batch = vec![
        create_message("garbled-1", MORNING_BREW_FROM, "???", GARBLED_HTML),
        tldr_issue(),
        create_message("garbled-2", TLDR_FROM, "", GARBLED_HTML),
    ];
    let report = ingestor.process_messages(&batch);

    assert_eq!(report.stats.processed, 3);
    assert!(report.stats.saved >= 1);
    assert!(report.articles.iter().any(|a| a.source_name == "TLDR"));
    assert_eq!(report.messages.len(), 3);
}

#[test]
fn test_known_sender_with_empty_issue_warns() {
    let registry = ParserRegistry::with_builtin_sources().unwrap();
    let ingestor = Ingestor::new(&registry, Arc::new(MemoryArticleStore::new()));

    let empty = RawMessage {
        id: "empty".into(),
        from: TLDR_FROM.into(),
        subject: "TLDR AI".into(),
        ..Default::default()
    };
    let report = ingestor.process_messages(&[empty]);

    assert_eq!(report.stats.errors, 0);
    assert_eq!(report.messages[0].level, LogLevel::Warn);
    assert_eq!(report.messages[0].candidates_emitted_count, 0);
}

#[test]
fn test_unknown_sender_is_not_an_error() {
    let registry = ParserRegistry::with_builtin_sources().unwrap();
    let ingestor = Ingestor::new(&registry, Arc::new(MemoryArticleStore::new()));

    let report = ingestor.process_messages(&[
        create_message("spam", "Deals <deals@shop.example>", "50% off", "<a href='https://shop.example/deal'>Huge savings today only</a>"),
        create_message("nobody", "", "", ""),
    ]);

    assert_eq!(report.stats.errors, 0);
    assert_eq!(report.stats.saved, 0);
    assert!(report.messages.iter().all(|m| m.level == LogLevel::Info && m.parser_name.is_none()));
}

// ============================================================================
// Parser Failures
// ============================================================================

#[test]
fn test_panicking_parser_is_contained() {
    let registry = registry_with(Arc::new(PanickingParser), "panics.example");
    let ingestor = Ingestor::new(&registry, Arc::new(MemoryArticleStore::new()));

    let report = ingestor.process_messages(&[
        create_message("p1", "news@panics.example", "Issue 1", "<p>anything</p>"),
        tldr_issue(),
    ]);

    assert_eq!(report.stats.errors, 1);
    assert_eq!(report.stats.saved, 4);
    assert_eq!(report.messages[0].level, LogLevel::Error);
    assert_eq!(report.messages[0].parser_name.as_deref(), Some("PanickingParser"));
    assert!(report.messages[0].errors[0].contains("panicked"));
}

#[test]
fn test_parser_error_is_counted() {
    let registry = registry_with(Arc::new(FailingParser), "fails.example");
    let ingestor = Ingestor::new(&registry, Arc::new(MemoryArticleStore::new()));

    let report = ingestor.process_messages(&[
        tldr_issue(),
        create_message("f1", "news@fails.example", "Issue 1", "<p>anything</p>"),
    ]);

    assert_eq!(report.stats.errors, 1);
    assert_eq!(report.stats.saved, 4);
    assert!(report.messages[1].errors[0].contains("table soup"));
    assert_eq!(report.messages[0].level, LogLevel::Info);
}

// ============================================================================
// Store Failures
// ============================================================================

#[test]
fn test_insert_failure_is_isolated_per_candidate() {
    let registry = ParserRegistry::with_builtin_sources().unwrap();
    let store = Arc::new(FlakyStore::rejecting("arxiv.org"));
    let ingestor = Ingestor::new(&registry, store.clone());

    let report = ingestor.process_messages(&[tldr_issue()]);

    assert_eq!(report.stats.errors, 1);
    assert_eq!(report.stats.saved, 3);
    assert_eq!(store.count().unwrap(), 3);

    let log = &report.messages[0];
    assert_eq!(log.level, LogLevel::Error);
    assert_eq!(log.errors.len(), 1);
    assert!(log.errors[0].contains("Storage error"));
    assert!(log.errors[0].contains("disk full"));
}

#[test]
fn test_unreachable_store_counts_every_candidate() {
    let registry = ParserRegistry::with_builtin_sources().unwrap();
    let ingestor = Ingestor::new(&registry, Arc::new(FlakyStore::unreachable()));

    let report = ingestor.process_messages(&[tldr_issue()]);

    assert_eq!(report.stats.saved, 0);
    assert_eq!(report.stats.errors, 4);
    assert!(report.articles.is_empty());
}
