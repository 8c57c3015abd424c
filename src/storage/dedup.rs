//! Batch deduplication of article candidates
//!
//! Candidates from every message in a batch are collapsed on their
//! canonical URL before anything reaches storage:
//! - First-seen wins, input order is preserved
//! - URL-less inline candidates are always kept
//! - Cross-run duplicates are handled later by the store's existence checks

use std::collections::HashSet;

use crate::canonical::normalize_url;
use crate::models::ArticleCandidate;

// ============================================================================
// Deduplication Result
// ============================================================================

/// Result of deduplicating a batch
#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    /// Candidates that survived, in input order
    pub kept: Vec<ArticleCandidate>,

    /// Number of candidates dropped as duplicates
    pub dropped: usize,
}

impl DedupOutcome {
    /// Total candidates examined
    pub fn total(&self) -> usize {
        self.kept.len() + self.dropped
    }

    /// Share of candidates dropped (0.0 - 1.0)
    pub fn dedup_ratio(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.dropped as f64 / total as f64
    }
}

// ============================================================================
// Deduplication
// ============================================================================

/// Keep the first candidate per canonical URL
///
/// The key is [`normalize_url`], so URLs that differ only by tracking
/// parameters, scheme, host case, `www.` or a trailing slash collapse into
/// one. Candidates without a URL are exempt and always kept.
///
/// # Examples
///
/// ```
/// use mailbrief::models::ArticleCandidate;
/// use mailbrief::storage::dedup::deduplicate_candidates_by_url;
///
/// let outcome = deduplicate_candidates_by_url(vec![
///     ArticleCandidate::link("First title here", "https://example.com/a?utm_source=x", "TLDR"),
///     ArticleCandidate::link("Second title here", "https://example.com/a", "Hacker Newsletter"),
/// ]);
/// assert_eq!(outcome.kept.len(), 1);
/// assert_eq!(outcome.kept[0].source_name, "TLDR");
/// assert_eq!(outcome.dropped, 1);
/// ```
pub fn deduplicate_candidates_by_url(candidates: Vec<ArticleCandidate>) -> DedupOutcome {
    let (kept, dropped) = dedup_by_canonical_url(candidates, |candidate| candidate);
    DedupOutcome { kept, dropped }
}

/// Same policy over any item that wraps a candidate
///
/// Lets callers carry bookkeeping (such as the originating message index)
/// through deduplication. Returns the kept items and the drop count.
pub fn dedup_by_canonical_url<T, F>(items: Vec<T>, candidate_of: F) -> (Vec<T>, usize)
where
    F: Fn(&T) -> &ArticleCandidate,
{
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(items.len());
    let mut dropped = 0;

    for item in items {
        let candidate = candidate_of(&item);
        let key = candidate
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(normalize_url);

        match key {
            Some(key) if !seen.insert(key.clone()) => {
                tracing::debug!(
                    title = %candidate.title,
                    source = %candidate.source_name,
                    key = %key,
                    "Dropping duplicate candidate"
                );
                dropped += 1;
            }
            _ => kept.push(item),
        }
    }

    (kept, dropped)
}
