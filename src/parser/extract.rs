//! Candidate assembly shared by the per-source parsers
//!
//! Link-based sources run [`extract_links`] with their [`LinkPolicy`];
//! inline sources run [`extract_inline`]. Both apply the title validity gate
//! and never emit a candidate that breaks the extraction-method invariant.

use std::collections::HashSet;

use crate::canonical::resolve_tracking_url;
use crate::models::ArticleCandidate;
use crate::parser::filters::{
    is_boilerplate_content, is_boilerplate_title, is_generic_text, is_valid_title, LinkPolicy,
    SectionSource,
};
use crate::parser::html::{split_reading_time, EmailDocument, MIN_BLOCK_CONTENT_CHARS};
use crate::parser::sanitize::{strip_sponsor_phrases, truncate, truncate_at_sentence};

/// Maximum description length for link candidates
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Length of the synthesized summary for inline candidates
pub const INLINE_SUMMARY_CHARS: usize = 300;

/// Build link candidates from every qualifying anchor in the document
pub fn extract_links(
    document: &EmailDocument,
    policy: &LinkPolicy,
    source_name: &str,
    subject: &str,
) -> Vec<ArticleCandidate> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for seed in document.links() {
        let target = if policy.decode_redirects {
            resolve_tracking_url(&seed.href)
        } else {
            seed.href.clone()
        };

        if policy.is_excluded_url(&target) || policy.is_excluded_text(&seed.text) {
            continue;
        }

        let key = target.to_lowercase();
        if seen.contains(&key) {
            continue;
        }

        let (mut title, reading_time) = if policy.reading_time_titles {
            split_reading_time(&seed.text)
        } else {
            (seed.text.clone(), None)
        };

        let mut title_inferred = None;
        if is_generic_text(&title) || title.chars().count() < policy.min_text_len {
            if !policy.infer_generic_titles {
                continue;
            }
            let Some(inferred) = seed
                .heading
                .clone()
                .filter(|h| is_valid_title(h))
                .or_else(|| Some(subject.trim().to_string()).filter(|s| !s.is_empty()))
            else {
                continue;
            };
            title = inferred;
            title_inferred = Some(true);
        }

        if !is_valid_title(&title) {
            tracing::trace!(title = %title, url = %target, "Rejected by title gate");
            continue;
        }

        let summary = document
            .description_after(seed.element)
            .map(|text| describe(&text))
            .filter(|text| !text.is_empty() && *text != title)
            .unwrap_or_default();

        let section = match policy.section_source {
            SectionSource::None => None,
            SectionSource::NearestHeading => seed.heading.clone(),
            SectionSource::SectionHeading => seed.section.clone(),
        }
        .filter(|section| *section != title);

        seen.insert(key);
        let mut candidate = ArticleCandidate::link(title, target, source_name);
        candidate.summary = summary;
        candidate.reading_time = reading_time;
        candidate.section = section;
        candidate.title_inferred = title_inferred;
        candidates.push(candidate);
    }

    candidates
}

/// Clean a description block: sponsor phrases out, bounded at a sentence
pub fn describe(text: &str) -> String {
    truncate_at_sentence(&strip_sponsor_phrases(text), MAX_DESCRIPTION_CHARS)
}

/// Build inline candidates from the document's story blocks
///
/// Falls back to one candidate for the whole body when no story block is
/// found, titled by the first heading, then the subject, then `"<source> digest"`.
pub fn extract_inline(
    document: &EmailDocument,
    policy: &LinkPolicy,
    source_name: &str,
    subject: &str,
) -> Vec<ArticleCandidate> {
    let blocks = document.content_blocks();

    if blocks.is_empty() {
        return inline_fallback(document, source_name, subject)
            .into_iter()
            .collect();
    }

    let mut seen_titles = HashSet::new();
    let mut seen_contents = HashSet::new();
    let mut candidates = Vec::new();

    for block in blocks {
        if is_boilerplate_title(&block.title)
            || is_boilerplate_content(&block.content)
            || block.content.chars().count() < MIN_BLOCK_CONTENT_CHARS
            || !is_valid_title(&block.title)
        {
            continue;
        }

        if !seen_titles.insert(block.title.to_lowercase()) || !seen_contents.insert(block.content.clone()) {
            continue;
        }

        let url = block
            .links
            .iter()
            .map(|href| resolve_tracking_url(href))
            .find(|href| !policy.is_excluded_url(href));

        let mut candidate = ArticleCandidate::inline(block.title, block.content, source_name);
        candidate.summary = summarize(candidate.content.as_deref().unwrap_or_default());
        candidate.url = url;
        candidates.push(candidate);
    }

    candidates
}

fn inline_fallback(
    document: &EmailDocument,
    source_name: &str,
    subject: &str,
) -> Option<ArticleCandidate> {
    let (heading, content) = document.digest();
    if content.trim().is_empty() {
        return None;
    }

    let (title, inferred) = match heading.filter(|h| is_valid_title(h)) {
        Some(heading) => (heading, None),
        None if is_valid_title(subject) => (subject.trim().to_string(), Some(true)),
        None => (format!("{source_name} digest"), Some(true)),
    };

    let mut candidate = ArticleCandidate::inline(title, content, source_name);
    candidate.summary = summarize(candidate.content.as_deref().unwrap_or_default());
    candidate.title_inferred = inferred;
    Some(candidate)
}

fn summarize(content: &str) -> String {
    let first_lines = content.split("\n\n").collect::<Vec<_>>().join(" ");
    truncate(&first_lines, INLINE_SUMMARY_CHARS)
}
