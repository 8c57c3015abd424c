//! Newsletter email parsing and candidate extraction
//!
//! This module turns raw newsletter messages into article candidates. Each
//! newsletter source gets one [`NewsletterParser`] implementation under
//! [`sources`]; the shared extraction rules (body selection, noise stripping,
//! link discovery, exclusion, title inference, descriptions and inline blocks)
//! live in [`html`], [`filters`] and [`extract`].

pub mod extract;
pub mod filters;
pub mod html;
pub mod sanitize;
pub mod selectors;
pub mod sources;

// Re-export main parser types
pub use filters::{LinkPolicy, SectionSource};
pub use html::EmailDocument;
pub use sources::{BlogParser, InlineDigestParser, ParserKind, SectionedParser, TldrParser};

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{ParsedNewsletter, RawMessage};
use crate::utils::error::ParseError;

/// Capability shared by every per-source parser
///
/// Implementations are stateless and shared across threads behind `Arc`.
/// The built-in parsers never return `Err` or panic on malformed or empty
/// input: a message without usable body content yields zero candidates.
pub trait NewsletterParser: Send + Sync {
    /// Parser identifier used in logs
    fn name(&self) -> &str;

    /// Display name of the newsletter this parser handles
    fn source_name(&self) -> &str;

    /// Extract article candidates from one message
    fn parse(&self, message: &RawMessage) -> Result<ParsedNewsletter, ParseError>;
}

impl std::fmt::Debug for dyn NewsletterParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsletterParser")
            .field("name", &self.name())
            .field("source_name", &self.source_name())
            .finish()
    }
}

/// Parse a message Date header into a calendar date (UTC)
///
/// Accepts RFC 2822 (with or without a trailing `(UTC)`-style comment),
/// RFC 3339 and plain `YYYY-MM-DD`.
pub fn parse_message_date(date_str: &str) -> Option<NaiveDate> {
    let date_str = date_str.trim();
    if date_str.is_empty() {
        return None;
    }

    let without_comment = date_str
        .split_once(" (")
        .map_or(date_str, |(head, _)| head)
        .trim();

    if let Ok(dt) = DateTime::parse_from_rfc2822(without_comment) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    NaiveDate::parse_from_str(date_str.get(..10).unwrap_or(date_str), "%Y-%m-%d").ok()
}

/// Publication date of a message, defaulting to today's date when unparseable
pub fn published_date(date_str: &str) -> NaiveDate {
    parse_message_date(date_str).unwrap_or_else(|| {
        tracing::debug!(date = %date_str, "Unparseable message date, using processing date");
        Utc::now().date_naive()
    })
}
