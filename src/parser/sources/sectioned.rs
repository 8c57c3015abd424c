//! Section-structured parser (Hacker Newsletter)
//!
//! Hacker Newsletter groups links under `#Section` headings. Items often pair
//! a story link with a comment-count link, and some link texts are too generic
//! to title an article, in which case the item heading is used.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::{ParsedNewsletter, RawMessage};
use crate::parser::extract::extract_links;
use crate::parser::filters::{LinkPolicy, SectionSource};
use crate::parser::html::EmailDocument;
use crate::parser::{published_date, NewsletterParser};
use crate::utils::error::ParseError;

/// Display name of the built-in sectioned source
pub const HACKER_NEWSLETTER_SOURCE: &str = "Hacker Newsletter";

static COMMENT_COUNT_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*\(?\s*(\d[\d,]*\s+)?(comments?|discuss(ion)?|points?)\s*\)?\s*$").unwrap()
});

/// Parser for section-structured link newsletters
pub struct SectionedParser {
    source_name: String,
    policy: LinkPolicy,
}

impl SectionedParser {
    pub fn new(source_name: &str) -> Self {
        let policy = LinkPolicy::new(3)
            .infer_generic_titles()
            .section_source(SectionSource::SectionHeading)
            .exclude_host("hackernewsletter.com")
            .exclude_text_pattern(COMMENT_COUNT_TEXT.clone());

        Self {
            source_name: source_name.to_string(),
            policy,
        }
    }
}

impl Default for SectionedParser {
    fn default() -> Self {
        Self::new(HACKER_NEWSLETTER_SOURCE)
    }
}

impl NewsletterParser for SectionedParser {
    fn name(&self) -> &str {
        "SectionedParser"
    }

    fn source_name(&self) -> &str {
        &self.source_name
    }

    fn parse(&self, message: &RawMessage) -> Result<ParsedNewsletter, ParseError> {
        let mut parsed = ParsedNewsletter::empty(&self.source_name, message, published_date(&message.date));

        let Some(document) = EmailDocument::from_message(message) else {
            return Ok(parsed);
        };

        parsed.candidates = extract_links(&document, &self.policy, &self.source_name, &message.subject);
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_and_comment_links() {
        let html = r#"<body>
            <h2>#Favorites</h2>
            <p><a href="https://example.com/sqlite-everywhere">SQLite is all you need</a>
               <a href="https://news.ycombinator.com/item?id=1">312 comments</a></p>
            <h2>#Programming</h2>
            <h4>A new approach to Rust async runtimes</h4>
            <p><a href="https://example.com/async">link</a>
               <a href="https://news.ycombinator.com/item?id=2">comments</a></p>
            <p><a href="https://hackernewsletter.com/archive">Archive</a></p>
        </body>"#;
        let message = RawMessage::html(
            "h1",
            "Kale <kale@hackernewsletter.com>",
            "Hacker Newsletter #730",
            "Fri, 10 Jan 2025 13:00:00 +0000",
            html,
        );
        let parsed = SectionedParser::default().parse(&message).unwrap();

        assert_eq!(parsed.candidates.len(), 2);
        assert_eq!(parsed.candidates[0].title, "SQLite is all you need");
        assert_eq!(parsed.candidates[0].section.as_deref(), Some("#Favorites"));
        assert_eq!(parsed.candidates[1].title, "A new approach to Rust async runtimes");
        assert_eq!(parsed.candidates[1].title_inferred, Some(true));
        assert_eq!(parsed.candidates[1].section.as_deref(), Some("#Programming"));
    }
}
