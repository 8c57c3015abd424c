//! Link-aggregator parser (TLDR newsletters)
//!
//! TLDR issues list stories as `Title (N minute read)` links wrapped in
//! tracking redirects, each followed by a short description span and grouped
//! under section headings.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::{ParsedNewsletter, RawMessage};
use crate::parser::extract::extract_links;
use crate::parser::filters::{LinkPolicy, SectionSource};
use crate::parser::html::EmailDocument;
use crate::parser::{published_date, NewsletterParser};
use crate::utils::error::ParseError;

/// Display name of the built-in TLDR source
pub const TLDR_SOURCE: &str = "TLDR";

static MASTHEAD_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*tldr(\s+(ai|tech|web ?dev|infosec|devops|product|founders|design|marketing|crypto|it|data|fintech))?\s*$")
        .unwrap()
});

static HOUSE_LINKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(ashbyhq\.com|sparklp\.co|/jobs\b|refer\.)").unwrap());

/// Parser for link aggregators with tracking redirects
pub struct TldrParser {
    source_name: String,
    policy: LinkPolicy,
}

impl TldrParser {
    pub fn new(source_name: &str) -> Self {
        let policy = LinkPolicy::new(10)
            .decode_redirects()
            .reading_time_titles()
            .section_source(SectionSource::NearestHeading)
            .exclude_host("tldrnewsletter.com")
            .exclude_host("tldr.tech")
            .exclude_url_pattern(HOUSE_LINKS.clone())
            .exclude_text_pattern(MASTHEAD_TEXT.clone());

        Self {
            source_name: source_name.to_string(),
            policy,
        }
    }
}

impl Default for TldrParser {
    fn default() -> Self {
        Self::new(TLDR_SOURCE)
    }
}

impl NewsletterParser for TldrParser {
    fn name(&self) -> &str {
        "TldrParser"
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
