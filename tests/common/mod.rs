//! Common test utilities

use std::sync::Arc;

use mailbrief::models::RawMessage;
use mailbrief::parser::{BlogParser, InlineDigestParser, NewsletterParser, SectionedParser, TldrParser};

pub const TLDR_FROM: &str = "TLDR AI <dan@tldrnewsletter.com>";
pub const PRAGMATIC_FROM: &str = "The Pragmatic Engineer <pragmaticengineer@substack.com>";
pub const HACKER_NEWSLETTER_FROM: &str = "Hacker Newsletter <kale@hackernewsletter.com>";
pub const MORNING_BREW_FROM: &str = "Morning Brew <crew@morningbrew.com>";

pub const TLDR_HTML: &str = include_str!("../fixtures/html/tldr.html");
pub const PRAGMATIC_HTML: &str = include_str!("../fixtures/html/pragmatic.html");
pub const HACKER_NEWSLETTER_HTML: &str = include_str!("../fixtures/html/hacker_newsletter.html");
pub const MORNING_BREW_HTML: &str = include_str!("../fixtures/html/morning_brew.html");
pub const GARBLED_HTML: &str = include_str!("../fixtures/html/garbled.html");

/// Create a newsletter message dated 2025-01-06
pub fn create_message(id: &str, from: &str, subject: &str, html: &str) -> RawMessage {
    RawMessage::html(id, from, subject, "Mon, 06 Jan 2025 13:05:00 +0000", html)
}

/// One message per built-in source, each carrying its fixture
#[allow(dead_code)]
pub fn four_source_batch() -> Vec<RawMessage> {
    vec![
        create_message("tldr-1", TLDR_FROM, "Nvidia RTX 50, o3-mini system card", TLDR_HTML),
        create_message("pe-1", PRAGMATIC_FROM, "The Pulse #120: Meta cuts, AWS outage", PRAGMATIC_HTML),
        create_message("hn-1", HACKER_NEWSLETTER_FROM, "Hacker Newsletter #730", HACKER_NEWSLETTER_HTML),
        create_message("mb-1", MORNING_BREW_FROM, "☕ Cooler inflation", MORNING_BREW_HTML),
    ]
}

/// Every built-in parser with its fixture
#[allow(dead_code)]
pub fn parsers_with_fixtures() -> Vec<(Arc<dyn NewsletterParser>, &'static str)> {
    vec![
        (Arc::new(TldrParser::default()), TLDR_HTML),
        (Arc::new(BlogParser::default()), PRAGMATIC_HTML),
        (Arc::new(SectionedParser::default()), HACKER_NEWSLETTER_HTML),
        (Arc::new(InlineDigestParser::default()), MORNING_BREW_HTML),
    ]
}

/// Every built-in parser
#[allow(dead_code)]
pub fn all_parsers() -> Vec<Arc<dyn NewsletterParser>> {
    parsers_with_fixtures().into_iter().map(|(parser, _)| parser).collect()
}
