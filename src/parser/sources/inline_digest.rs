//! Inline digest parser (Morning Brew)
//!
//! Digest newsletters carry full story bodies in the email. Each story block
//! becomes an inline candidate; an outbound link inside the block is kept as
//! an optional reference.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::{ParsedNewsletter, RawMessage};
use crate::parser::extract::extract_inline;
use crate::parser::filters::LinkPolicy;
use crate::parser::html::EmailDocument;
use crate::parser::{published_date, NewsletterParser};
use crate::utils::error::ParseError;

/// Display name of the built-in inline source
pub const MORNING_BREW_SOURCE: &str = "Morning Brew";

static HOUSE_LINKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)morningbrew\.com/(refer|shop|jobs|advertise|daily/r)").unwrap()
});

/// Parser for digests with inline article bodies
pub struct InlineDigestParser {
    source_name: String,
    policy: LinkPolicy,
}

impl InlineDigestParser {
    pub fn new(source_name: &str) -> Self {
        Self {
            source_name: source_name.to_string(),
            policy: LinkPolicy::default().exclude_url_pattern(HOUSE_LINKS.clone()),
        }
    }
}

impl Default for InlineDigestParser {
    fn default() -> Self {
        Self::new(MORNING_BREW_SOURCE)
    }
}

impl NewsletterParser for InlineDigestParser {
    fn name(&self) -> &str {
        "InlineDigestParser"
    }

    fn source_name(&self) -> &str {
        &self.source_name
    }

    fn parse(&self, message: &RawMessage) -> Result<ParsedNewsletter, ParseError> {
        let mut parsed = ParsedNewsletter::empty(&self.source_name, message, published_date(&message.date));

        let Some(document) = EmailDocument::from_message(message) else {
            return Ok(parsed);
        };

        parsed.candidates = extract_inline(&document, &self.policy, &self.source_name, &message.subject);
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExtractionMethod;

    #[test]
    fn test_plain_text_digest_falls_back_to_body() {
        let message = RawMessage {
            id: "b1".into(),
            from: "crew@morningbrew.com".into(),
            subject: "Markets end the week on a high".into(),
            date: "2025-01-10".into(),
            text_body: Some("Stocks rose on Friday.\nBonds were flat.".into()),
            ..Default::default()
        };
        let parsed = InlineDigestParser::default().parse(&message).unwrap();

        assert_eq!(parsed.candidates.len(), 1);
        let candidate = &parsed.candidates[0];
        assert_eq!(candidate.extraction_method, ExtractionMethod::EmailInline);
        assert_eq!(candidate.title, "Markets end the week on a high");
        assert_eq!(candidate.title_inferred, Some(true));
        assert_eq!(candidate.content.as_deref(), Some("Stocks rose on Friday.\n\nBonds were flat."));
    }

    #[test]
    fn test_house_links_not_attached() {
        let body = "Apple is reportedly working on a foldable iPad with a screen nearly as large as a MacBook. \
                    The device could launch as soon as 2028.";
        let html = format!(
            r#"<body><div><h2>Apple folds</h2><p>{body}</p>
               <a href="https://www.morningbrew.com/refer?kid=1">Share the Brew</a></div></body>"#
        );
        let message = RawMessage::html("b2", "crew@morningbrew.com", "Apple folds", "", &html);
        let parsed = InlineDigestParser::default().parse(&message).unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        assert!(parsed.candidates[0].url.is_none());
    }
}
