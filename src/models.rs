// Core data structures for the mailbrief ingestion pipeline

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::content_hash;

/// Raw email record as supplied by the mail collaborator
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub subject: String,
    pub from: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub html_body: Option<String>,
    #[serde(default)]
    pub text_body: Option<String>,
}

impl RawMessage {
    /// Create a message with an HTML body
    pub fn html(id: &str, from: &str, subject: &str, date: &str, html: &str) -> Self {
        Self {
            id: id.to_string(),
            thread_id: id.to_string(),
            subject: subject.to_string(),
            from: from.to_string(),
            date: date.to_string(),
            html_body: Some(html.to_string()),
            text_body: None,
        }
    }
}

/// How an article candidate was sourced from the email
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Referenced by URL; body comes from a later scraping stage
    EmailLinks,
    /// Full text taken from the email body
    EmailInline,
}

impl ExtractionMethod {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmailLinks => "email_links",
            Self::EmailInline => "email_inline",
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalized, pre-persistence article record emitted by every parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleCandidate {
    pub title: String,
    pub url: Option<String>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub source_name: String,
    pub extraction_method: ExtractionMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_inferred: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newsletter_date: Option<NaiveDate>,
}

impl ArticleCandidate {
    /// Create a link-based candidate
    pub fn link(title: impl Into<String>, url: impl Into<String>, source_name: &str) -> Self {
        Self {
            title: title.into(),
            url: Some(url.into()),
            summary: String::new(),
            content: None,
            source_name: source_name.to_string(),
            extraction_method: ExtractionMethod::EmailLinks,
            reading_time: None,
            section: None,
            title_inferred: None,
            newsletter_date: None,
        }
    }

    /// Create an inline candidate carrying the article body
    pub fn inline(title: impl Into<String>, content: impl Into<String>, source_name: &str) -> Self {
        Self {
            title: title.into(),
            url: None,
            summary: String::new(),
            content: Some(content.into()),
            source_name: source_name.to_string(),
            extraction_method: ExtractionMethod::EmailInline,
            reading_time: None,
            section: None,
            title_inferred: None,
            newsletter_date: None,
        }
    }

    /// Whether the candidate satisfies the extraction-method invariant
    ///
    /// Link candidates need a non-empty URL, inline candidates non-empty
    /// content, and every candidate a non-empty title.
    pub fn is_emittable(&self) -> bool {
        if self.title.trim().is_empty() {
            return false;
        }
        match self.extraction_method {
            ExtractionMethod::EmailLinks => self
                .url
                .as_deref()
                .is_some_and(|url| !url.trim().is_empty()),
            ExtractionMethod::EmailInline => self
                .content
                .as_deref()
                .is_some_and(|content| !content.trim().is_empty()),
        }
    }

    /// SHA-256 of the inline content, used to recognize URL-less articles
    pub fn content_hash(&self) -> Option<String> {
        self.content.as_deref().map(content_hash)
    }
}

/// Per-message parser output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedNewsletter {
    pub newsletter_source: String,
    pub email_subject: String,
    pub published_at: NaiveDate,
    pub candidates: Vec<ArticleCandidate>,
}

impl ParsedNewsletter {
    /// Create an empty result for a message
    pub fn empty(source_name: &str, message: &RawMessage, published_at: NaiveDate) -> Self {
        Self {
            newsletter_source: source_name.to_string(),
            email_subject: message.subject.clone(),
            published_at,
            candidates: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_candidate_is_emittable() {
        let candidate = ArticleCandidate::link("A long enough title", "https://example.com/a", "TLDR");
        assert!(candidate.is_emittable());
        assert_eq!(candidate.extraction_method, ExtractionMethod::EmailLinks);
    }

    #[test]
    fn test_link_candidate_without_url_is_rejected() {
        let mut candidate = ArticleCandidate::link("A long enough title", "", "TLDR");
        assert!(!candidate.is_emittable());
        candidate.url = None;
        assert!(!candidate.is_emittable());
    }

    #[test]
    fn test_inline_candidate_requires_content() {
        let candidate = ArticleCandidate::inline("Markets rally on Friday", "   ", "Morning Brew");
        assert!(!candidate.is_emittable());

        let candidate = ArticleCandidate::inline("Markets rally on Friday", "Stocks rose.", "Morning Brew");
        assert!(candidate.is_emittable());
        assert!(candidate.url.is_none());
    }

    #[test]
    fn test_extraction_method_serde() {
        let json = serde_json::to_string(&ExtractionMethod::EmailInline).unwrap();
        assert_eq!(json, "\"email_inline\"");
        assert_eq!(ExtractionMethod::EmailLinks.to_string(), "email_links");
    }

    #[test]
    fn test_raw_message_camel_case() {
        let json = r#"{"id":"m1","threadId":"t1","subject":"Hi","from":"a@b.com","date":"","htmlBody":"<p>x</p>"}"#;
        let message: RawMessage = serde_json::from_str(json).unwrap();
        assert_eq!(message.thread_id, "t1");
        assert_eq!(message.html_body.as_deref(), Some("<p>x</p>"));
        assert!(message.text_body.is_none());
    }

    #[test]
    fn test_candidate_serializes_newsletter_date() {
        let mut candidate = ArticleCandidate::link("A long enough title", "https://example.com/a", "TLDR");
        candidate.newsletter_date = NaiveDate::from_ymd_opt(2025, 1, 6);
        let json = serde_json::to_value(&candidate).unwrap();
        assert_eq!(json["newsletter_date"], "2025-01-06");
        assert!(json.get("content").is_none());
    }

    #[test]
    fn test_content_hash_only_for_inline() {
        let link = ArticleCandidate::link("A long enough title", "https://example.com/a", "TLDR");
        assert!(link.content_hash().is_none());

        let inline = ArticleCandidate::inline("Markets rally on Friday", "Stocks rose.", "Morning Brew");
        assert_eq!(inline.content_hash().map(|h| h.len()), Some(64));
    }
}
