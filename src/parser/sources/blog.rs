//! Blog-style parser (The Pragmatic Engineer and other hosted newsletters)
//!
//! A blog-style issue is one long post. External links in the body become
//! candidates; when none qualify, the post itself is the candidate.

use url::Url;

use crate::canonical::canonicalize;
use crate::models::{ArticleCandidate, ParsedNewsletter, RawMessage};
use crate::parser::extract::extract_links;
use crate::parser::filters::{is_noise_url, is_valid_title, LinkPolicy};
use crate::parser::html::EmailDocument;
use crate::parser::{published_date, NewsletterParser};
use crate::utils::error::ParseError;
use crate::utils::host_matches;

/// Display name of the built-in blog source
pub const PRAGMATIC_ENGINEER_SOURCE: &str = "The Pragmatic Engineer";

/// Web host the Pragmatic Engineer posts live on
pub const PRAGMATIC_ENGINEER_HOST: &str = "newsletter.pragmaticengineer.com";

/// Publishing platforms whose links are chrome, not articles
const PLATFORM_HOSTS: &[&str] = &["substack.com", "substackcdn.com", "ghost.io", "beehiiv.com"];

/// Parser for blog-style newsletters
pub struct BlogParser {
    source_name: String,
    post_host: Option<String>,
    policy: LinkPolicy,
}

impl BlogParser {
    pub fn new(source_name: &str, post_host: Option<&str>) -> Self {
        let post_host = post_host
            .map(|h| h.trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty());

        let mut policy = LinkPolicy::new(10).infer_generic_titles();
        if let Some(host) = &post_host {
            policy = policy.exclude_host(host);
        }
        for host in PLATFORM_HOSTS {
            policy = policy.exclude_host(host);
        }

        Self {
            source_name: source_name.to_string(),
            post_host,
            policy,
        }
    }

    /// Link to the post itself: exactly `/p/<slug>` on the post host or a platform host
    ///
    /// Comment, share and app links hang off the same slug, so deeper paths,
    /// meaningful query parameters and denylisted link text are skipped.
    fn post_link(&self, document: &EmailDocument) -> Option<String> {
        document
            .links()
            .into_iter()
            .filter(|seed| !is_noise_url(&seed.href) && !self.policy.is_excluded_text(&seed.text))
            .map(|seed| seed.href)
            .find(|href| self.is_post_url(href))
    }

    fn is_post_url(&self, href: &str) -> bool {
        let Ok(url) = Url::parse(&canonicalize(href)) else {
            return false;
        };
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        let own_host = self
            .post_host
            .as_deref()
            .is_some_and(|post_host| host_matches(&host, post_host))
            || PLATFORM_HOSTS.iter().any(|p| host_matches(&host, p));

        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        own_host && url.query().is_none() && matches!(segments.as_slice(), ["p", slug] if !slug.is_empty())
    }

    fn post_candidate(&self, document: &EmailDocument, subject: &str) -> Option<ArticleCandidate> {
        let url = self.post_link(document)?;

        let (title, inferred) = match document.post_title().filter(|t| is_valid_title(t)) {
            Some(title) => (title, None),
            None if is_valid_title(subject) => (subject.trim().to_string(), Some(true)),
            None => return None,
        };

        let mut candidate = ArticleCandidate::link(title, url, &self.source_name);
        candidate.title_inferred = inferred;
        Some(candidate)
    }
}

impl Default for BlogParser {
    fn default() -> Self {
        Self::new(PRAGMATIC_ENGINEER_SOURCE, Some(PRAGMATIC_ENGINEER_HOST))
    }
}

impl NewsletterParser for BlogParser {
    fn name(&self) -> &str {
        "BlogParser"
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

        if parsed.candidates.is_empty() {
            parsed.candidates.extend(self.post_candidate(&document, &message.subject));
        }

        Ok(parsed)
    }
}
