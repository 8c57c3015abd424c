//! Sender-to-parser routing
//!
//! The [`ParserRegistry`] maps an inbound `From` header to the parser
//! responsible for that newsletter. Exact sender addresses win over domain
//! patterns; within each tier registrations are checked in registration
//! order and the first match wins.
//!
//! The registry is an explicit value built at startup and passed by reference
//! to the [`crate::ingest::Ingestor`]; there is no global instance.

use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, LazyLock};

use crate::parser::sources::blog::PRAGMATIC_ENGINEER_HOST;
use crate::parser::{BlogParser, InlineDigestParser, NewsletterParser, SectionedParser, TldrParser};
use crate::utils::error::RegistryError;
use crate::utils::host_matches;

/// Shared email platforms: routing on these domains would capture unrelated senders
pub const BROAD_PLATFORM_DOMAINS: &[&str] = &[
    "substack.com",
    "beehiiv.com",
    "ghost.io",
    "mailchimp.com",
    "mcsv.net",
    "convertkit.com",
    "buttondown.email",
    "revue.co",
    "gmail.com",
    "googlemail.com",
    "outlook.com",
    "hotmail.com",
    "yahoo.com",
    "icloud.com",
    "proton.me",
];

static ANGLE_ADDRESS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<\s*([^<>\s]+@[^<>\s]+)\s*>").unwrap());

// Quoted display names may themselves contain `<address>` text
static QUOTED_STRING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""(?:[^"\\]|\\.)*""#).unwrap());

/// How a sender matched its registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Sender address equals a registered address
    Exact,
    /// Sender domain equals, or is a subdomain of, a registered domain
    Domain,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Domain => "domain",
        }
    }
}

/// Routing rules for one parser
#[derive(Debug, Clone)]
pub struct ParserRegistration {
    pub parser: Arc<dyn NewsletterParser>,
    pub email_patterns: Vec<String>,
    pub domain_patterns: Vec<String>,
}

impl ParserRegistration {
    pub fn new(parser: Arc<dyn NewsletterParser>) -> Self {
        Self {
            parser,
            email_patterns: Vec::new(),
            domain_patterns: Vec::new(),
        }
    }

    /// Route an exact sender address to this parser
    #[must_use]
    pub fn email(mut self, address: &str) -> Self {
        self.email_patterns.push(address.to_string());
        self
    }

    /// Route a sender domain (and its subdomains) to this parser
    #[must_use]
    pub fn domain(mut self, domain: &str) -> Self {
        self.domain_patterns.push(domain.to_string());
        self
    }
}

/// Successful routing result
#[derive(Debug, Clone)]
pub struct ParserMatch {
    pub parser: Arc<dyn NewsletterParser>,
    /// Display name of the matched newsletter source
    pub source: String,
    pub match_type: MatchType,
}

/// Registration summary for listing
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationInfo {
    pub source: String,
    pub parser: String,
    pub email_patterns: Vec<String>,
    pub domain_patterns: Vec<String>,
}

/// Registry of per-sender parsers
#[derive(Debug, Default)]
pub struct ParserRegistry {
    registrations: Vec<ParserRegistration>,
}

impl ParserRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in newsletter sources
    pub fn with_builtin_sources() -> Result<Self, RegistryError> {
        let mut registry = Self::new();

        registry.register(ParserRegistration::new(Arc::new(TldrParser::default())).domain("tldrnewsletter.com"))?;
        registry.register(
            ParserRegistration::new(Arc::new(BlogParser::default()))
                .email("pragmaticengineer@substack.com")
                .domain(PRAGMATIC_ENGINEER_HOST),
        )?;
        registry.register(
            ParserRegistration::new(Arc::new(SectionedParser::default())).domain("hackernewsletter.com"),
        )?;
        registry.register(ParserRegistration::new(Arc::new(InlineDigestParser::default())).domain("morningbrew.com"))?;

        Ok(registry)
    }

    /// Add a registration after validating and normalizing its patterns
    ///
    /// # Errors
    ///
    /// - [`RegistryError::NoPatterns`] when the registration routes nothing
    /// - [`RegistryError::InvalidPattern`] for empty or malformed patterns
    /// - [`RegistryError::BroadDomain`] for shared email-platform domains
    pub fn register(&mut self, registration: ParserRegistration) -> Result<(), RegistryError> {
        let source = registration.parser.source_name().to_string();

        if registration.email_patterns.is_empty() && registration.domain_patterns.is_empty() {
            return Err(RegistryError::NoPatterns(source));
        }

        let email_patterns = registration
            .email_patterns
            .iter()
            .map(|pattern| normalize_email_pattern(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        let domain_patterns = registration
            .domain_patterns
            .iter()
            .map(|pattern| normalize_domain_pattern(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            source = %source,
            parser = registration.parser.name(),
            emails = ?email_patterns,
            domains = ?domain_patterns,
            "Registered newsletter parser"
        );

        self.registrations.push(ParserRegistration {
            parser: registration.parser,
            email_patterns,
            domain_patterns,
        });

        Ok(())
    }

    /// Find the parser for a `From` header value
    ///
    /// Accepts bare (`user@domain`) and display-name (`Name <user@domain>`)
    /// forms. Returns `None` for unknown senders; never fails.
    pub fn find_parser(&self, from_header: &str) -> Option<ParserMatch> {
        let address = extract_email_address(from_header)?;
        let domain = address.rsplit_once('@').map(|(_, d)| d)?;

        let exact = self
            .registrations
            .iter()
            .find(|r| r.email_patterns.iter().any(|p| *p == address))
            .map(|r| (r, MatchType::Exact));

        let matched = exact.or_else(|| {
            self.registrations
                .iter()
                .find(|r| r.domain_patterns.iter().any(|p| host_matches(domain, p)))
                .map(|r| (r, MatchType::Domain))
        });

        matched.map(|(registration, match_type)| ParserMatch {
            parser: Arc::clone(&registration.parser),
            source: registration.parser.source_name().to_string(),
            match_type,
        })
    }

    /// Number of registrations
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Summaries of every registration, in registration order
    pub fn registrations(&self) -> Vec<RegistrationInfo> {
        self.registrations
            .iter()
            .map(|r| RegistrationInfo {
                source: r.parser.source_name().to_string(),
                parser: r.parser.name().to_string(),
                email_patterns: r.email_patterns.clone(),
                domain_patterns: r.domain_patterns.clone(),
            })
            .collect()
    }
}

/// Extract the bare, lowercased email address from a `From` header value
///
/// # Examples
///
/// ```
/// use mailbrief::registry::extract_email_address;
///
/// assert_eq!(
///     extract_email_address("TLDR AI <Dan@TLDRNewsletter.com>").as_deref(),
///     Some("dan@tldrnewsletter.com")
/// );
/// assert_eq!(extract_email_address("no address here"), None);
///
/// // An address inside the quoted display name is not the sender
/// assert_eq!(
///     extract_email_address(r#""TLDR <dan@tldrnewsletter.com>" <evil@evil.example>"#).as_deref(),
///     Some("evil@evil.example")
/// );
/// ```
pub fn extract_email_address(from_header: &str) -> Option<String> {
    let unquoted = QUOTED_STRING.replace_all(from_header, " ");

    let candidate = match ANGLE_ADDRESS.captures_iter(&unquoted).last() {
        Some(caps) => caps[1].to_string(),
        None => unquoted
            .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
            .find(|token| token.contains('@'))?
            .trim_matches(|c: char| matches!(c, '"' | '\'' | '<' | '>' | '(' | ')'))
            .to_string(),
    };

    let address = candidate.to_ascii_lowercase();
    let (local, domain) = address.rsplit_once('@')?;
    (!local.is_empty() && domain.contains('.') && !domain.starts_with('.')).then_some(address)
}

fn normalize_email_pattern(pattern: &str) -> Result<String, RegistryError> {
    extract_email_address(pattern)
        .filter(|address| address == &pattern.trim().to_ascii_lowercase())
        .ok_or_else(|| RegistryError::InvalidPattern(pattern.to_string()))
}

fn normalize_domain_pattern(pattern: &str) -> Result<String, RegistryError> {
    let domain = pattern
        .trim()
        .trim_start_matches('@')
        .trim_start_matches("*.")
        .trim_end_matches('.')
        .to_ascii_lowercase();

    let valid = !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    if !valid {
        return Err(RegistryError::InvalidPattern(pattern.to_string()));
    }

    if BROAD_PLATFORM_DOMAINS
        .iter()
        .any(|broad| host_matches(&domain, broad) || host_matches(broad, &domain))
    {
        return Err(RegistryError::BroadDomain(domain));
    }

    Ok(domain)
}
