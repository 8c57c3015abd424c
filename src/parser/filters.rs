//! Exclusion and validity rules for extracted links and titles
//!
//! Every parser runs discovered links through a [`LinkPolicy`]: shared
//! denylists for navigation, social, unsubscribe/preference, tracking-pixel
//! and asset URLs, plus whatever source-specific patterns the parser adds.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::utils::host_matches;

/// Minimum title length accepted by the validity gate
pub const MIN_TITLE_CHARS: usize = 10;

/// Maximum title length accepted by the validity gate
pub const MAX_TITLE_CHARS: usize = 300;

/// Social networks and link-sharing hosts never treated as articles
const SOCIAL_DOMAINS: &[&str] = &[
    "twitter.com",
    "x.com",
    "facebook.com",
    "fb.com",
    "instagram.com",
    "linkedin.com",
    "tiktok.com",
    "threads.net",
    "pinterest.com",
    "reddit.com",
    "t.me",
    "whatsapp.com",
    "wa.me",
    "bsky.app",
    "mastodon.social",
    "discord.gg",
    "discord.com",
];

/// App stores and email-platform infrastructure hosts
const INFRASTRUCTURE_DOMAINS: &[&str] = &[
    "apps.apple.com",
    "itunes.apple.com",
    "play.google.com",
    "list-manage.com",
    "mailchimp.com",
    "substackcdn.com",
    "beehiiv.com",
    "convertkit.com",
    "ck.page",
    "sparkpostmail.com",
    "sendgrid.net",
    "mailgun.org",
];

static EXCLUDED_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(unsubscribe|/preferences|/email[-_]?preferences|manage[-_]?(subscription|preferences)|/account/|/settings|optout|opt-out|/signup|/sign-up|/subscribe\b|/login|/signin|/refer\b|/referral|/share\b|/advertise|/sponsor|/privacy|/terms|view[-_]?online|webversion|/open\.|/o/|/track/open|/pixel|beacon|/wf/open)",
    )
    .unwrap()
});

static ASSET_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(png|jpe?g|gif|webp|svg|ico|bmp|css|js|woff2?|ttf|mp3|mp4|mov)(\?|#|$)")
        .unwrap()
});

static EXCLUDED_TEXT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(unsubscribe.*|view (this email |it )?(in|on) (your |a )?(browser|web)|view online|web version|manage (your )?(preferences|subscription)s?|update (your )?preferences|(email )?preferences|sign ?up.*|subscribe( now| here| today)?|log ?in|sign ?in|share( this)?( on \w+)?|tweet|follow( us)?( on \w+)?|forward( to a friend| this email)?|refer (a friend|friends)|advertise( with us)?|privacy( policy)?|terms( of (service|use))?|contact us|home|download( the app)?|apply here|job board|twitter|facebook|linkedin|instagram|youtube|tiktok|threads)\s*[.!]?\s*$",
    )
    .unwrap()
});

static GENERIC_TEXT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(read( more| the full (story|article|post)| it| on| this)?|click here|here|continue reading|keep reading|learn more|full story|more|link|source|article|this|this post|go|view|see more|discuss|comments?|→|»)\s*[.:!»→]*\s*$",
    )
    .unwrap()
});

static BOILERPLATE_TITLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\bunsubscribe\b|\bsign ?up\b|\bsubscribe (now|today|here)\b|\bview (this email )?(in|on) (your )?browser\b|\bview online\b|\bmanage (your )?(preferences|subscription)|\bupdate (your )?preferences\b|\bprivacy policy\b|\bterms of (service|use)\b|\ball rights reserved\b|©|\bcopyright\b|\bforward(ed)? (this|to a friend)\b|\brefer a friend\b|\bfollow us\b|\badvertise with us\b|\bsponsor(ed)?\b|\bpresented by\b|\btogether with\b|\bin partnership with\b|\bdownload (the|our) app\b)",
    )
    .unwrap()
});

static BOILERPLATE_CONTENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\bunsubscribe\b|\ball rights reserved\b|©|\bcopyright \d{4}\b|\bmanage (your )?preferences\b|\byou('re| are) receiving this\b|\bview (this email )?in (your )?browser\b|^\s*(sponsored by|presented by|together with)\b)",
    )
    .unwrap()
});

/// Where a link candidate's `section` comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionSource {
    /// No section recorded
    None,
    /// Nearest preceding heading of any level
    NearestHeading,
    /// Nearest preceding `h1`/`h2`
    SectionHeading,
}

/// Source-specific link extraction policy
#[derive(Debug, Clone)]
pub struct LinkPolicy {
    /// Link text shorter than this is dropped (or inferred, see below)
    pub min_text_len: usize,
    /// Replace generic or short link text with the nearest heading or subject
    pub infer_generic_titles: bool,
    /// Decode tracking redirect hrefs to their destination
    pub decode_redirects: bool,
    /// Split `"Title (N minute read)"` into title and reading time
    pub reading_time_titles: bool,
    pub section_source: SectionSource,
    excluded_hosts: Vec<String>,
    extra_url_patterns: Vec<Regex>,
    extra_text_patterns: Vec<Regex>,
}

impl LinkPolicy {
    /// Create a policy with the shared denylists and the given minimum text length
    pub fn new(min_text_len: usize) -> Self {
        Self {
            min_text_len,
            infer_generic_titles: false,
            decode_redirects: false,
            reading_time_titles: false,
            section_source: SectionSource::None,
            excluded_hosts: Vec::new(),
            extra_url_patterns: Vec::new(),
            extra_text_patterns: Vec::new(),
        }
    }

    #[must_use]
    pub fn infer_generic_titles(mut self) -> Self {
        self.infer_generic_titles = true;
        self
    }

    #[must_use]
    pub fn decode_redirects(mut self) -> Self {
        self.decode_redirects = true;
        self
    }

    #[must_use]
    pub fn reading_time_titles(mut self) -> Self {
        self.reading_time_titles = true;
        self
    }

    #[must_use]
    pub fn section_source(mut self, source: SectionSource) -> Self {
        self.section_source = source;
        self
    }

    /// Exclude a host and all of its subdomains
    #[must_use]
    pub fn exclude_host(mut self, host: &str) -> Self {
        self.excluded_hosts.push(host.trim().to_ascii_lowercase());
        self
    }

    #[must_use]
    pub fn exclude_url_pattern(mut self, pattern: Regex) -> Self {
        self.extra_url_patterns.push(pattern);
        self
    }

    #[must_use]
    pub fn exclude_text_pattern(mut self, pattern: Regex) -> Self {
        self.extra_text_patterns.push(pattern);
        self
    }

    /// Check a link target against the shared and source-specific URL denylists
    pub fn is_excluded_url(&self, url: &str) -> bool {
        if is_noise_url(url) {
            return true;
        }

        let host = Url::parse(url.trim())
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
            .unwrap_or_default();

        if self
            .excluded_hosts
            .iter()
            .any(|excluded| host_matches(&host, excluded))
        {
            return true;
        }

        self.extra_url_patterns.iter().any(|re| re.is_match(url))
    }

    /// Check visible link text against the shared and source-specific denylists
    pub fn is_excluded_text(&self, text: &str) -> bool {
        EXCLUDED_TEXT_REGEX.is_match(text) || self.extra_text_patterns.iter().any(|re| re.is_match(text))
    }
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self::new(MIN_TITLE_CHARS)
    }
}

/// URL rules every source shares
///
/// Non-web schemes, fragments, social/infrastructure hosts, unsubscribe and
/// preference paths, tracking pixels and asset files are all noise.
pub fn is_noise_url(url: &str) -> bool {
    let url = url.trim();
    let Ok(parsed) = Url::parse(url) else {
        return true;
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return true;
    }

    let Some(host) = parsed.host_str().map(str::to_ascii_lowercase) else {
        return true;
    };

    if SOCIAL_DOMAINS
        .iter()
        .chain(INFRASTRUCTURE_DOMAINS)
        .any(|domain| host_matches(&host, domain))
    {
        return true;
    }

    EXCLUDED_URL_REGEX.is_match(url) || ASSET_URL_REGEX.is_match(parsed.path())
}

/// Check whether link text says nothing about the target ("read more", "click here", ...)
pub fn is_generic_text(text: &str) -> bool {
    text.trim().is_empty() || GENERIC_TEXT_REGEX.is_match(text)
}

/// Check a title against the boilerplate denylist
pub fn is_boilerplate_title(title: &str) -> bool {
    BOILERPLATE_TITLE_REGEX.is_match(title)
}

/// Check an inline block body against the boilerplate denylist
pub fn is_boilerplate_content(content: &str) -> bool {
    BOILERPLATE_CONTENT_REGEX.is_match(content)
}

/// Title validity gate
///
/// Accepts titles of 10..=300 characters that are not boilerplate and carry
/// at least one letter.
pub fn is_valid_title(title: &str) -> bool {
    let title = title.trim();
    let len = title.chars().count();

    (MIN_TITLE_CHARS..=MAX_TITLE_CHARS).contains(&len)
        && title.chars().any(char::is_alphabetic)
        && !is_boilerplate_title(title)
}
