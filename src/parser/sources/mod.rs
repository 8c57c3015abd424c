//! Per-source newsletter parsers
//!
//! One struct per newsletter layout. Adding a source means adding one parser
//! here and one registration in the [`crate::registry`].

pub mod blog;
pub mod inline_digest;
pub mod sectioned;
pub mod tldr;

pub use blog::BlogParser;
pub use inline_digest::InlineDigestParser;
pub use sectioned::SectionedParser;
pub use tldr::TldrParser;

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use crate::parser::NewsletterParser;
use crate::utils::error::RegistryError;

/// Built-in parser layouts that configured sources can be routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    /// Link aggregator with tracking redirects and reading times
    Tldr,
    /// Blog-style post with external links and an own-post fallback
    Blog,
    /// Section-structured link list with heading title inference
    Sectioned,
    /// Digest with inline article bodies
    Inline,
}

impl ParserKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tldr => "tldr",
            Self::Blog => "blog",
            Self::Sectioned => "sectioned",
            Self::Inline => "inline",
        }
    }

    /// Build a parser of this kind for a named source
    ///
    /// `post_host` is the source's own web host; blog parsers exclude it
    /// from external links and use it to find the post itself.
    pub fn build(&self, source_name: &str, post_host: Option<&str>) -> Arc<dyn NewsletterParser> {
        match self {
            Self::Tldr => Arc::new(TldrParser::new(source_name)),
            Self::Blog => Arc::new(BlogParser::new(source_name, post_host)),
            Self::Sectioned => Arc::new(SectionedParser::new(source_name)),
            Self::Inline => Arc::new(InlineDigestParser::new(source_name)),
        }
    }
}

impl std::fmt::Display for ParserKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ParserKind {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tldr" => Ok(Self::Tldr),
            "blog" => Ok(Self::Blog),
            "sectioned" => Ok(Self::Sectioned),
            "inline" | "inline_digest" => Ok(Self::Inline),
            other => Err(RegistryError::UnknownParserKind(other.to_string())),
        }
    }
}
