//! Error types for the mailbrief ingestion pipeline
//!
//! This module defines the domain errors raised by parsers and the registry.

use thiserror::Error;

/// Errors that can occur while a parser processes a message
#[derive(Error, Debug)]
pub enum ParseError {
    /// Markup defeated the parser's extraction logic
    #[error("Malformed markup: {0}")]
    MalformedMarkup(String),

    /// Parser panicked while processing a message
    #[error("Parser panicked: {0}")]
    Panicked(String),
}

/// Errors raised when building the parser registry
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// Domain pattern names a shared email platform and would capture unrelated senders
    #[error("Domain pattern is too broad to route on: {0}")]
    BroadDomain(String),

    /// Pattern is empty or not an email address/domain
    #[error("Invalid routing pattern: {0}")]
    InvalidPattern(String),

    /// Registration carries no patterns at all
    #[error("Registration for {0} has no email or domain patterns")]
    NoPatterns(String),

    /// Configured parser kind is not a built-in parser
    #[error("Unknown parser kind: {0}")]
    UnknownParserKind(String),
}
