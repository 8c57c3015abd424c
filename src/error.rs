//! Unified error handling for the mailbrief crate
//!
//! Configuration loading, registry construction and article persistence
//! report through the single [`Error`] enum. Parsers keep their own
//! [`ParseError`], which is classified through the same trait.
//!
//! # Architecture
//!
//! - [`MailbriefErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping the domain-specific errors
//!
//! # Usage
//!
//! ```rust
//! use mailbrief::config::Config;
//! use mailbrief::error::{ErrorCategory, MailbriefErrorTrait};
//!
//! let mut config = Config::default();
//! config.ingest.max_messages = 0;
//!
//! let err = config.validate().unwrap_err();
//! assert_eq!(err.category(), ErrorCategory::Config);
//! assert!(!err.is_recoverable());
//! ```

use thiserror::Error;

pub use crate::utils::error::{ParseError, RegistryError};

/// Common trait for all mailbrief error types
pub trait MailbriefErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
///
/// Routing misses and validity rejections are expected outcomes and never
/// become errors, so they have no category here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Sender pattern and registry errors
    Routing,
    /// Parser failures
    Parsing,
    /// Article store failures
    Storage,
    /// Configuration errors
    Config,
}

impl ErrorCategory {
    /// Short label used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Routing => "routing",
            Self::Parsing => "parsing",
            Self::Storage => "storage",
            Self::Config => "config",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl MailbriefErrorTrait for ParseError {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Parsing
    }
}

impl MailbriefErrorTrait for RegistryError {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownParserKind(_) => ErrorCategory::Config,
            _ => ErrorCategory::Routing,
        }
    }
}

/// Unified error type for the mailbrief crate
#[derive(Error, Debug)]
pub enum Error {
    /// Registry errors
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Article store failures (lookup or insert)
    #[error("Storage error: {0:#}")]
    Storage(anyhow::Error),

    /// Configuration errors
    #[error("Config error: {context}")]
    Config {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl MailbriefErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Registry(e) => e.is_recoverable(),
            Self::Storage(_) => true, // locked database, busy WAL
            Self::Config { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Registry(e) => e.category(),
            Self::Storage(_) => ErrorCategory::Storage,
            Self::Config { .. } => ErrorCategory::Config,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(context: impl Into<String>) -> Self {
        Self::Config {
            context: context.into(),
            source: None,
        }
    }

    /// Create a configuration error with its underlying cause
    pub fn config_with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
