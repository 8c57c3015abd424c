//! Configuration management for mailbrief
//!
//! Settings come from environment variables or a TOML file. Besides storage,
//! batch and logging options, the file can route additional senders to one of
//! the built-in parser kinds without code changes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::parser::ParserKind;
use crate::registry::{ParserRegistration, ParserRegistry};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Article store configuration
    pub storage: StorageConfig,

    /// Batch ingestion configuration
    pub ingest: IngestConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Additional newsletter senders routed to built-in parsers
    pub sources: Vec<SourceConfig>,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path
    pub sqlite_path: PathBuf,
}

/// Ingestion batch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Upper bound on messages handled per run
    pub max_messages: usize,

    /// Parse and report without writing to the database
    pub dry_run: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

/// A configured newsletter sender
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Display name stamped on every candidate
    pub name: String,

    /// Built-in layout used to parse this sender's messages
    pub kind: ParserKind,

    /// Exact sender addresses
    #[serde(default)]
    pub emails: Vec<String>,

    /// Sender domains (subdomains match too)
    #[serde(default)]
    pub domains: Vec<String>,

    /// The newsletter's own web host, for blog-style sources
    #[serde(default)]
    pub post_host: Option<String>,
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["text", "json"];

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let sqlite_path = std::env::var("MAILBRIEF_SQLITE_PATH")
            .unwrap_or_else(|_| String::from("data/mailbrief.db"))
            .into();

        let max_messages = std::env::var("MAILBRIEF_MAX_MESSAGES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(500);

        let dry_run = std::env::var("MAILBRIEF_DRY_RUN")
            .ok()
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let log_level = std::env::var("MAILBRIEF_LOG_LEVEL").unwrap_or_else(|_| String::from("info"));

        let log_format = std::env::var("MAILBRIEF_LOG_FORMAT").unwrap_or_else(|_| String::from("text"));

        Ok(Self {
            storage: StorageConfig { sqlite_path },
            ingest: IngestConfig { max_messages, dry_run },
            logging: LoggingConfig {
                level: log_level,
                format: log_format,
            },
            sources: Vec::new(),
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config_with_source(format!("Failed to read config file: {}", path.display()), e)
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            Error::config_with_source(format!("Failed to parse TOML config file: {}", path.display()), e)
        })?;

        Ok(config)
    }

    /// Validate configuration values
    ///
    /// Also builds the parser registry so that bad sender patterns are
    /// reported at startup rather than on the first message.
    pub fn validate(&self) -> Result<()> {
        if self.ingest.max_messages == 0 {
            return Err(Error::config("max_messages must be greater than 0"));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(Error::config(format!("unknown log level: {}", self.logging.level)));
        }

        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(Error::config(format!(
                "unknown log format: {} (expected text or json)",
                self.logging.format
            )));
        }

        self.registry()?;
        Ok(())
    }

    /// Build the parser registry: built-in sources first, then configured ones
    ///
    /// Pattern problems surface as [`Error::Registry`].
    pub fn registry(&self) -> Result<ParserRegistry> {
        let mut registry = ParserRegistry::with_builtin_sources()?;

        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(Error::config("configured source must have a name"));
            }

            let parser = source.kind.build(&source.name, source.post_host.as_deref());
            let registration = source
                .emails
                .iter()
                .fold(ParserRegistration::new(parser), |reg, email| reg.email(email));
            let registration = source
                .domains
                .iter()
                .fold(registration, |reg, domain| reg.domain(domain));

            if let Err(e) = registry.register(registration) {
                tracing::error!(source = %source.name, error = %e, "Invalid configured source");
                return Err(e.into());
            }
        }

        Ok(registry)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("data/mailbrief.db"),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_messages: 500,
            dry_run: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCategory, MailbriefErrorTrait, RegistryError};

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ingest.max_messages, 500);
        assert_eq!(config.storage.sqlite_path, PathBuf::from("data/mailbrief.db"));
    }

    #[test]
    fn test_invalid_max_messages() {
        let mut config = Config::default();
        config.ingest.max_messages = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Config);
        assert!(err.to_string().contains("max_messages"));
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = String::from("xml");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [ingest]
            dry_run = true
            "#,
        )
        .unwrap();
        assert!(config.ingest.dry_run);
        assert_eq!(config.ingest.max_messages, 500);
        assert_eq!(config.logging.format, "text");
        assert!(config.sources.is_empty());
    }

    #[test]
    fn test_configured_source_routes() {
        let config: Config = toml::from_str(
            r#"
            [[sources]]
            name = "Bytes"
            kind = "sectioned"
            domains = ["bytes.dev"]
            "#,
        )
        .unwrap();
        let registry = config.registry().unwrap();
        let found = registry.find_parser("Bytes <hello@bytes.dev>").unwrap();
        assert_eq!(found.source, "Bytes");
        assert_eq!(found.parser.name(), "SectionedParser");
    }

    #[test]
    fn test_broad_configured_domain_is_rejected() {
        let mut config = Config::default();
        config.sources.push(SourceConfig {
            name: String::from("Some Substack"),
            kind: ParserKind::Blog,
            emails: Vec::new(),
            domains: vec![String::from("substack.com")],
            post_host: None,
        });
        let err = config.validate().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Routing);
        assert!(matches!(err, Error::Registry(RegistryError::BroadDomain(ref d)) if d == "substack.com"));
    }

    #[test]
    fn test_unnamed_source_is_config_error() {
        let mut config = Config::default();
        config.sources.push(SourceConfig {
            name: String::from("  "),
            kind: ParserKind::Sectioned,
            emails: Vec::new(),
            domains: vec![String::from("bytes.dev")],
            post_host: None,
        });
        let err = config.registry().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Config);
    }

    #[test]
    fn test_unknown_kind_fails_to_parse() {
        let result: std::result::Result<Config, _> = toml::from_str(
            r#"
            [[sources]]
            name = "Odd"
            kind = "carrier-pigeon"
            domains = ["odd.example"]
            "#,
        );
        assert!(result.is_err());
    }
}
