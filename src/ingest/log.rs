//! Structured per-message and per-batch ingestion records
//!
//! Every record is emitted through `tracing` on the `mailbrief::ingest`
//! target and also returned to the caller inside the report, so the same
//! fields are available as JSON log lines and as data.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::RawMessage;

/// Log target for ingestion records
pub const LOG_TARGET: &str = "mailbrief::ingest";

/// Severity derived from a message's outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One record per input message
#[derive(Debug, Clone, Serialize)]
pub struct MessageLog {
    pub level: LogLevel,
    pub message_id: String,
    pub from: String,
    pub subject: String,
    pub newsletter_source: Option<String>,
    pub parser_name: Option<String>,
    pub candidates_extracted_count: usize,
    pub candidates_emitted_count: usize,
    pub errors: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl MessageLog {
    /// Start a record for a message that has not been routed yet
    pub fn new(message: &RawMessage) -> Self {
        Self {
            level: LogLevel::Info,
            message_id: message.id.clone(),
            from: message.from.clone(),
            subject: message.subject.clone(),
            newsletter_source: None,
            parser_name: None,
            candidates_extracted_count: 0,
            candidates_emitted_count: 0,
            errors: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Whether the sender routed to a known source
    pub fn is_routed(&self) -> bool {
        self.newsletter_source.is_some()
    }

    /// ERROR on any error, WARN when a known source yielded nothing, else INFO
    pub fn derive_level(&self) -> LogLevel {
        if !self.errors.is_empty() {
            LogLevel::Error
        } else if self.is_routed() && self.candidates_emitted_count == 0 {
            LogLevel::Warn
        } else {
            LogLevel::Info
        }
    }

    /// Fix the level from the current counts and errors, then emit
    pub fn finish(&mut self) {
        self.level = self.derive_level();
        self.emit();
    }

    fn emit(&self) {
        let source = self.newsletter_source.as_deref().unwrap_or("");
        let parser = self.parser_name.as_deref().unwrap_or("");
        let message = if !self.is_routed() {
            "No parser for sender"
        } else if !self.errors.is_empty() {
            "Newsletter processed with errors"
        } else if self.candidates_emitted_count == 0 {
            "Newsletter yielded no candidates"
        } else {
            "Newsletter processed"
        };

        let record = self;

        macro_rules! record {
            ($macro:ident) => {
                tracing::$macro!(
                    target: LOG_TARGET,
                    message_id = %record.message_id,
                    from = %record.from,
                    subject = %record.subject,
                    newsletter_source = %source,
                    parser_name = %parser,
                    candidates_extracted_count = record.candidates_extracted_count,
                    candidates_emitted_count = record.candidates_emitted_count,
                    errors = ?record.errors,
                    timestamp = %record.timestamp.to_rfc3339(),
                    "{message}"
                )
            };
        }

        match self.level {
            LogLevel::Error => record!(error),
            LogLevel::Warn => record!(warn),
            LogLevel::Info => record!(info),
        }
    }
}

/// Batch counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Input messages examined
    pub processed: usize,
    /// Candidates written to the store
    pub saved: usize,
    /// Candidates already present in the store
    pub skipped: usize,
    /// Candidates dropped as in-batch canonical URL duplicates
    pub deduped: usize,
    /// Parse and persistence failures
    pub errors: usize,
}

impl IngestStats {
    /// Emit the batch summary record
    pub fn emit_summary(&self, duration_ms: u64) {
        let level = if self.errors > 0 { LogLevel::Warn } else { LogLevel::Info };

        let stats = *self;

        macro_rules! summary {
            ($macro:ident) => {
                tracing::$macro!(
                    target: LOG_TARGET,
                    processed = stats.processed,
                    saved = stats.saved,
                    skipped = stats.skipped,
                    deduped = stats.deduped,
                    errors = stats.errors,
                    duration_ms,
                    "Ingestion batch complete"
                )
            };
        }

        match level {
            LogLevel::Warn => summary!(warn),
            _ => summary!(info),
        }
    }
}

impl std::fmt::Display for IngestStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} articles added, {} skipped as duplicates, {} errors",
            self.saved,
            self.skipped + self.deduped,
            self.errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routed_log() -> MessageLog {
        let mut log = MessageLog::new(&RawMessage {
            id: "m1".into(),
            from: "TLDR <dan@tldrnewsletter.com>".into(),
            ..Default::default()
        });
        log.newsletter_source = Some("TLDR".into());
        log.parser_name = Some("TldrParser".into());
        log
    }

    #[test]
    fn test_unrouted_message_is_info() {
        let log = MessageLog::new(&RawMessage::default());
        assert_eq!(log.derive_level(), LogLevel::Info);
    }

    #[test]
    fn test_known_source_without_candidates_warns() {
        let log = routed_log();
        assert_eq!(log.derive_level(), LogLevel::Warn);
    }

    #[test]
    fn test_errors_dominate() {
        let mut log = routed_log();
        log.candidates_emitted_count = 5;
        log.errors.push("store unavailable".into());
        assert_eq!(log.derive_level(), LogLevel::Error);
    }

    #[test]
    fn test_record_serializes_flat() {
        let mut log = routed_log();
        log.candidates_extracted_count = 4;
        log.candidates_emitted_count = 3;
        log.finish();

        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["level"], "INFO");
        assert_eq!(json["message_id"], "m1");
        assert_eq!(json["newsletter_source"], "TLDR");
        assert_eq!(json["candidates_emitted_count"], 3);
        assert!(json["errors"].as_array().unwrap().is_empty());
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_stats_display() {
        let stats = IngestStats {
            processed: 4,
            saved: 10,
            skipped: 2,
            deduped: 1,
            errors: 0,
        };
        assert_eq!(stats.to_string(), "10 articles added, 3 skipped as duplicates, 0 errors");
    }
}
