//! Mail collaborator seam
//!
//! The ingestion core only needs a batch of [`RawMessage`] records. Fetching
//! them from a live mailbox (auth, pagination, sender queries) stays behind
//! [`MessageSource`]; the shipped implementation reads exported messages
//! from disk.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::models::RawMessage;

/// Supplier of raw newsletter messages
pub trait MessageSource {
    /// Fetch the messages for one ingestion run
    fn fetch(&self) -> Result<Vec<RawMessage>>;
}

/// Messages exported to a JSON array or JSON Lines file
///
/// The format is detected from the first non-whitespace byte: `[` means a
/// JSON array, anything else is read as one message object per line.
#[derive(Debug, Clone)]
pub struct JsonMessageFile {
    path: PathBuf,
}

impl JsonMessageFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MessageSource for JsonMessageFile {
    fn fetch(&self) -> Result<Vec<RawMessage>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open message file: {}", self.path.display()))?;

        let mut content = String::new();
        BufReader::new(file)
            .read_to_string(&mut content)
            .with_context(|| format!("Failed to read message file: {}", self.path.display()))?;

        let messages = parse_messages(&content)
            .with_context(|| format!("Failed to parse message file: {}", self.path.display()))?;

        tracing::debug!(path = %self.path.display(), count = messages.len(), "Loaded messages");
        Ok(messages)
    }
}

/// Parse a JSON array or JSON Lines document of messages
pub fn parse_messages(content: &str) -> Result<Vec<RawMessage>> {
    if content.trim_start().starts_with('[') {
        return serde_json::from_str(content).context("Invalid JSON array of messages");
    }

    let mut messages = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let message: RawMessage = serde_json::from_str(line)
            .with_context(|| format!("Invalid message on line {}", line_no + 1))?;
        messages.push(message);
    }

    Ok(messages)
}
