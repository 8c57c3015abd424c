//! Common utilities and helper functions
//!
//! Host matching shared by routing and link exclusion, and content hashing
//! for URL-less articles.

pub mod error;

use sha2::{Digest, Sha256};

/// Check whether `host` equals `domain` or is one of its subdomains
pub fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || (host.len() > domain.len()
            && host.ends_with(domain)
            && host.as_bytes()[host.len() - domain.len() - 1] == b'.')
}

/// SHA-256 hex digest of a text body
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
