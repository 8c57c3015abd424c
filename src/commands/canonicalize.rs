use anyhow::Result;

use mailbrief::canonical::{self, is_tracking_redirect};

pub fn canonicalize(url: &str) -> Result<()> {
    let resolved = canonical::resolve_tracking_url(url);
    if is_tracking_redirect(url) {
        println!("Resolved:  {resolved}");
    }
    println!("Canonical: {}", canonical::canonicalize(url));
    println!("Dedup key: {}", canonical::normalize_url(url));
    Ok(())
}
