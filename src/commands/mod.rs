pub mod canonicalize;
pub mod ingest;
pub mod route;
pub mod sources;

// Re-export command functions for convenience
pub use canonicalize::canonicalize;
pub use ingest::{ingest, IngestParams};
pub use route::route;
pub use sources::sources;
