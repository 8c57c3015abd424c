//! Integration tests module
//!
//! End-to-end tests for the mailbrief ingestion pipeline:
//! - Routing -> parsing -> dedup -> storage over the four built-in sources
//! - Per-message and per-candidate failure isolation

pub mod error_scenarios;
pub mod pipeline_test;
