//! Event ingestion pipeline.
//!
//! Extracts balanced `{...}` objects from a raw stream, validates them into
//! events, removes exact duplicates, builds per-user sessions and exports the
//! resulting tables.

pub mod aggregator;
pub mod dedup;
pub mod diagnostics;
pub mod export;
pub mod extractor;
pub mod pipeline;
pub mod validator;

pub use sessions_core as core;
