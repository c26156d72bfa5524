//! Top-level extraction → validation → dedup → aggregation pipeline.
//!
//! This is the only entry point the CLI (or any other front end) calls.
//! Per-record problems never fail a run; only an unreadable input does.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use sessions_core::error::{PipelineError, Result};
use sessions_core::models::{Event, Session, SkippedRecord, Stats};
use tracing::debug;

use crate::aggregator::SessionAggregator;
use crate::dedup::dedup_events;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::extractor::extract_chunks;
use crate::validator::validate_chunk;

// ── Public types ──────────────────────────────────────────────────────────────

/// The four outputs of one pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineOutput {
    /// Per-user session summary, sorted by `user_id`.
    pub sessions: Vec<Session>,
    /// Every chunk that did not become an event, in input order.
    pub skipped: Vec<SkippedRecord>,
    /// Deduplicated events, in input order.
    pub events: Vec<Event>,
    pub stats: Stats,
}

impl PipelineOutput {
    /// Number of skipped records per reason code, sorted by code.
    pub fn reason_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.skipped {
            *counts.entry(record.reason.code()).or_insert(0) += 1;
        }
        counts
    }
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the pipeline over already-decoded text, logging skips via `tracing`.
pub fn process_str(text: &str) -> PipelineOutput {
    process_str_with_sink(text, &mut TracingSink)
}

/// Run the pipeline over already-decoded text.
///
/// 1. Extract balanced `{...}` chunks.
/// 2. Validate each chunk, reporting skips to `sink`.
/// 3. Drop exact duplicates.
/// 4. Aggregate sessions and derive stats.
pub fn process_str_with_sink(text: &str, sink: &mut dyn DiagnosticSink) -> PipelineOutput {
    // ── Step 1 + 2: Extract and validate ──────────────────────────────────────
    let mut valid: Vec<Event> = Vec::new();
    let mut skipped: Vec<SkippedRecord> = Vec::new();
    let mut total_events = 0usize;

    for chunk in extract_chunks(text) {
        total_events += 1;
        match validate_chunk(&chunk) {
            Ok(event) => valid.push(event),
            Err(record) => {
                sink.record_skip(&record);
                skipped.push(record);
            }
        }
    }
    let valid_events = valid.len();

    // ── Step 3: Dedup ─────────────────────────────────────────────────────────
    let outcome = dedup_events(valid);

    // ── Step 4: Sessions and stats ────────────────────────────────────────────
    let sessions = SessionAggregator::aggregate(&outcome.events);

    let stats = Stats {
        total_events,
        valid_events,
        skipped_events: skipped.len(),
        duplicates_removed: outcome.removed,
        unique_users: SessionAggregator::unique_users(&outcome.events),
    };

    debug!(
        "Processed {} chunks: {} valid, {} skipped, {} duplicates, {} sessions covering {} events",
        stats.total_events,
        stats.valid_events,
        stats.skipped_events,
        stats.duplicates_removed,
        sessions.len(),
        SessionAggregator::total_events(&sessions),
    );

    PipelineOutput {
        sessions,
        skipped,
        events: outcome.events,
        stats,
    }
}

/// Run the pipeline over raw bytes. Invalid UTF-8 is replaced with U+FFFD.
pub fn process_bytes(bytes: &[u8]) -> PipelineOutput {
    process_bytes_with_sink(bytes, &mut TracingSink)
}

/// [`process_bytes`] with an explicit diagnostics sink.
pub fn process_bytes_with_sink(bytes: &[u8], sink: &mut dyn DiagnosticSink) -> PipelineOutput {
    let text = String::from_utf8_lossy(bytes);
    process_str_with_sink(&text, sink)
}

/// Read `reader` to the end and run the pipeline.
///
/// Fails only when the stream cannot be read.
pub fn process_reader<R: Read>(reader: R) -> Result<PipelineOutput> {
    process_reader_with_sink(reader, &mut TracingSink)
}

/// [`process_reader`] with an explicit diagnostics sink.
pub fn process_reader_with_sink<R: Read>(
    mut reader: R,
    sink: &mut dyn DiagnosticSink,
) -> Result<PipelineOutput> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(process_bytes_with_sink(&bytes, sink))
}

/// Read the file at `path` and run the pipeline.
pub fn process_path(path: &Path) -> Result<PipelineOutput> {
    process_path_with_sink(path, &mut TracingSink)
}

/// [`process_path`] with an explicit diagnostics sink.
pub fn process_path_with_sink(path: &Path, sink: &mut dyn DiagnosticSink) -> Result<PipelineOutput> {
    let bytes = std::fs::read(path).map_err(|source| PipelineError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(process_bytes_with_sink(&bytes, sink))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
