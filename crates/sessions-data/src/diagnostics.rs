//! Where per-record skip diagnostics go.
//!
//! The pipeline never logs directly; it hands every skipped record to a
//! [`DiagnosticSink`]. The binary uses [`TracingSink`], tests use
//! [`CollectingSink`] to assert on what was reported.

use sessions_core::models::{SkipReason, SkippedRecord};
use tracing::warn;

/// Receiver for skipped-record diagnostics.
pub trait DiagnosticSink {
    /// Called once for every chunk that did not become an event.
    fn record_skip(&mut self, record: &SkippedRecord);
}

/// Emits each skip as a `tracing` warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record_skip(&mut self, record: &SkippedRecord) {
        warn!("skip event={} reason={}", record.source_index, record.reason);
    }
}

/// One collected diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipDiagnostic {
    pub source_index: usize,
    pub reason: SkipReason,
}

/// Keeps every reported skip in memory.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    pub diagnostics: Vec<SkipDiagnostic>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordinals of the reported skips, in report order.
    pub fn ordinals(&self) -> Vec<usize> {
        self.diagnostics.iter().map(|d| d.source_index).collect()
    }
}

impl DiagnosticSink for CollectingSink {
    fn record_skip(&mut self, record: &SkippedRecord) {
        self.diagnostics.push(SkipDiagnostic {
            source_index: record.source_index,
            reason: record.reason.clone(),
        });
    }
}
