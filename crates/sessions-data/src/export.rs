//! Rendering pipeline outputs as delimited text and writing them to disk.

use std::path::Path;

use sessions_core::error::{PipelineError, Result};
use sessions_core::formatting::{render_table, value_cell};
use sessions_core::models::{Event, Session, SkippedRecord};
use sessions_core::time_utils::format_event_timestamp;
use tracing::debug;

pub const SESSION_COLUMNS: [&str; 4] = ["user_id", "session_start", "session_end", "event_count"];
pub const SKIPPED_COLUMNS: [&str; 6] =
    ["event", "reason", "raw", "user_id", "event_time", "event_type"];
pub const EVENT_COLUMNS: [&str; 4] = ["user_id", "event_time", "event_type", "event_index"];

// ── Rendering ─────────────────────────────────────────────────────────────────

/// Render the session table. Always includes the header line.
pub fn render_sessions(sessions: &[Session], delimiter: char) -> String {
    let rows: Vec<Vec<String>> = sessions
        .iter()
        .map(|s| {
            vec![
                s.user_id.to_string(),
                s.start_display(),
                s.end_display(),
                s.event_count.to_string(),
            ]
        })
        .collect();
    render_table(&SESSION_COLUMNS, &rows, delimiter)
}

/// Render the skipped-records table. Unknown partial fields are empty cells.
pub fn render_skipped(skipped: &[SkippedRecord], delimiter: char) -> String {
    let rows: Vec<Vec<String>> = skipped
        .iter()
        .map(|r| {
            vec![
                r.source_index.to_string(),
                r.reason.to_string(),
                r.raw_excerpt.clone(),
                value_cell(r.user_id.as_ref()),
                value_cell(r.event_time.as_ref()),
                value_cell(r.event_type.as_ref()),
            ]
        })
        .collect();
    render_table(&SKIPPED_COLUMNS, &rows, delimiter)
}

/// Render the deduplicated event table.
pub fn render_events(events: &[Event], delimiter: char) -> String {
    let rows: Vec<Vec<String>> = events
        .iter()
        .map(|e| {
            vec![
                e.user_id.to_string(),
                format_event_timestamp(&e.event_time),
                e.event_type.clone(),
                e.source_index.to_string(),
            ]
        })
        .collect();
    render_table(&EVENT_COLUMNS, &rows, delimiter)
}

// ── Writing ───────────────────────────────────────────────────────────────────

pub fn write_sessions(path: &Path, sessions: &[Session], delimiter: char) -> Result<()> {
    write_atomic(path, &render_sessions(sessions, delimiter))
}

pub fn write_skipped(path: &Path, skipped: &[SkippedRecord], delimiter: char) -> Result<()> {
    write_atomic(path, &render_skipped(skipped, delimiter))
}

pub fn write_events(path: &Path, events: &[Event], delimiter: char) -> Result<()> {
    write_atomic(path, &render_events(events, delimiter))
}

/// Write to a sibling temp file, then rename over `path`.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let wrap = |source| PipelineError::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(wrap)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    std::fs::write(&tmp, content).map_err(wrap)?;
    std::fs::rename(&tmp, path).map_err(wrap)?;

    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
