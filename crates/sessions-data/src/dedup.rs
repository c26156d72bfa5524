//! Exact-duplicate removal over validated events.

use std::collections::HashMap;

use sessions_core::models::Event;

/// Result of [`dedup_events`].
#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    /// Surviving events, in their original relative order.
    pub events: Vec<Event>,
    /// Number of events dropped as duplicates.
    pub removed: usize,
}

/// Drop every event that shares `(user_id, event_time to the second,
/// event_type)` with an event of lower `source_index`.
///
/// The input does not need to be sorted; the survivor of each group is
/// always the one with the smallest `source_index`.
pub fn dedup_events(events: Vec<Event>) -> DedupOutcome {
    let before = events.len();

    let keep: Vec<bool> = {
        let mut first_seen: HashMap<(i64, i64, &str), usize> = HashMap::new();
        for event in &events {
            first_seen
                .entry(event.dedup_key())
                .and_modify(|idx| *idx = (*idx).min(event.source_index))
                .or_insert(event.source_index);
        }
        events
            .iter()
            .map(|e| first_seen.get(&e.dedup_key()) == Some(&e.source_index))
            .collect()
    };

    let survivors: Vec<Event> = events
        .into_iter()
        .zip(keep)
        .filter_map(|(event, keep)| keep.then_some(event))
        .collect();

    DedupOutcome {
        removed: before - survivors.len(),
        events: survivors,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
