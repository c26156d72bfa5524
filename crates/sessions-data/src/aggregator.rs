//! Per-user session aggregation over deduplicated events.

use std::collections::{BTreeMap, HashSet};

use sessions_core::models::{Event, Session};

// ── SessionAggregator ─────────────────────────────────────────────────────────

/// Stateless helper that groups events by user.
pub struct SessionAggregator;

impl SessionAggregator {
    /// One [`Session`] per distinct `user_id`, sorted ascending by user.
    ///
    /// An empty input yields an empty table.
    pub fn aggregate(events: &[Event]) -> Vec<Session> {
        // BTreeMap keeps the user ids sorted.
        let mut map: BTreeMap<i64, Session> = BTreeMap::new();

        for event in events {
            map.entry(event.user_id)
                .and_modify(|session| session.add_event(event))
                .or_insert_with(|| Session::from_event(event));
        }

        map.into_values().collect()
    }

    /// Number of distinct users among `events`.
    pub fn unique_users(events: &[Event]) -> usize {
        events
            .iter()
            .map(|e| e.user_id)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Sum of `event_count` across all sessions.
    pub fn total_events(sessions: &[Session]) -> usize {
        sessions.iter().map(|s| s.event_count).sum()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn make_event(user_id: i64, ts: &str, index: usize) -> Event {
        Event {
            user_id,
            event_time: DateTime::parse_from_rfc3339(ts)
                .unwrap()
                .with_timezone(&Utc),
            event_type: "view".to_string(),
            source_index: index,
        }
    }

    #[test]
    fn test_groups_by_user_sorted() {
        let events = vec![
            make_event(13, "2024-07-10T11:59:30Z", 1),
            make_event(12, "2024-07-10T11:45:00Z", 2),
            make_event(13, "2024-07-11T10:40:00Z", 3),
        ];
        let sessions = SessionAggregator::aggregate(&events);

        let users: Vec<i64> = sessions.iter().map(|s| s.user_id).collect();
        assert_eq!(users, vec![12, 13]);
        assert_eq!(sessions[0].event_count, 1);
        assert_eq!(sessions[1].event_count, 2);
        assert_eq!(sessions[1].start_display(), "2024-07-10T11:59:30Z");
        assert_eq!(sessions[1].end_display(), "2024-07-11T10:40:00Z");
    }

    #[test]
    fn test_span_uses_min_and_max_not_input_order() {
        let events = vec![
            make_event(1, "2024-07-10T12:00:00Z", 1),
            make_event(1, "2024-07-10T08:00:00Z", 2),
            make_event(1, "2024-07-10T18:00:00Z", 3),
            make_event(1, "2024-07-10T10:00:00Z", 4),
        ];
        let sessions = SessionAggregator::aggregate(&events);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].start_display(), "2024-07-10T08:00:00Z");
        assert_eq!(sessions[0].end_display(), "2024-07-10T18:00:00Z");
    }

    #[test]
    fn test_single_event_session_has_equal_bounds() {
        let sessions = SessionAggregator::aggregate(&[make_event(5, "2024-07-10T12:00:00Z", 1)]);
        assert_eq!(sessions[0].session_start, sessions[0].session_end);
    }

    #[test]
    fn test_negative_user_ids_sort_first() {
        let events = vec![
            make_event(3, "2024-07-10T12:00:00Z", 1),
            make_event(-1, "2024-07-10T12:00:00Z", 2),
        ];
        let users: Vec<i64> = SessionAggregator::aggregate(&events)
            .iter()
            .map(|s| s.user_id)
            .collect();
        assert_eq!(users, vec![-1, 3]);
    }

    #[test]
    fn test_counts_match_events() {
        let events = vec![
            make_event(1, "2024-07-10T12:00:00Z", 1),
            make_event(2, "2024-07-10T12:00:00Z", 2),
            make_event(1, "2024-07-10T13:00:00Z", 3),
        ];
        let sessions = SessionAggregator::aggregate(&events);
        assert_eq!(SessionAggregator::total_events(&sessions), events.len());
        assert_eq!(SessionAggregator::unique_users(&events), sessions.len());
        for s in &sessions {
            assert!(s.session_start <= s.session_end);
        }
    }

    #[test]
    fn test_empty() {
        assert!(SessionAggregator::aggregate(&[]).is_empty());
        assert_eq!(SessionAggregator::unique_users(&[]), 0);
        assert_eq!(SessionAggregator::total_events(&[]), 0);
    }
}
