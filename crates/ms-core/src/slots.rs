//! Free-time discovery between calendar events.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::event::Event;
use crate::window::AnalysisWindow;

/// A gap in the calendar, `[start, end)`, with positive length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FreeSlot {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl FreeSlot {
    /// Returns `None` unless `start < end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whole minutes in the slot.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "slot lengths are positive and bounded by the analysis window"
    )]
    pub fn minutes(&self) -> u32 {
        self.duration().num_minutes().clamp(0, i64::from(u32::MAX)) as u32
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Finds gaps of at least `min_slot_minutes` between events inside `window`.
///
/// Every event blocks time regardless of category. Overlapping or touching
/// events merge into one busy run. Slots come back sorted and disjoint.
pub fn find_free_slots(
    events: &[Event],
    window: &AnalysisWindow,
    min_slot_minutes: u32,
) -> Vec<FreeSlot> {
    let mut busy: Vec<(DateTime<Utc>, DateTime<Utc>)> = events
        .iter()
        .filter_map(|e| {
            let start = e.start().max(window.start());
            let end = e.end().min(window.end());
            (start < end).then_some((start, end))
        })
        .collect();
    busy.sort_unstable();

    let threshold = Duration::minutes(i64::from(min_slot_minutes));
    let mut slots = Vec::new();
    let mut cursor = window.start();
    let mut push_gap = |from: DateTime<Utc>, to: DateTime<Utc>| {
        slots.extend(FreeSlot::new(from, to).filter(|_| to - from >= threshold));
    };

    for (start, end) in busy {
        if start > cursor {
            push_gap(cursor, start);
        }
        cursor = cursor.max(end);
    }
    push_gap(cursor, window.end());

    tracing::debug!(slots = slots.len(), min_slot_minutes, "found free slots");
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::EventCategory;
    use crate::types::EventId;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 27, hour, minute, 0).unwrap()
    }

    fn event(id: &str, start: (u32, u32), end: (u32, u32)) -> Event {
        Event::new(EventId::new(id).unwrap(), at(start.0, start.1), at(end.0, end.1)).unwrap()
    }

    fn window(start: u32, end: u32) -> AnalysisWindow {
        AnalysisWindow::new(at(start, 0), at(end, 0), 0).unwrap()
    }

    fn spans(slots: &[FreeSlot]) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        slots.iter().map(|s| (s.start(), s.end())).collect()
    }

    #[test]
    fn empty_calendar_is_one_slot() {
        let slots = find_free_slots(&[], &window(9, 17), 15);
        assert_eq!(spans(&slots), vec![(at(9, 0), at(17, 0))]);
    }

    #[test]
    fn empty_calendar_shorter_than_threshold_has_no_slots() {
        let window = AnalysisWindow::new(at(9, 0), at(9, 10), 0).unwrap();
        assert!(find_free_slots(&[], &window, 15).is_empty());
    }

    #[test]
    fn gap_between_meetings() {
        let events = vec![
            event("a", (9, 0), (10, 0)),
            event("b", (10, 0), (11, 30)),
            event("c", (12, 0), (13, 0)),
        ];
        let slots = find_free_slots(&events, &window(9, 13), 20);
        assert_eq!(spans(&slots), vec![(at(11, 30), at(12, 0))]);
    }

    #[test]
    fn threshold_is_inclusive() {
        let events = vec![event("a", (9, 0), (9, 40)), event("b", (10, 0), (11, 0))];
        let slots = find_free_slots(&events, &window(9, 11), 20);
        assert_eq!(spans(&slots), vec![(at(9, 40), at(10, 0))]);
        assert!(find_free_slots(&events, &window(9, 11), 21).is_empty());
    }

    #[test]
    fn overlapping_events_merge() {
        let events = vec![
            event("a", (9, 0), (10, 30)),
            event("b", (9, 30), (10, 0)),
            event("c", (10, 15), (11, 0)),
        ];
        let slots = find_free_slots(&events, &window(9, 12), 15);
        assert_eq!(spans(&slots), vec![(at(11, 0), at(12, 0))]);
    }

    #[test]
    fn events_are_clipped_to_window() {
        let events = vec![event("early", (7, 0), (9, 30)), event("late", (16, 30), (19, 0))];
        let slots = find_free_slots(&events, &window(9, 17), 15);
        assert_eq!(spans(&slots), vec![(at(9, 30), at(16, 30))]);
    }

    #[test]
    fn every_category_blocks_time() {
        let events = vec![
            event("focus", (9, 0), (10, 0)).with_category(EventCategory::FocusBlock),
            event("gym", (10, 0), (11, 0)).with_category(EventCategory::Personal),
        ];
        let slots = find_free_slots(&events, &window(9, 12), 15);
        assert_eq!(spans(&slots), vec![(at(11, 0), at(12, 0))]);
    }

    #[test]
    fn slots_never_overlap_events() {
        let events = vec![
            event("a", (9, 10), (9, 50)),
            event("b", (10, 20), (11, 5)),
            event("c", (13, 0), (14, 0)),
        ];
        let slots = find_free_slots(&events, &window(9, 15), 5);
        for slot in &slots {
            for event in &events {
                assert_eq!(event.overlap_with(slot.start(), slot.end()), Duration::zero());
            }
        }
        assert!(slots.windows(2).all(|p| p[0].end() <= p[1].start()));
    }

    #[test]
    fn free_slot_requires_positive_length() {
        assert!(FreeSlot::new(at(9, 0), at(9, 0)).is_none());
        let slot = FreeSlot::new(at(9, 0), at(9, 25)).unwrap();
        assert_eq!(slot.minutes(), 25);
    }
}
