//! Normalized calendar events.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::category::EventCategory;
use crate::types::{EventId, ValidationError};

/// How important the organizer marked an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    #[default]
    Normal,
    High,
}

impl Importance {
    /// Parses a provider importance string, defaulting to `Normal`.
    pub fn from_provider(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Normal,
        }
    }
}

/// A calendar event in provider-independent form.
///
/// Events are immutable once built and always satisfy `start < end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    id: EventId,
    title: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    category: EventCategory,
    attendee_count: u32,
    importance: Importance,
}

impl Event {
    /// Creates an event with default metadata.
    ///
    /// The category defaults to `Meeting`, attendees to 1, and importance
    /// to `Normal`; use the `with_*` methods to change them.
    pub fn new(
        id: EventId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::NonPositiveDuration { id: id.into() });
        }
        Ok(Self {
            id,
            title: String::new(),
            start,
            end,
            category: EventCategory::Meeting,
            attendee_count: 1,
            importance: Importance::Normal,
        })
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: EventCategory) -> Self {
        self.category = category;
        self
    }

    #[must_use]
    pub fn with_attendees(mut self, attendee_count: u32) -> Self {
        self.attendee_count = attendee_count;
        self
    }

    #[must_use]
    pub fn with_importance(mut self, importance: Importance) -> Self {
        self.importance = importance;
        self
    }

    pub const fn id(&self) -> &EventId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub const fn category(&self) -> EventCategory {
        self.category
    }

    pub const fn attendee_count(&self) -> u32 {
        self.attendee_count
    }

    pub const fn importance(&self) -> Importance {
        self.importance
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// Length of the overlap between this event and `[from, to)`.
    pub fn overlap_with(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Duration {
        let start = self.start.max(from);
        let end = self.end.min(to);
        if end > start {
            end - start
        } else {
            Duration::zero()
        }
    }
}

/// Sorts events by start, then end, then ID so downstream passes are
/// deterministic regardless of provider order.
pub fn sort_events(events: &mut [Event]) {
    events.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then(a.end.cmp(&b.end))
            .then_with(|| a.id.cmp(&b.id))
    });
}
