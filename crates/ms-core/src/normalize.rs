//! Provider payloads to normalized events.
//!
//! Understands three shapes of calendar export:
//! - Google Calendar API (`{"items": [...]}`)
//! - Microsoft Graph / Outlook (`{"value": [...]}`)
//! - a simplified custom format (`{"events": [...]}` or a bare array)
//!
//! Normalization is partial-failure tolerant: a bad record is logged and
//! reported in [`NormalizedCalendar::skipped`], the rest of the batch
//! still comes through.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::category::EventCategory;
use crate::event::{Event, Importance, sort_events};
use crate::keywords::category_from_title;
use crate::types::EventId;
use crate::window::offset_from_minutes;

const UNTITLED: &str = "Untitled event";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Calendar provider a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Outlook,
    Custom,
}

impl Provider {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Outlook => "outlook",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single provider-tagged record as handed over by the calendar fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEventRecord {
    pub provider: Provider,
    pub payload: Value,
}

/// A record whose timestamps could not be turned into a valid event.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("malformed event at index {index}: {field} {value:?} {message}")]
pub struct MalformedEventError {
    pub index: usize,
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

/// Errors that reject a whole calendar document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// The document matches none of the known provider shapes.
    #[error("unrecognised calendar format: expected `items`, `value`, `events`, or an array")]
    UnknownFormat,
}

/// Why a record did not become an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// No start or end at all; dropped quietly.
    MissingTime { field: &'static str },
    /// All-day entries would block the entire window.
    AllDay,
    Cancelled,
    Malformed { error: MalformedEventError },
}

/// A record that was dropped during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub index: usize,
    pub provider: Provider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Options for interpreting provider data.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeOptions {
    /// Offset applied to timestamps that carry no zone information.
    pub default_utc_offset_minutes: i32,
}

/// Result of normalizing a batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NormalizedCalendar {
    /// Detected document provider; `None` for individually tagged records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
    /// Sorted by start, end, then ID.
    pub events: Vec<Event>,
    pub skipped: Vec<SkippedRecord>,
}

impl NormalizedCalendar {
    /// Number of records that were rejected as malformed.
    pub fn malformed_count(&self) -> usize {
        self.skipped
            .iter()
            .filter(|s| matches!(s.reason, SkipReason::Malformed { .. }))
            .count()
    }
}

/// Detects the provider shape of a whole calendar document.
pub fn detect_provider(document: &Value) -> Option<Provider> {
    match document {
        Value::Array(_) => Some(Provider::Custom),
        Value::Object(map) => {
            if map.get("items").is_some_and(Value::is_array) {
                Some(Provider::Google)
            } else if map.get("value").is_some_and(Value::is_array) {
                Some(Provider::Outlook)
            } else if map.get("events").is_some_and(Value::is_array) {
                Some(Provider::Custom)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Normalizes a whole calendar document after detecting its provider.
pub fn normalize_calendar(
    document: &Value,
    options: &NormalizeOptions,
) -> Result<NormalizedCalendar, NormalizeError> {
    let provider = detect_provider(document).ok_or(NormalizeError::UnknownFormat)?;
    let items = match (provider, document) {
        (_, Value::Array(items)) => items.as_slice(),
        (Provider::Google, Value::Object(map)) => array_field(map, "items"),
        (Provider::Outlook, Value::Object(map)) => array_field(map, "value"),
        (Provider::Custom, Value::Object(map)) => array_field(map, "events"),
        _ => return Err(NormalizeError::UnknownFormat),
    };
    tracing::debug!(%provider, records = items.len(), "normalizing calendar document");

    let mut calendar = collect(items.iter().map(|payload| (provider, payload)), options);
    calendar.provider = Some(provider);
    Ok(calendar)
}

/// Normalizes individually tagged records, possibly from mixed providers.
pub fn normalize_records(
    records: &[RawEventRecord],
    options: &NormalizeOptions,
) -> NormalizedCalendar {
    collect(records.iter().map(|r| (r.provider, &r.payload)), options)
}

fn array_field<'a>(map: &'a serde_json::Map<String, Value>, key: &str) -> &'a [Value] {
    map.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn collect<'a>(
    records: impl Iterator<Item = (Provider, &'a Value)>,
    options: &NormalizeOptions,
) -> NormalizedCalendar {
    let default_offset = offset_from_minutes(options.default_utc_offset_minutes)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "default offset out of range, reading naive times as UTC");
            Utc.fix()
        });
    let mut calendar = NormalizedCalendar::default();

    for (index, (provider, payload)) in records.enumerate() {
        match normalize_record(index, provider, payload, default_offset) {
            Ok(event) => calendar.events.push(event),
            Err(reason) => {
                let id = payload.get("id").and_then(Value::as_str).map(String::from);
                match &reason {
                    SkipReason::Malformed { error } => {
                        tracing::warn!(%provider, index, error = %error, "skipping malformed calendar record");
                    }
                    other => {
                        tracing::debug!(%provider, index, reason = ?other, "dropping calendar record");
                    }
                }
                calendar.skipped.push(SkippedRecord {
                    index,
                    provider,
                    id,
                    reason,
                });
            }
        }
    }

    sort_events(&mut calendar.events);
    tracing::debug!(
        events = calendar.events.len(),
        skipped = calendar.skipped.len(),
        "normalized calendar"
    );
    calendar
}

/// Fields every provider parser extracts before the event is assembled.
struct Extracted<'a> {
    start: &'a Value,
    end: &'a Value,
    start_zone: Option<&'a str>,
    end_zone: Option<&'a str>,
    title: Option<&'a str>,
    attendees: u32,
    importance: Importance,
    explicit_category: Option<&'a str>,
}

fn normalize_record(
    index: usize,
    provider: Provider,
    payload: &Value,
    default_offset: FixedOffset,
) -> Result<Event, SkipReason> {
    let extracted = match provider {
        Provider::Google => extract_google(payload)?,
        Provider::Outlook => extract_outlook(payload)?,
        Provider::Custom => extract_custom(payload)?,
    };

    let start = parse_time(
        index,
        "start",
        extracted.start,
        extracted.start_zone,
        default_offset,
    )?;
    let end = parse_time(
        index,
        "end",
        extracted.end,
        extracted.end_zone,
        default_offset,
    )?;

    let id = payload
        .get("id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map_or_else(|| format!("{provider}-{index}"), String::from);
    let id = EventId::new(id).map_err(|e| malformed(index, "id", "", &e.to_string()))?;

    let title = extracted
        .title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(UNTITLED);
    let category = resolve_category(extracted.explicit_category, title, extracted.attendees);

    let event = Event::new(id, start, end).map_err(|_| {
        malformed(
            index,
            "end",
            &end.to_rfc3339(),
            "is not after the start time",
        )
    })?;

    Ok(event
        .with_title(title)
        .with_category(category)
        .with_attendees(extracted.attendees)
        .with_importance(extracted.importance))
}

fn extract_google(payload: &Value) -> Result<Extracted<'_>, SkipReason> {
    if payload.get("status").and_then(Value::as_str) == Some("cancelled") {
        return Err(SkipReason::Cancelled);
    }
    let start = payload
        .get("start")
        .ok_or(SkipReason::MissingTime { field: "start" })?;
    let end = payload
        .get("end")
        .ok_or(SkipReason::MissingTime { field: "end" })?;
    if start.get("date").is_some() && start.get("dateTime").is_none() {
        return Err(SkipReason::AllDay);
    }
    let start_time = start
        .get("dateTime")
        .ok_or(SkipReason::MissingTime { field: "start" })?;
    let end_time = end
        .get("dateTime")
        .ok_or(SkipReason::MissingTime { field: "end" })?;

    Ok(Extracted {
        start: start_time,
        end: end_time,
        start_zone: None,
        end_zone: None,
        title: payload.get("summary").and_then(Value::as_str),
        attendees: count_attendees(payload.get("attendees")),
        importance: Importance::Normal,
        explicit_category: None,
    })
}

fn extract_outlook(payload: &Value) -> Result<Extracted<'_>, SkipReason> {
    if payload.get("isCancelled").and_then(Value::as_bool) == Some(true) {
        return Err(SkipReason::Cancelled);
    }
    if payload.get("isAllDay").and_then(Value::as_bool) == Some(true) {
        return Err(SkipReason::AllDay);
    }
    let start = payload
        .get("start")
        .ok_or(SkipReason::MissingTime { field: "start" })?;
    let end = payload
        .get("end")
        .ok_or(SkipReason::MissingTime { field: "end" })?;

    Ok(Extracted {
        start: start
            .get("dateTime")
            .ok_or(SkipReason::MissingTime { field: "start" })?,
        end: end
            .get("dateTime")
            .ok_or(SkipReason::MissingTime { field: "end" })?,
        start_zone: start.get("timeZone").and_then(Value::as_str),
        end_zone: end.get("timeZone").and_then(Value::as_str),
        title: payload.get("subject").and_then(Value::as_str),
        attendees: count_attendees(payload.get("attendees")),
        importance: payload
            .get("importance")
            .and_then(Value::as_str)
            .map_or(Importance::Normal, Importance::from_provider),
        explicit_category: None,
    })
}

fn extract_custom(payload: &Value) -> Result<Extracted<'_>, SkipReason> {
    if payload.get("status").and_then(Value::as_str) == Some("cancelled") {
        return Err(SkipReason::Cancelled);
    }
    if payload.get("is_all_day").and_then(Value::as_bool) == Some(true) {
        return Err(SkipReason::AllDay);
    }
    let start = non_null(payload.get("start")).ok_or(SkipReason::MissingTime { field: "start" })?;
    let end = non_null(payload.get("end")).ok_or(SkipReason::MissingTime { field: "end" })?;

    let attendees = match payload.get("attendees") {
        Some(Value::Number(n)) => n.as_u64().map_or(0, saturating_u32),
        Some(list @ Value::Array(_)) => count_attendees(Some(list)),
        _ => payload
            .get("participants")
            .and_then(Value::as_u64)
            .map_or(0, saturating_u32),
    };

    Ok(Extracted {
        start,
        end,
        start_zone: None,
        end_zone: None,
        title: payload
            .get("title")
            .or_else(|| payload.get("summary"))
            .and_then(Value::as_str),
        attendees,
        importance: payload
            .get("importance")
            .and_then(Value::as_str)
            .map_or(Importance::Normal, Importance::from_provider),
        explicit_category: ["category", "type", "event_type"]
            .iter()
            .find_map(|key| payload.get(*key).and_then(Value::as_str)),
    })
}

fn non_null(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn count_attendees(value: Option<&Value>) -> u32 {
    value
        .and_then(Value::as_array)
        .map_or(0, |list| saturating_u32(list.len() as u64))
}

fn saturating_u32(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn resolve_category(explicit: Option<&str>, title: &str, attendees: u32) -> EventCategory {
    if let Some(raw) = explicit {
        match raw.parse::<EventCategory>() {
            Ok(category) => return category,
            Err(e) => tracing::debug!(error = %e, "falling back to inferred category"),
        }
    }
    category_from_title(title).unwrap_or(if attendees > 1 {
        EventCategory::Meeting
    } else {
        EventCategory::Personal
    })
}

fn parse_time(
    index: usize,
    field: &'static str,
    raw: &Value,
    zone: Option<&str>,
    default_offset: FixedOffset,
) -> Result<DateTime<Utc>, SkipReason> {
    let Some(text) = raw.as_str() else {
        return Err(malformed(
            index,
            field,
            &raw.to_string(),
            "is not a string",
        ));
    };
    let offset = match zone {
        Some(z) if is_utc_zone(z) => Utc.fix(),
        _ => default_offset,
    };
    parse_timestamp(text, offset).ok_or_else(|| {
        let message = if NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").is_ok() {
            "is a date without a time"
        } else {
            "is not a recognised timestamp"
        };
        malformed(index, field, text, message)
    })
}

fn is_utc_zone(zone: &str) -> bool {
    matches!(
        zone.trim().to_ascii_uppercase().as_str(),
        "UTC" | "ETC/UTC" | "Z" | "GMT"
    )
}

/// Parses RFC 3339, or a naive local timestamp interpreted at `offset`.
pub fn parse_timestamp(text: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .and_then(|naive| offset.from_local_datetime(&naive).single())
        .map(|dt| dt.with_timezone(&Utc))
}

fn malformed(index: usize, field: &'static str, value: &str, message: &str) -> SkipReason {
    SkipReason::Malformed {
        error: MalformedEventError {
            index,
            field,
            value: value.to_string(),
            message: message.to_string(),
        },
    }
}
