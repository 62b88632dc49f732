//! The bounded time range an analysis covers.

use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Timelike, Utc,
};
use serde::Serialize;

use crate::types::ValidationError;

const MAX_OFFSET_MINUTES: i32 = 24 * 60 - 1;

/// Analysis window: `[start, end)` plus the UTC offset used for
/// local-time rules such as lunch and late-day penalties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalysisWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    utc_offset_minutes: i32,
}

impl AnalysisWindow {
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        utc_offset_minutes: i32,
    ) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::EmptyWindow);
        }
        if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&utc_offset_minutes) {
            return Err(ValidationError::OffsetOutOfRange {
                minutes: utc_offset_minutes,
            });
        }
        Ok(Self {
            start,
            end,
            utc_offset_minutes,
        })
    }

    /// Builds the window for one local day between `day_start` and `day_end`.
    pub fn for_day(
        date: NaiveDate,
        day_start: NaiveTime,
        day_end: NaiveTime,
        utc_offset_minutes: i32,
    ) -> Result<Self, ValidationError> {
        let offset = offset_from_minutes(utc_offset_minutes)?;
        let start = local_to_utc(&offset, date, day_start)?;
        let end = local_to_utc(&offset, date, day_end)?;
        Self::new(start, end, utc_offset_minutes)
    }

    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub const fn utc_offset_minutes(&self) -> i32 {
        self.utc_offset_minutes
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    /// Minutes since local midnight for an instant, in this window's offset.
    pub fn local_minute_of_day(&self, instant: DateTime<Utc>) -> u32 {
        let offset = offset_from_minutes(self.utc_offset_minutes).unwrap_or_else(|_| Utc.fix());
        let local = instant.with_timezone(&offset);
        local.hour() * 60 + local.minute()
    }

    /// The local calendar date an instant falls on, in this window's offset.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        let offset = offset_from_minutes(self.utc_offset_minutes).unwrap_or_else(|_| Utc.fix());
        instant.with_timezone(&offset).date_naive()
    }
}

pub(crate) fn offset_from_minutes(minutes: i32) -> Result<FixedOffset, ValidationError> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or(ValidationError::OffsetOutOfRange { minutes })
}

fn local_to_utc(
    offset: &FixedOffset,
    date: NaiveDate,
    time: NaiveTime,
) -> Result<DateTime<Utc>, ValidationError> {
    // Fixed offsets never produce gaps or folds.
    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or(ValidationError::EmptyWindow)
}
