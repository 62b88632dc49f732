//! Analysis configuration and its validation.

use std::collections::HashSet;

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::optimize::InterventionCap;
use crate::recommend::{Activity, ActivityCatalog};
use crate::stress::{ScoringConfig, StressRule};

const MAX_OFFSET_MINUTES: i32 = 24 * 60 - 1;

/// A configuration value that would make the analysis meaningless.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("weight for rule {rule} must be a non-negative number, got {weight}")]
    InvalidWeight { rule: StressRule, weight: f64 },

    #[error("threshold for activity {activity} must be between 0.0 and 1.0, got {threshold}")]
    InvalidThreshold { activity: Activity, threshold: f64 },

    #[error("carryover weight must be a non-negative number, got {weight}")]
    InvalidCarryover { weight: f64 },

    #[error("factor for {day} must be a non-negative number, got {factor}")]
    InvalidWeekdayFactor { day: Weekday, factor: f64 },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} must be at least {min}")]
    TooSmall { field: &'static str, min: u32 },

    #[error("day end {end} must be after day start {start}")]
    DayBounds { start: NaiveTime, end: NaiveTime },

    #[error("UTC offset must be within ±24h, got {minutes} minutes")]
    OffsetOutOfRange { minutes: i32 },

    #[error("activity {activity} has min_minutes {min} above preferred_minutes {preferred}")]
    ActivityDuration {
        activity: Activity,
        min: u32,
        preferred: u32,
    },

    #[error("activity {activity} is listed more than once")]
    DuplicateActivity { activity: Activity },
}

/// Everything the pipeline needs besides the calendar itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Shortest gap worth recommending a break in. Default: 15.
    pub min_slot_minutes: u32,
    /// Local start of the working day. Default: 08:00.
    pub day_start: NaiveTime,
    /// Local end of the working day. Default: 18:00.
    pub day_end: NaiveTime,
    /// Offset of local time from UTC. Default: 0.
    pub utc_offset_minutes: i32,
    pub scoring: ScoringConfig,
    pub activities: ActivityCatalog,
    pub cap: InterventionCap,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_slot_minutes: 15,
            day_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            day_end: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
            utc_offset_minutes: 0,
            scoring: ScoringConfig::default(),
            activities: ActivityCatalog::default(),
            cap: InterventionCap {
                max_count: Some(6),
                max_minutes: Some(60),
            },
        }
    }
}

impl AnalysisConfig {
    /// Checks every field, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.min_slot_minutes == 0 {
            return Err(ConfigurationError::Zero {
                field: "min_slot_minutes",
            });
        }
        if self.day_end <= self.day_start {
            return Err(ConfigurationError::DayBounds {
                start: self.day_start,
                end: self.day_end,
            });
        }
        if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&self.utc_offset_minutes) {
            return Err(ConfigurationError::OffsetOutOfRange {
                minutes: self.utc_offset_minutes,
            });
        }
        validate_scoring(&self.scoring)?;
        validate_catalog(&self.activities)
    }
}

fn validate_scoring(scoring: &ScoringConfig) -> Result<(), ConfigurationError> {
    let positive = [
        ("scoring.bucket_minutes", scoring.bucket_minutes),
        (
            "scoring.trailing_window_minutes",
            scoring.trailing_window_minutes,
        ),
        (
            "scoring.back_to_back_saturation",
            scoring.back_to_back_saturation,
        ),
        (
            "scoring.cumulative_saturation_minutes",
            scoring.cumulative_saturation_minutes,
        ),
        (
            "scoring.recovery_deficit_saturation_minutes",
            scoring.recovery_deficit_saturation_minutes,
        ),
    ];
    if let Some((field, _)) = positive.iter().find(|(_, value)| *value == 0) {
        return Err(ConfigurationError::Zero { field: *field });
    }
    if scoring.attendee_saturation < 2 {
        return Err(ConfigurationError::TooSmall {
            field: "scoring.attendee_saturation",
            min: 2,
        });
    }
    if !(scoring.carryover_weight >= 0.0 && scoring.carryover_weight.is_finite()) {
        return Err(ConfigurationError::InvalidCarryover {
            weight: scoring.carryover_weight,
        });
    }
    for (day, factor) in scoring.weekday_factors.entries() {
        if !(factor >= 0.0 && factor.is_finite()) {
            return Err(ConfigurationError::InvalidWeekdayFactor { day, factor });
        }
    }
    for row in &scoring.rules {
        if !(row.weight >= 0.0 && row.weight.is_finite()) {
            return Err(ConfigurationError::InvalidWeight {
                rule: row.rule,
                weight: row.weight,
            });
        }
    }
    Ok(())
}

fn validate_catalog(catalog: &ActivityCatalog) -> Result<(), ConfigurationError> {
    let mut seen = HashSet::new();
    for profile in &catalog.profiles {
        if !seen.insert(profile.activity) {
            return Err(ConfigurationError::DuplicateActivity {
                activity: profile.activity,
            });
        }
        if !(0.0..=1.0).contains(&profile.threshold) {
            return Err(ConfigurationError::InvalidThreshold {
                activity: profile.activity,
                threshold: profile.threshold,
            });
        }
        if profile.min_minutes == 0 {
            return Err(ConfigurationError::Zero {
                field: "activity min_minutes",
            });
        }
        if profile.min_minutes > profile.preferred_minutes {
            return Err(ConfigurationError::ActivityDuration {
                activity: profile.activity,
                min: profile.min_minutes,
                preferred: profile.preferred_minutes,
            });
        }
    }
    Ok(())
}
