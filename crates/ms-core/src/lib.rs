//! Core domain logic for calendar stress analysis.
//!
//! This crate contains the fundamental types and logic for:
//! - Normalization: turning Google, Outlook, and custom calendar JSON into events
//! - Scoring: estimating cognitive load over the day with weighted rules
//! - Planning: finding free slots, choosing break activities, and capping the plan
//!
//! [`analyze`] runs the whole pipeline for one subject and window.

pub mod category;
pub mod config;
pub mod event;
mod keywords;
pub mod normalize;
pub mod optimize;
pub mod pipeline;
pub mod recommend;
pub mod slots;
pub mod stress;
pub mod summary;
pub mod types;
pub mod window;

pub use category::{EventCategory, UnknownCategory};
pub use config::{AnalysisConfig, ConfigurationError};
pub use event::{Event, Importance, sort_events};
pub use keywords::{MeetingCadence, TitleIntensity, meeting_cadence, title_intensity};
pub use normalize::{
    MalformedEventError, NormalizeError, NormalizeOptions, NormalizedCalendar, Provider,
    RawEventRecord, SkipReason, SkippedRecord, detect_provider, normalize_calendar,
    normalize_records,
};
pub use optimize::{Intervention, InterventionCap, InterventionPlan, optimize_plan};
pub use pipeline::{Analysis, AnalysisError, AnalysisRequest, analyze, analyze_events};
pub use recommend::{
    Activity, ActivityCatalog, ActivityProfile, Rationale, Recommendation, select_recommendation,
};
pub use slots::{FreeSlot, find_free_slots};
pub use stress::{
    LoadCurve, LoadSample, ScoringConfig, StressRule, WeekdayFactors, WeightedRule, score_load,
};
pub use summary::{DaySummary, MeetingAnalysis, StressLevel, Tip, schedule_tips};
pub use types::{EventId, LoadScore, SubjectId, ValidationError};
pub use window::AnalysisWindow;
