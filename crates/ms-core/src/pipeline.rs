//! End-to-end analysis for one subject and window.
//!
//! The pipeline is a pure function of its inputs: normalize, score, find
//! slots, select, optimize, summarize. Nothing is cached between runs, so
//! independent requests can run on separate threads.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::{AnalysisConfig, ConfigurationError};
use crate::event::Event;
use crate::normalize::{NormalizeError, NormalizeOptions, SkippedRecord, normalize_calendar};
use crate::optimize::{InterventionPlan, optimize_plan};
use crate::recommend::select_recommendation;
use crate::slots::{FreeSlot, find_free_slots};
use crate::stress::{LoadCurve, score_load};
use crate::summary::{DaySummary, summarize};
use crate::types::{LoadScore, SubjectId, ValidationError};
use crate::window::AnalysisWindow;

/// Errors that abort a single analysis run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("failed to normalize calendar: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("invalid analysis window: {0}")]
    InvalidWindow(#[from] ValidationError),

    /// Scorer output was not strictly ordered and gap-free.
    #[error("load curve for {subject} is not contiguous")]
    UnorderedLoadCurve { subject: SubjectId },
}

/// Who and what to analyze.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub subject: SubjectId,
    pub window: AnalysisWindow,
    /// Peak load of the previous day, for carryover.
    pub previous_peak: Option<LoadScore>,
}

impl AnalysisRequest {
    pub const fn new(subject: SubjectId, window: AnalysisWindow) -> Self {
        Self {
            subject,
            window,
            previous_peak: None,
        }
    }

    /// Builds a request covering the configured working day on `date`.
    pub fn for_day(
        subject: SubjectId,
        date: NaiveDate,
        config: &AnalysisConfig,
    ) -> Result<Self, AnalysisError> {
        let window = AnalysisWindow::for_day(
            date,
            config.day_start,
            config.day_end,
            config.utc_offset_minutes,
        )?;
        Ok(Self::new(subject, window))
    }

    #[must_use]
    pub const fn with_previous_peak(mut self, peak: Option<LoadScore>) -> Self {
        self.previous_peak = peak;
        self
    }
}

/// Result of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub subject: SubjectId,
    pub window: AnalysisWindow,
    pub load_curve: LoadCurve,
    pub slots: Vec<FreeSlot>,
    pub plan: InterventionPlan,
    pub summary: DaySummary,
    /// Records dropped during normalization.
    pub skipped: Vec<SkippedRecord>,
}

/// Analyzes a raw provider document.
pub fn analyze(
    request: &AnalysisRequest,
    calendar: &Value,
    config: &AnalysisConfig,
) -> Result<Analysis, AnalysisError> {
    config.validate()?;

    let options = NormalizeOptions {
        default_utc_offset_minutes: request.window.utc_offset_minutes(),
    };
    let normalized = normalize_calendar(calendar, &options)?;
    if !normalized.skipped.is_empty() {
        tracing::debug!(
            subject = %request.subject,
            skipped = normalized.skipped.len(),
            malformed = normalized.malformed_count(),
            "some calendar records were skipped"
        );
    }

    let mut analysis = analyze_events(request, &normalized.events, config)?;
    analysis.skipped = normalized.skipped;
    Ok(analysis)
}

/// Analyzes events that are already normalized.
pub fn analyze_events(
    request: &AnalysisRequest,
    events: &[Event],
    config: &AnalysisConfig,
) -> Result<Analysis, AnalysisError> {
    config.validate()?;
    let window = &request.window;

    let load_curve = score_load(events, window, &config.scoring, request.previous_peak);
    if !load_curve.is_contiguous() {
        return Err(AnalysisError::UnorderedLoadCurve {
            subject: request.subject.clone(),
        });
    }

    let slots = find_free_slots(events, window, config.min_slot_minutes);
    let candidates: Vec<_> = slots
        .iter()
        .filter_map(|slot| select_recommendation(slot, &load_curve, &config.activities))
        .collect();
    let plan = optimize_plan(&candidates, &config.cap);
    let summary = summarize(events, window, &load_curve, &config.scoring);

    tracing::info!(
        subject = %request.subject,
        events = events.len(),
        slots = slots.len(),
        candidates = candidates.len(),
        planned = plan.len(),
        peak = %summary.peak_load,
        level = %summary.level,
        "analysis complete"
    );

    Ok(Analysis {
        subject: request.subject.clone(),
        window: *window,
        load_curve,
        slots,
        plan,
        summary,
        skipped: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::InterventionCap;
    use crate::recommend::{Activity, Rationale};
    use crate::stress::StressRule;
    use crate::summary::StressLevel;
    use chrono::{DateTime, NaiveTime, TimeZone, Utc};
    use serde_json::json;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 27, hour, minute, 0).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 27).unwrap()
    }

    fn morning_config() -> AnalysisConfig {
        AnalysisConfig {
            min_slot_minutes: 20,
            day_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            day_end: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
            cap: InterventionCap::default(),
            ..AnalysisConfig::default()
        }
    }

    fn morning_calendar() -> Value {
        json!({
            "events": [
                {"id": "a", "title": "Architecture sync", "start": "2025-01-27T09:00:00Z",
                 "end": "2025-01-27T10:00:00Z", "attendees": 5},
                {"id": "b", "title": "Pairing", "start": "2025-01-27T10:00:00Z",
                 "end": "2025-01-27T11:30:00Z", "attendees": 2, "category": "meeting"},
                {"id": "c", "title": "All hands", "start": "2025-01-27T12:00:00Z",
                 "end": "2025-01-27T13:00:00Z", "attendees": 8, "category": "meeting"}
            ]
        })
    }

    fn request(config: &AnalysisConfig) -> AnalysisRequest {
        AnalysisRequest::for_day(SubjectId::new("alice").unwrap(), date(), config).unwrap()
    }

    #[test]
    fn busy_morning_gets_one_movement_break() {
        let config = morning_config();
        let analysis = analyze(&request(&config), &morning_calendar(), &config).unwrap();

        let spans: Vec<_> = analysis.slots.iter().map(|s| (s.start(), s.end())).collect();
        assert_eq!(spans, vec![(at(11, 30), at(12, 0))]);

        assert_eq!(analysis.plan.len(), 1);
        let rec = analysis.plan.interventions[0].recommendation;
        assert_eq!(rec.activity, Activity::Movement);
        assert_eq!(rec.rationale, Rationale::Rule(StressRule::MeetingDensity));
        assert!(rec.local_load.value() > 0.5);
        assert_eq!(analysis.summary.meetings.total, 3);
        assert_eq!(analysis.summary.level, StressLevel::High);
    }

    #[test]
    fn empty_calendar_yields_zero_curve_and_whole_window_slot() {
        let config = morning_config();
        let analysis = analyze(&request(&config), &json!({"events": []}), &config).unwrap();

        assert_eq!(analysis.load_curve.samples.len(), 16);
        assert!(
            analysis
                .load_curve
                .samples
                .iter()
                .all(|s| s.score == LoadScore::ZERO)
        );
        let spans: Vec<_> = analysis.slots.iter().map(|s| (s.start(), s.end())).collect();
        assert_eq!(spans, vec![(at(9, 0), at(13, 0))]);
        assert_eq!(analysis.summary.level, StressLevel::None);
    }

    #[test]
    fn invalid_configuration_is_rejected_before_normalizing() {
        let mut config = morning_config();
        config.activities.profiles[0].threshold = -1.0;
        let result = analyze(&request(&morning_config()), &json!("not a calendar"), &config);
        assert!(matches!(result, Err(AnalysisError::Configuration(_))));
    }

    #[test]
    fn unknown_document_fails_only_that_run() {
        let config = morning_config();
        let result = analyze(&request(&config), &json!({"rows": []}), &config);
        assert!(matches!(
            result,
            Err(AnalysisError::Normalize(NormalizeError::UnknownFormat))
        ));
    }

    #[test]
    fn malformed_records_are_reported_in_skipped() {
        let config = morning_config();
        let calendar = json!([
            {"id": "ok", "start": "2025-01-27T09:00:00Z", "end": "2025-01-27T10:00:00Z", "attendees": 3},
            {"id": "bad", "start": "tomorrow", "end": "2025-01-27T10:00:00Z"}
        ]);
        let analysis = analyze(&request(&config), &calendar, &config).unwrap();

        assert_eq!(analysis.summary.meetings.total, 1);
        assert_eq!(analysis.skipped.len(), 1);
        assert_eq!(analysis.skipped[0].id.as_deref(), Some("bad"));
    }

    #[test]
    fn inverted_day_is_an_invalid_window() {
        let config = AnalysisConfig {
            day_start: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
            day_end: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            ..AnalysisConfig::default()
        };
        let result = AnalysisRequest::for_day(SubjectId::new("bob").unwrap(), date(), &config);
        assert!(matches!(result, Err(AnalysisError::InvalidWindow(_))));
    }

    #[test]
    fn carryover_raises_the_curve() {
        let config = morning_config();
        let fresh = analyze(&request(&config), &morning_calendar(), &config).unwrap();
        let tired_request = request(&config).with_previous_peak(Some(LoadScore::MAX));
        let tired = analyze(&tired_request, &morning_calendar(), &config).unwrap();

        assert!(tired.summary.peak_load > fresh.summary.peak_load);
    }

    #[test]
    fn analysis_is_deterministic() {
        let config = morning_config();
        let first = analyze(&request(&config), &morning_calendar(), &config).unwrap();
        let second = analyze(&request(&config), &morning_calendar(), &config).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn analysis_echoes_subject_and_window() {
        let config = morning_config();
        let req = request(&config);
        let analysis = analyze(&req, &morning_calendar(), &config).unwrap();

        assert_eq!(analysis.subject.as_str(), "alice");
        assert_eq!(analysis.window, req.window);
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["subject"], "alice");
        assert!(json["plan"].is_array());
    }
}
