//! Cognitive load estimation.
//!
//! The scorer walks the analysis window in fixed buckets. For each bucket it
//! measures a handful of features over the trailing interval ending at the
//! bucket's end, then sums a table of weighted rules. Each rule is a pure
//! function from those features to a value in \[0, 1\], so rules can be
//! tested and re-weighted independently.
//!
//! # Rules
//!
//! | Rule                | Raw value                                   |
//! |---------------------|---------------------------------------------|
//! | `meeting_density`   | busy minutes / trailing window              |
//! | `back_to_back`      | back-to-back transitions / saturation       |
//! | `cumulative_load`   | meeting minutes since window start / saturation |
//! | `attendee_load`     | overlap-weighted log2 attendee count        |
//! | `recovery_deficit`  | missing recovery minutes / saturation       |
//! | `content_intensity` | overlap-weighted title/importance intensity |
//! | `circadian`         | time-of-day penalty × busy fraction         |
//!
//! The weighted sum is then scaled by the previous day's carryover and by a
//! per-weekday factor.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::event::{Event, Importance};
use crate::keywords::{TitleIntensity, meeting_cadence, title_intensity};
use crate::types::LoadScore;
use crate::window::AnalysisWindow;

/// Previous-day load decays by this much before it carries over.
const CARRYOVER_DECAY: f64 = 0.7;

/// Upper bound on the carryover multiplier.
const CARRYOVER_CAP: f64 = 1.5;

pub(crate) const LUNCH_START_MINUTE: u32 = 11 * 60 + 30;
pub(crate) const LUNCH_END_MINUTE: u32 = 13 * 60 + 30;
const EARLY_END_MINUTE: u32 = 9 * 60;
const LATE_START_MINUTE: u32 = 17 * 60;

/// A heuristic that contributes to the load score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressRule {
    MeetingDensity,
    BackToBack,
    CumulativeLoad,
    AttendeeLoad,
    RecoveryDeficit,
    ContentIntensity,
    Circadian,
}

impl StressRule {
    pub const ALL: [Self; 7] = [
        Self::MeetingDensity,
        Self::BackToBack,
        Self::CumulativeLoad,
        Self::AttendeeLoad,
        Self::RecoveryDeficit,
        Self::ContentIntensity,
        Self::Circadian,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MeetingDensity => "meeting_density",
            Self::BackToBack => "back_to_back",
            Self::CumulativeLoad => "cumulative_load",
            Self::AttendeeLoad => "attendee_load",
            Self::RecoveryDeficit => "recovery_deficit",
            Self::ContentIntensity => "content_intensity",
            Self::Circadian => "circadian",
        }
    }

    /// Raw rule value in \[0, 1\] for a feature set.
    pub fn evaluate(self, features: &LoadFeatures, config: &ScoringConfig) -> f64 {
        let raw = match self {
            Self::MeetingDensity => features.busy_minutes / features.trailing_minutes,
            Self::BackToBack => {
                f64::from(features.back_to_back_transitions)
                    / f64::from(config.back_to_back_saturation)
            }
            Self::CumulativeLoad => {
                features.cumulative_minutes / f64::from(config.cumulative_saturation_minutes)
            }
            Self::AttendeeLoad => features.attendee_load,
            Self::RecoveryDeficit => {
                features.recovery_deficit_minutes
                    / f64::from(config.recovery_deficit_saturation_minutes)
            }
            Self::ContentIntensity => features.content_intensity,
            Self::Circadian => features.circadian,
        };
        if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) }
    }
}

impl fmt::Display for StressRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of the rule table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedRule {
    pub rule: StressRule,
    pub weight: f64,
}

/// Parameters of the load model. All values are calibration defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Length of each load sample. Default: 15.
    pub bucket_minutes: u32,
    /// How far back each sample looks. Default: 120.
    pub trailing_window_minutes: u32,
    /// Gaps at or below this are back-to-back. Default: 10.
    pub back_to_back_gap_minutes: u32,
    /// Transitions in the trailing window that max out the rule. Default: 2.
    pub back_to_back_saturation: u32,
    /// Meeting minutes since window start that max out the rule. Default: 360.
    pub cumulative_saturation_minutes: u32,
    /// Attendee count that maxes out the rule. Default: 16.
    pub attendee_saturation: u32,
    /// Missing recovery minutes that max out the rule. Default: 30.
    pub recovery_deficit_saturation_minutes: u32,
    /// Weight of the previous day's peak in the carryover multiplier. Default: 0.25.
    pub carryover_weight: f64,
    /// Multiplier on the whole curve by local weekday. Default: 1.0 every day.
    pub weekday_factors: WeekdayFactors,
    /// The weighted rule table, evaluated in order.
    pub rules: Vec<WeightedRule>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            bucket_minutes: 15,
            trailing_window_minutes: 120,
            back_to_back_gap_minutes: 10,
            back_to_back_saturation: 2,
            cumulative_saturation_minutes: 360,
            attendee_saturation: 16,
            recovery_deficit_saturation_minutes: 30,
            carryover_weight: 0.25,
            weekday_factors: WeekdayFactors::default(),
            rules: default_rules(),
        }
    }
}

fn default_rules() -> Vec<WeightedRule> {
    [
        (StressRule::MeetingDensity, 0.35),
        (StressRule::BackToBack, 0.20),
        (StressRule::CumulativeLoad, 0.15),
        (StressRule::AttendeeLoad, 0.10),
        (StressRule::RecoveryDeficit, 0.10),
        (StressRule::ContentIntensity, 0.05),
        (StressRule::Circadian, 0.05),
    ]
    .into_iter()
    .map(|(rule, weight)| WeightedRule { rule, weight })
    .collect()
}

/// Load multiplier for each day of the week.
///
/// A start-of-week slump is usually modelled as `monday = 1.2` and
/// `friday = 0.9`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeekdayFactors {
    pub monday: f64,
    pub tuesday: f64,
    pub wednesday: f64,
    pub thursday: f64,
    pub friday: f64,
    pub saturday: f64,
    pub sunday: f64,
}

impl Default for WeekdayFactors {
    fn default() -> Self {
        Self {
            monday: 1.0,
            tuesday: 1.0,
            wednesday: 1.0,
            thursday: 1.0,
            friday: 1.0,
            saturday: 1.0,
            sunday: 1.0,
        }
    }
}

impl WeekdayFactors {
    pub const fn factor(&self, day: Weekday) -> f64 {
        match day {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }

    pub const fn entries(&self) -> [(Weekday, f64); 7] {
        [
            (Weekday::Mon, self.monday),
            (Weekday::Tue, self.tuesday),
            (Weekday::Wed, self.wednesday),
            (Weekday::Thu, self.thursday),
            (Weekday::Fri, self.friday),
            (Weekday::Sat, self.saturday),
            (Weekday::Sun, self.sunday),
        ]
    }
}

/// Measurements over one trailing interval.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoadFeatures {
    pub trailing_minutes: f64,
    pub busy_minutes: f64,
    pub back_to_back_transitions: u32,
    pub recovery_deficit_minutes: f64,
    pub cumulative_minutes: f64,
    pub attendee_load: f64,
    pub content_intensity: f64,
    pub circadian: f64,
}

/// Load estimate for one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoadSample {
    /// Start of the bucket.
    pub timestamp: DateTime<Utc>,
    pub score: LoadScore,
    /// Rule with the largest weighted contribution, if any contributed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<StressRule>,
}

/// Contiguous load samples covering an analysis window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadCurve {
    pub bucket_minutes: u32,
    window_end: DateTime<Utc>,
    pub samples: Vec<LoadSample>,
}

impl LoadCurve {
    /// End of the bucket that starts at `sample.timestamp`.
    pub fn bucket_end(&self, sample: &LoadSample) -> DateTime<Utc> {
        (sample.timestamp + Duration::minutes(i64::from(self.bucket_minutes))).min(self.window_end)
    }

    /// Whether samples are strictly increasing and each starts where the
    /// previous bucket ended.
    pub fn is_contiguous(&self) -> bool {
        self.samples
            .windows(2)
            .all(|pair| pair[0].timestamp < pair[1].timestamp && self.bucket_end(&pair[0]) == pair[1].timestamp)
    }

    pub fn peak(&self) -> LoadScore {
        self.samples
            .iter()
            .map(|s| s.score)
            .fold(LoadScore::ZERO, |acc, s| if s > acc { s } else { acc })
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "sample counts are far below f64 precision limits"
    )]
    pub fn mean(&self) -> LoadScore {
        if self.samples.is_empty() {
            return LoadScore::ZERO;
        }
        let total: f64 = self.samples.iter().map(|s| s.score.value()).sum();
        LoadScore::clamped(total / self.samples.len() as f64)
    }
}

/// Scores `events` over `window`.
///
/// Only load-bearing events (meetings) are considered. `previous_peak` is
/// the previous day's peak load, if known; it scales the whole curve up by
/// at most 50%. The weekday factor for the window's local start date
/// applies on top.
pub fn score_load(
    events: &[Event],
    window: &AnalysisWindow,
    config: &ScoringConfig,
    previous_peak: Option<LoadScore>,
) -> LoadCurve {
    let mut meetings: Vec<&Event> = events
        .iter()
        .filter(|e| e.category().is_load_bearing())
        .collect();
    meetings.sort_by_key(|e| (e.start(), e.end()));

    let bucket = Duration::minutes(i64::from(config.bucket_minutes.max(1)));
    let carryover = carryover_multiplier(previous_peak, config.carryover_weight);
    let weekday = window.local_date(window.start()).weekday();
    let day_factor = config.weekday_factors.factor(weekday);
    let multiplier = carryover * day_factor;

    let mut samples = Vec::new();
    let mut timestamp = window.start();
    while timestamp < window.end() {
        let bucket_end = (timestamp + bucket).min(window.end());
        let features = measure(&meetings, window, config, bucket_end);
        let (score, cause) = combine(&features, config, multiplier);
        samples.push(LoadSample {
            timestamp,
            score,
            cause,
        });
        timestamp = bucket_end;
    }

    tracing::debug!(
        meetings = meetings.len(),
        samples = samples.len(),
        carryover,
        %weekday,
        day_factor,
        "scored load curve"
    );

    LoadCurve {
        bucket_minutes: config.bucket_minutes.max(1),
        window_end: window.end(),
        samples,
    }
}

fn carryover_multiplier(previous_peak: Option<LoadScore>, weight: f64) -> f64 {
    previous_peak.map_or(1.0, |peak| {
        (1.0 + weight * peak.value() * CARRYOVER_DECAY).min(CARRYOVER_CAP)
    })
}

fn combine(
    features: &LoadFeatures,
    config: &ScoringConfig,
    multiplier: f64,
) -> (LoadScore, Option<StressRule>) {
    let mut total = 0.0;
    let mut cause: Option<(StressRule, f64)> = None;
    for row in &config.rules {
        let contribution = row.weight * row.rule.evaluate(features, config);
        total += contribution;
        if contribution > 0.0 && cause.is_none_or(|(_, best)| contribution > best) {
            cause = Some((row.rule, contribution));
        }
    }
    let score = LoadScore::clamped(LoadScore::clamped(total).value() * multiplier);
    (score, cause.map(|(rule, _)| rule))
}

/// Measures features over `(bucket_end - trailing, bucket_end]`.
///
/// `meetings` must be sorted by start.
pub fn measure(
    meetings: &[&Event],
    window: &AnalysisWindow,
    config: &ScoringConfig,
    bucket_end: DateTime<Utc>,
) -> LoadFeatures {
    let trailing = Duration::minutes(i64::from(config.trailing_window_minutes.max(1)));
    let from = bucket_end - trailing;
    let trailing_minutes = minutes(trailing);

    let busy_minutes = merged_minutes(meetings, from, bucket_end);
    let cumulative_minutes = merged_minutes(meetings, window.start(), bucket_end);

    let mut back_to_back_transitions = 0;
    let mut recovery_deficit_minutes = 0.0;
    let b2b_gap = Duration::minutes(i64::from(config.back_to_back_gap_minutes));
    for transition in transitions(meetings) {
        let boundary = transition.next.start();
        if boundary <= from || boundary > bucket_end {
            continue;
        }
        if transition.gap <= b2b_gap {
            back_to_back_transitions += 1;
        }
        let required = required_recovery_minutes(transition.previous);
        recovery_deficit_minutes += (required - minutes(transition.gap)).max(0.0);
    }

    let mut overlap_total = 0.0;
    let mut attendee_sum = 0.0;
    let mut intensity_sum = 0.0;
    for meeting in meetings {
        let overlap = minutes(meeting.overlap_with(from, bucket_end));
        if overlap <= 0.0 {
            continue;
        }
        overlap_total += overlap;
        attendee_sum += overlap * attendee_factor(meeting.attendee_count(), config);
        intensity_sum += overlap * content_weight(meeting);
    }
    let (attendee_load, content_intensity) = if overlap_total > 0.0 {
        (attendee_sum / overlap_total, intensity_sum / overlap_total)
    } else {
        (0.0, 0.0)
    };

    let circadian =
        circadian_penalty(window.local_minute_of_day(bucket_end)) * busy_minutes / trailing_minutes;

    LoadFeatures {
        trailing_minutes,
        busy_minutes,
        back_to_back_transitions,
        recovery_deficit_minutes,
        cumulative_minutes,
        attendee_load,
        content_intensity,
        circadian,
    }
}

/// A move from one busy run to the next meeting.
#[derive(Debug)]
pub(crate) struct Transition<'a> {
    /// The meeting whose end closed the previous run.
    pub previous: &'a Event,
    pub next: &'a Event,
    pub gap: Duration,
}

/// Transitions between busy runs of `meetings`, which must be sorted by start.
///
/// A meeting that starts before the current run ends joins the run, so
/// nested and overlapping meetings never count as a transition.
pub(crate) fn transitions<'a>(meetings: &[&'a Event]) -> Vec<Transition<'a>> {
    let mut found = Vec::new();
    let mut latest: Option<&'a Event> = None;
    for &meeting in meetings {
        latest = match latest {
            Some(previous) if meeting.start() < previous.end() => {
                Some(if meeting.end() > previous.end() { meeting } else { previous })
            }
            Some(previous) => {
                found.push(Transition {
                    previous,
                    next: meeting,
                    gap: meeting.start() - previous.end(),
                });
                Some(meeting)
            }
            None => Some(meeting),
        };
    }
    found
}

/// Minutes of recovery a meeting calls for before the next one.
pub fn required_recovery_minutes(meeting: &Event) -> f64 {
    f64::from(required_recovery(meeting))
}

pub(crate) fn required_recovery(meeting: &Event) -> u32 {
    let base = match meeting.attendee_count() {
        0..=2 => 5,
        3..=5 => 8,
        _ => 12,
    };
    if meeting_intensity(meeting) >= 1.0 {
        base + 3
    } else {
        base
    }
}

/// Title intensity scaled by how routine the meeting looks, capped at 1.
fn content_weight(meeting: &Event) -> f64 {
    (meeting_intensity(meeting) * meeting_cadence(meeting.title()).factor()).min(1.0)
}

fn meeting_intensity(meeting: &Event) -> f64 {
    if meeting.importance() == Importance::High {
        TitleIntensity::High.weight()
    } else {
        title_intensity(meeting.title()).weight()
    }
}

fn attendee_factor(attendees: u32, config: &ScoringConfig) -> f64 {
    let saturation = f64::from(config.attendee_saturation.max(2)).log2();
    (f64::from(attendees.max(2)).log2() / saturation).min(1.0)
}

/// Penalty for the local time of day: early, late, and lunch hours.
pub const fn circadian_penalty(minute_of_day: u32) -> f64 {
    if minute_of_day < EARLY_END_MINUTE || minute_of_day >= LATE_START_MINUTE {
        1.0
    } else if minute_of_day >= LUNCH_START_MINUTE && minute_of_day <= LUNCH_END_MINUTE {
        0.6
    } else {
        0.0
    }
}

/// Total minutes covered by the union of `meetings` clipped to `[from, to]`.
fn merged_minutes(meetings: &[&Event], from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let mut total = Duration::zero();
    let mut run: Option<(DateTime<Utc>, DateTime<Utc>)> = None;
    for meeting in meetings {
        let start = meeting.start().max(from);
        let end = meeting.end().min(to);
        if end <= start {
            continue;
        }
        run = match run {
            Some((run_start, run_end)) if start <= run_end => Some((run_start, run_end.max(end))),
            Some((run_start, run_end)) => {
                total += run_end - run_start;
                Some((start, end))
            }
            None => Some((start, end)),
        };
    }
    if let Some((run_start, run_end)) = run {
        total += run_end - run_start;
    }
    minutes(total)
}

#[expect(
    clippy::cast_precision_loss,
    reason = "durations within a day fit exactly in f64"
)]
fn minutes(duration: Duration) -> f64 {
    duration.num_seconds() as f64 / 60.0
}
