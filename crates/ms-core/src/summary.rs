//! Day-level rollups of meetings and load.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::event::{Event, Importance};
use crate::keywords::{TitleIntensity, title_intensity};
use crate::stress::{
    LUNCH_END_MINUTE, LUNCH_START_MINUTE, LoadCurve, ScoringConfig, required_recovery, transitions,
};
use crate::types::LoadScore;
use crate::window::AnalysisWindow;

/// Coarse band for the day's peak load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StressLevel {
    None,
    Low,
    Moderate,
    Elevated,
    High,
    Critical,
}

impl StressLevel {
    pub fn from_peak(peak: LoadScore) -> Self {
        match peak.value() {
            v if v <= 0.2 => Self::Low,
            v if v <= 0.4 => Self::Moderate,
            v if v <= 0.6 => Self::Elevated,
            v if v <= 0.8 => Self::High,
            _ => Self::Critical,
        }
    }
}

impl StressLevel {
    /// General advice for a day at this level.
    pub const fn advice(self) -> &'static [&'static str] {
        match self {
            Self::None => &[],
            Self::Low => &[
                "Your meeting load is manageable.",
                "Use the light day to tackle focused work.",
                "Offer to help colleagues with their workload.",
            ],
            Self::Moderate => &[
                "Your meeting load is moderate. Stay organized.",
                "Take short breaks between meetings when possible.",
                "Prepare agendas to make sessions more efficient.",
            ],
            Self::Elevated => &[
                "Consider rescheduling non-critical meetings.",
                "Take 5-10 minute breaks between meetings.",
                "Practice deep breathing between sessions.",
                "Stay hydrated and avoid caffeine overload.",
            ],
            Self::High => &[
                "Heavy meeting day. Prioritize ruthlessly.",
                "Cancel or delegate non-essential meetings.",
                "Block 15-minute breaks between back-to-back meetings.",
                "Consider declining lunch meetings to preserve energy.",
                "Prepare thoroughly to reduce in-meeting stress.",
            ],
            Self::Critical => &[
                "This schedule may lead to burnout.",
                "Reschedule or cancel non-urgent meetings now.",
                "Block recovery time after high-stress meetings.",
                "Consider working from home to cut commute stress.",
                "Talk with your manager about workload.",
                "Take 2-3 minute micro-breaks between every meeting.",
            ],
        }
    }
}

impl fmt::Display for StressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::Elevated => "elevated",
            Self::High => "high",
            Self::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Meeting statistics for the window.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MeetingAnalysis {
    pub total: usize,
    pub minutes: i64,
    pub back_to_back: usize,
    /// Recovery minutes missing across all transitions between busy runs.
    pub recovery_deficit_minutes: i64,
    /// Meetings starting in the local lunch window.
    pub lunch: usize,
    /// Meetings flagged high importance or with high-stress titles.
    pub high_stress: usize,
    pub first_start: Option<DateTime<Utc>>,
    pub last_end: Option<DateTime<Utc>>,
    pub longest_minutes: i64,
}

/// A schedule change suggested by the shape of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tip {
    AddBuffers,
    LongerRecovery,
    ProtectLunch,
    PrepareAgendas,
    Hydrate,
    DoNotDisturb,
    MorningMindfulness,
    CreativeWork,
}

impl Tip {
    pub const fn message(self) -> &'static str {
        match self {
            Self::AddBuffers => "Add 15-minute buffers between consecutive meetings",
            Self::LongerRecovery => "Schedule longer breaks after demanding meetings",
            Self::ProtectLunch => "Protect your lunch hour; move non-critical lunch meetings",
            Self::PrepareAgendas => "Prepare agendas in advance to reduce in-meeting stress",
            Self::Hydrate => "Set hydration reminders throughout the day",
            Self::DoNotDisturb => "Use Do Not Disturb between meetings to focus",
            Self::MorningMindfulness => "Start the day with 5 minutes of mindfulness",
            Self::CreativeWork => "Use this energy for creative or strategic work",
        }
    }
}

impl fmt::Display for Tip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

const MAX_TIPS: usize = 5;
const BACK_TO_BACK_TIP_MIN: usize = 2;
const RECOVERY_TIP_MINUTES: i64 = 15;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub peak_load: LoadScore,
    pub mean_load: LoadScore,
    pub level: StressLevel,
    pub meetings: MeetingAnalysis,
    pub advice: &'static [&'static str],
    pub tips: Vec<Tip>,
}

pub fn summarize(
    events: &[Event],
    window: &AnalysisWindow,
    curve: &LoadCurve,
    config: &ScoringConfig,
) -> DaySummary {
    let meetings = analyze_meetings(events, window, config);
    let peak_load = curve.peak();
    let level = if meetings.total == 0 {
        StressLevel::None
    } else {
        StressLevel::from_peak(peak_load)
    };
    let tips = schedule_tips(level, &meetings);
    DaySummary {
        peak_load,
        mean_load: curve.mean(),
        level,
        meetings,
        advice: level.advice(),
        tips,
    }
}

/// Up to five tips, most specific first.
pub fn schedule_tips(level: StressLevel, meetings: &MeetingAnalysis) -> Vec<Tip> {
    let mut tips = Vec::new();
    if meetings.back_to_back >= BACK_TO_BACK_TIP_MIN {
        tips.push(Tip::AddBuffers);
    }
    if meetings.recovery_deficit_minutes > RECOVERY_TIP_MINUTES {
        tips.push(Tip::LongerRecovery);
    }
    if meetings.lunch > 0 {
        tips.push(Tip::ProtectLunch);
    }
    if level >= StressLevel::High {
        tips.extend([Tip::PrepareAgendas, Tip::Hydrate, Tip::DoNotDisturb]);
    }
    if level >= StressLevel::Elevated {
        tips.push(Tip::MorningMindfulness);
    }
    if level <= StressLevel::Low {
        tips.push(Tip::CreativeWork);
    }
    tips.truncate(MAX_TIPS);
    tips
}

/// Counts meetings that overlap `window`.
pub fn analyze_meetings(
    events: &[Event],
    window: &AnalysisWindow,
    config: &ScoringConfig,
) -> MeetingAnalysis {
    let mut meetings: Vec<&Event> = events
        .iter()
        .filter(|e| e.category().is_load_bearing())
        .filter(|e| e.overlap_with(window.start(), window.end()) > Duration::zero())
        .collect();
    meetings.sort_by_key(|e| (e.start(), e.end()));

    let gap = Duration::minutes(i64::from(config.back_to_back_gap_minutes));
    let handoffs = transitions(&meetings);
    let back_to_back = handoffs.iter().filter(|t| t.gap <= gap).count();
    let recovery_deficit_minutes = handoffs
        .iter()
        .map(|t| (i64::from(required_recovery(t.previous)) - t.gap.num_minutes()).max(0))
        .sum();

    let lunch = meetings
        .iter()
        .filter(|e| {
            let minute = window.local_minute_of_day(e.start());
            (LUNCH_START_MINUTE..=LUNCH_END_MINUTE).contains(&minute)
        })
        .count();

    let high_stress = meetings
        .iter()
        .filter(|e| {
            e.importance() == Importance::High || title_intensity(e.title()) == TitleIntensity::High
        })
        .count();

    MeetingAnalysis {
        total: meetings.len(),
        minutes: meetings.iter().map(|e| e.duration_minutes()).sum(),
        back_to_back,
        recovery_deficit_minutes,
        lunch,
        high_stress,
        first_start: meetings.iter().map(|e| e.start()).min(),
        last_end: meetings.iter().map(|e| e.end()).max(),
        longest_minutes: meetings
            .iter()
            .map(|e| e.duration_minutes())
            .max()
            .unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::EventCategory;
    use crate::stress::score_load;
    use crate::types::EventId;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 27, hour, minute, 0).unwrap()
    }

    fn meeting(id: &str, start: (u32, u32), end: (u32, u32)) -> Event {
        Event::new(EventId::new(id).unwrap(), at(start.0, start.1), at(end.0, end.1)).unwrap()
    }

    fn window() -> AnalysisWindow {
        AnalysisWindow::new(at(8, 0), at(18, 0), 0).unwrap()
    }

    #[test]
    fn levels_follow_peak_bands() {
        assert_eq!(StressLevel::from_peak(LoadScore::clamped(0.1)), StressLevel::Low);
        assert_eq!(StressLevel::from_peak(LoadScore::clamped(0.2)), StressLevel::Low);
        assert_eq!(StressLevel::from_peak(LoadScore::clamped(0.35)), StressLevel::Moderate);
        assert_eq!(StressLevel::from_peak(LoadScore::clamped(0.6)), StressLevel::Elevated);
        assert_eq!(StressLevel::from_peak(LoadScore::clamped(0.75)), StressLevel::High);
        assert_eq!(StressLevel::from_peak(LoadScore::MAX), StressLevel::Critical);
    }

    #[test]
    fn meeting_analysis_counts() {
        let events = vec![
            meeting("a", (9, 0), (10, 0)),
            meeting("b", (10, 5), (11, 0)).with_title("Budget review"),
            meeting("c", (12, 0), (13, 30)).with_importance(Importance::High),
            meeting("focus", (14, 0), (16, 0)).with_category(EventCategory::FocusBlock),
        ];
        let analysis = analyze_meetings(&events, &window(), &ScoringConfig::default());

        assert_eq!(analysis.total, 3);
        assert_eq!(analysis.minutes, 60 + 55 + 90);
        assert_eq!(analysis.back_to_back, 1);
        assert_eq!(analysis.lunch, 1);
        assert_eq!(analysis.high_stress, 2);
        assert_eq!(analysis.first_start, Some(at(9, 0)));
        assert_eq!(analysis.last_end, Some(at(13, 30)));
        assert_eq!(analysis.longest_minutes, 90);
    }

    #[test]
    fn nested_meeting_is_not_back_to_back() {
        let events = vec![
            meeting("long", (9, 0), (12, 0)),
            meeting("inner", (9, 30), (10, 0)),
        ];
        let analysis = analyze_meetings(&events, &window(), &ScoringConfig::default());

        assert_eq!(analysis.total, 2);
        assert_eq!(analysis.back_to_back, 0);
        assert_eq!(analysis.recovery_deficit_minutes, 0);
    }

    #[test]
    fn recovery_deficit_sums_short_gaps() {
        let events = vec![
            meeting("a", (9, 0), (10, 0)).with_attendees(9),
            meeting("b", (10, 0), (10, 30)).with_attendees(4),
            meeting("c", (10, 35), (11, 0)),
        ];
        let analysis = analyze_meetings(&events, &window(), &ScoringConfig::default());

        // a needs 12 and gets 0, b needs 8 and gets 5
        assert_eq!(analysis.back_to_back, 2);
        assert_eq!(analysis.recovery_deficit_minutes, 15);
    }

    #[test]
    fn tips_follow_level_and_meeting_shape() {
        let quiet = MeetingAnalysis::default();
        assert_eq!(schedule_tips(StressLevel::None, &quiet), [Tip::CreativeWork]);
        assert!(schedule_tips(StressLevel::Moderate, &quiet).is_empty());

        let crowded = MeetingAnalysis {
            back_to_back: 3,
            recovery_deficit_minutes: 20,
            lunch: 1,
            ..MeetingAnalysis::default()
        };
        assert_eq!(
            schedule_tips(StressLevel::Critical, &crowded),
            [
                Tip::AddBuffers,
                Tip::LongerRecovery,
                Tip::ProtectLunch,
                Tip::PrepareAgendas,
                Tip::Hydrate,
            ]
        );
        assert_eq!(
            schedule_tips(StressLevel::Elevated, &crowded),
            [
                Tip::AddBuffers,
                Tip::LongerRecovery,
                Tip::ProtectLunch,
                Tip::MorningMindfulness,
            ]
        );
    }

    #[test]
    fn advice_matches_level() {
        assert!(StressLevel::None.advice().is_empty());
        assert_eq!(StressLevel::Critical.advice().len(), 6);
        assert_eq!(
            StressLevel::Moderate.advice()[0],
            "Your meeting load is moderate. Stay organized."
        );
    }

    #[test]
    fn meetings_outside_window_are_ignored() {
        let events = vec![meeting("early", (6, 0), (7, 0))];
        let analysis = analyze_meetings(&events, &window(), &ScoringConfig::default());
        assert_eq!(analysis, MeetingAnalysis::default());
    }

    #[test]
    fn day_without_meetings_has_no_level() {
        let config = ScoringConfig::default();
        let curve = score_load(&[], &window(), &config, None);
        let summary = summarize(&[], &window(), &curve, &config);

        assert_eq!(summary.level, StressLevel::None);
        assert_eq!(summary.peak_load, LoadScore::ZERO);
        assert_eq!(summary.meetings.total, 0);
        assert!(summary.advice.is_empty());
        assert_eq!(summary.tips, [Tip::CreativeWork]);
    }

    #[test]
    fn busy_day_has_a_level() {
        let config = ScoringConfig::default();
        let events = vec![
            meeting("a", (9, 0), (10, 0)),
            meeting("b", (10, 0), (11, 0)),
        ];
        let curve = score_load(&events, &window(), &config, None);
        let summary = summarize(&events, &window(), &curve, &config);

        assert_ne!(summary.level, StressLevel::None);
        assert!(summary.mean_load < summary.peak_load);
    }
}
