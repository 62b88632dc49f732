//! Title keyword heuristics shared by the normalizer and the scorer.

use std::sync::LazyLock;

use regex::Regex;

use crate::category::EventCategory;

static MEETING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(meeting|call|conference|standup|stand-up|sync|review|interview|candidate|training|workshop|seminar|1:1)\b",
    )
    .unwrap()
});

static FOCUS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(focus|deep work|coding|heads[- ]down)\b").unwrap());

static PERSONAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(break|lunch|coffee|travel|commute|gym|doctor|dentist)\b").unwrap()
});

static HIGH_INTENSITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(urgent|crisis|deadline|review|performance|conflict|escalation|emergency|critical|budget|layoffs?|restructur\w*|incident|hotfix|asap)\b",
    )
    .unwrap()
});

static MEDIUM_INTENSITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(planning|decision|strategy|proposal|presentation|discussion|brainstorm|workshop|training|interview|onboarding|kickoff|retrospective|retro|demo)\b",
    )
    .unwrap()
});

static RECURRING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(weekly|daily|standup|stand-up|1:1|sync|recurring|regular|team meeting|status|check-in|scrum|all hands|townhall)\b",
    )
    .unwrap()
});

static UNPLANNED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(urgent|emergency|asap|immediate|crisis|escalation|breaking|fire drill|hotfix|incident)\b",
    )
    .unwrap()
});

/// How demanding a meeting's title suggests it will be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TitleIntensity {
    Neutral,
    Medium,
    High,
}

impl TitleIntensity {
    /// Feature value used by the content-intensity rule.
    pub const fn weight(self) -> f64 {
        match self {
            Self::Neutral => 0.0,
            Self::Medium => 0.5,
            Self::High => 1.0,
        }
    }
}

/// Infers a category from title keywords alone.
///
/// Meeting keywords win over focus and personal ones, so "lunch meeting"
/// is still a meeting.
pub fn category_from_title(title: &str) -> Option<EventCategory> {
    if MEETING_RE.is_match(title) {
        Some(EventCategory::Meeting)
    } else if FOCUS_RE.is_match(title) {
        Some(EventCategory::FocusBlock)
    } else if PERSONAL_RE.is_match(title) {
        Some(EventCategory::Personal)
    } else {
        None
    }
}

pub fn title_intensity(title: &str) -> TitleIntensity {
    if HIGH_INTENSITY_RE.is_match(title) {
        TitleIntensity::High
    } else if MEDIUM_INTENSITY_RE.is_match(title) {
        TitleIntensity::Medium
    } else {
        TitleIntensity::Neutral
    }
}

/// Whether a meeting looks familiar or was called at short notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingCadence {
    Routine,
    AdHoc,
    Unplanned,
}

impl MeetingCadence {
    /// Multiplier on a meeting's content intensity.
    pub const fn factor(self) -> f64 {
        match self {
            Self::Routine => 0.9,
            Self::AdHoc => 1.0,
            Self::Unplanned => 1.3,
        }
    }
}

/// Routine keywords win, so "urgent weekly sync" is still routine.
pub fn meeting_cadence(title: &str) -> MeetingCadence {
    if RECURRING_RE.is_match(title) {
        MeetingCadence::Routine
    } else if UNPLANNED_RE.is_match(title) {
        MeetingCadence::Unplanned
    } else {
        MeetingCadence::AdHoc
    }
}
