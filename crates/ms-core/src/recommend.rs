//! Picks a break activity for a free slot from the load around it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::slots::FreeSlot;
use crate::stress::{LoadCurve, LoadSample, StressRule};
use crate::types::LoadScore;

/// A kind of break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Breathing,
    Movement,
    Mindfulness,
    MicroBreak,
}

impl Activity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Breathing => "breathing",
            Self::Movement => "movement",
            Self::Mindfulness => "mindfulness",
            Self::MicroBreak => "micro_break",
        }
    }

    /// The activity that best counters a given source of load.
    pub const fn for_cause(rule: StressRule) -> Self {
        match rule {
            StressRule::MeetingDensity | StressRule::CumulativeLoad => Self::Movement,
            StressRule::BackToBack | StressRule::RecoveryDeficit => Self::Breathing,
            StressRule::AttendeeLoad | StressRule::ContentIntensity => Self::Mindfulness,
            StressRule::Circadian => Self::MicroBreak,
        }
    }

    /// A concrete suggestion sized to the break.
    pub const fn suggestion(self, minutes: u32) -> &'static str {
        match (self, minutes) {
            (Self::Breathing, 0..=3) => "Take three slow, deep breaths",
            (Self::Breathing, _) => "Box breathing: 4s in, 4s hold, 4s out",
            (Self::Movement, 0..=9) => "Desk stretches and a posture reset",
            (Self::Movement, 10..=14) => "Walk around the building",
            (Self::Movement, _) => "Outdoor walk",
            (Self::Mindfulness, 0..=9) => "Short body scan",
            (Self::Mindfulness, _) => "Guided meditation",
            (Self::MicroBreak, 0..=3) => "Hydrate and rest your eyes (20-20-20)",
            (Self::MicroBreak, _) => "Step away from the screen",
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Activity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "breathing" => Ok(Self::Breathing),
            "movement" => Ok(Self::Movement),
            "mindfulness" => Ok(Self::Mindfulness),
            "micro_break" | "microbreak" => Ok(Self::MicroBreak),
            other => Err(format!("unknown activity: {other}")),
        }
    }
}

/// Selection parameters for one activity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityProfile {
    pub activity: Activity,
    /// Shortest slot the activity fits in.
    pub min_minutes: u32,
    pub preferred_minutes: u32,
    /// Minimum local load before the activity is offered.
    pub threshold: f64,
    /// Higher wins.
    pub priority: u8,
}

/// The set of activities the selector may choose from, in tie-break order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityCatalog {
    pub profiles: Vec<ActivityProfile>,
}

impl ActivityCatalog {
    pub fn get(&self, activity: Activity) -> Option<&ActivityProfile> {
        self.profiles.iter().find(|p| p.activity == activity)
    }
}

impl Default for ActivityCatalog {
    fn default() -> Self {
        let profile = |activity, min_minutes, preferred_minutes, threshold, priority| {
            ActivityProfile {
                activity,
                min_minutes,
                preferred_minutes,
                threshold,
                priority,
            }
        };
        Self {
            profiles: vec![
                profile(Activity::Movement, 10, 15, 0.5, 3),
                profile(Activity::Breathing, 3, 5, 0.6, 3),
                profile(Activity::Mindfulness, 5, 10, 0.4, 2),
                profile(Activity::MicroBreak, 2, 5, 0.0, 0),
            ],
        }
    }
}

/// Why an activity was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "rule", rename_all = "snake_case")]
pub enum Rationale {
    /// Load crossed the activity's threshold and this rule dominated.
    Rule(StressRule),
    /// Load crossed the threshold without a dominant rule.
    Threshold,
    /// Nothing crossed a threshold; a micro-break still fits.
    Fallback,
}

impl fmt::Display for Rationale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rule(rule) => write!(f, "{rule}"),
            Self::Threshold => f.write_str("threshold"),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}

/// A break proposed for one free slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Recommendation {
    pub activity: Activity,
    pub duration_minutes: u32,
    pub slot: FreeSlot,
    pub rationale: Rationale,
    /// Load that justified the recommendation.
    pub local_load: LoadScore,
}

/// Load around a slot, as seen by the selector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalLoad {
    pub peak: LoadScore,
    pub cause: Option<StressRule>,
}

/// Reads the load leading into and during `slot`.
///
/// Considers every bucket that ends at or after the slot starts and begins
/// before it ends. That includes the bucket finishing right as the slot
/// opens and one that starts inside the slot but runs past its end. The cause comes from the latest such bucket that began before the
/// slot, falling back to the latest one inside it.
pub fn local_load(slot: &FreeSlot, curve: &LoadCurve) -> LocalLoad {
    let relevant: Vec<&LoadSample> = curve
        .samples
        .iter()
        .filter(|s| curve.bucket_end(s) >= slot.start() && s.timestamp < slot.end())
        .collect();

    let peak = relevant
        .iter()
        .map(|s| s.score)
        .fold(LoadScore::ZERO, |acc, s| if s > acc { s } else { acc });

    let latest_cause = |filter: &dyn Fn(DateTime<Utc>) -> bool| {
        relevant
            .iter()
            .rev()
            .filter(|s| filter(s.timestamp))
            .find_map(|s| s.cause)
    };
    let cause = latest_cause(&|ts| ts < slot.start()).or_else(|| latest_cause(&|_| true));

    LocalLoad { peak, cause }
}

/// Chooses at most one activity for `slot`.
///
/// Returns `None` when the slot is too short for anything in the catalog.
pub fn select_recommendation(
    slot: &FreeSlot,
    curve: &LoadCurve,
    catalog: &ActivityCatalog,
) -> Option<Recommendation> {
    let slot_minutes = slot.minutes();
    let load = local_load(slot, curve);
    let preferred = load.cause.map(Activity::for_cause);

    let best = catalog
        .profiles
        .iter()
        .enumerate()
        .filter(|(_, p)| p.activity != Activity::MicroBreak)
        .filter(|(_, p)| p.min_minutes <= slot_minutes && p.threshold <= load.peak.value())
        .max_by(|(ia, a), (ib, b)| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| (Some(a.activity) == preferred).cmp(&(Some(b.activity) == preferred)))
                // earlier catalog entries win
                .then_with(|| ib.cmp(ia))
        })
        .map(|(_, p)| p);

    let (profile, rationale) = match best {
        Some(profile) => (
            profile,
            load.cause.map_or(Rationale::Threshold, Rationale::Rule),
        ),
        None => {
            let fallback = catalog
                .get(Activity::MicroBreak)
                .filter(|p| p.min_minutes <= slot_minutes)?;
            (fallback, Rationale::Fallback)
        }
    };

    Some(Recommendation {
        activity: profile.activity,
        duration_minutes: profile.preferred_minutes.min(slot_minutes),
        slot: *slot,
        rationale,
        local_load: load.peak,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::stress::{ScoringConfig, score_load};
    use crate::types::EventId;
    use crate::window::AnalysisWindow;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 27, hour, minute, 0).unwrap()
    }

    fn slot(start: (u32, u32), end: (u32, u32)) -> FreeSlot {
        FreeSlot::new(at(start.0, start.1), at(end.0, end.1)).unwrap()
    }

    fn meeting(id: &str, start: (u32, u32), end: (u32, u32), attendees: u32) -> Event {
        Event::new(EventId::new(id).unwrap(), at(start.0, start.1), at(end.0, end.1))
            .unwrap()
            .with_attendees(attendees)
    }

    fn curve(events: &[Event], start: u32, end: u32) -> LoadCurve {
        let window = AnalysisWindow::new(at(start, 0), at(end, 0), 0).unwrap();
        score_load(events, &window, &ScoringConfig::default(), None)
    }

    fn busy_morning() -> LoadCurve {
        curve(
            &[
                meeting("a", (9, 0), (10, 0), 5),
                meeting("b", (10, 0), (11, 30), 2),
                meeting("c", (12, 0), (13, 0), 8),
            ],
            9,
            13,
        )
    }

    // ========== Activity ==========

    #[test]
    fn causes_map_to_activities() {
        assert_eq!(Activity::for_cause(StressRule::MeetingDensity), Activity::Movement);
        assert_eq!(Activity::for_cause(StressRule::CumulativeLoad), Activity::Movement);
        assert_eq!(Activity::for_cause(StressRule::BackToBack), Activity::Breathing);
        assert_eq!(Activity::for_cause(StressRule::RecoveryDeficit), Activity::Breathing);
        assert_eq!(Activity::for_cause(StressRule::AttendeeLoad), Activity::Mindfulness);
        assert_eq!(Activity::for_cause(StressRule::ContentIntensity), Activity::Mindfulness);
        assert_eq!(Activity::for_cause(StressRule::Circadian), Activity::MicroBreak);
    }

    #[test]
    fn activity_parses_and_displays() {
        assert_eq!("micro-break".parse::<Activity>().unwrap(), Activity::MicroBreak);
        assert_eq!("Movement".parse::<Activity>().unwrap(), Activity::Movement);
        assert!("nap".parse::<Activity>().is_err());
        assert_eq!(Activity::MicroBreak.to_string(), "micro_break");
    }

    // ========== Local load ==========

    #[test]
    fn local_load_includes_bucket_ending_at_slot_start() {
        let curve = busy_morning();
        let load = local_load(&slot((11, 30), (12, 0)), &curve);

        assert!((load.peak.value() - 0.6025).abs() < 0.01);
        assert_eq!(load.cause, Some(StressRule::MeetingDensity));
    }

    #[test]
    fn local_load_sees_bucket_running_past_slot_end() {
        let curve = busy_morning();
        let containing = curve
            .samples
            .iter()
            .find(|s| s.timestamp == at(10, 30))
            .unwrap();
        // 10:35-10:40 contains no bucket end; only the 10:30-10:45 bucket overlaps
        let load = local_load(&slot((10, 35), (10, 40)), &curve);

        assert!(containing.score > LoadScore::ZERO);
        assert_eq!(load.peak, containing.score);
        assert_eq!(load.cause, containing.cause);
    }

    #[test]
    fn local_load_of_quiet_day_is_zero() {
        let curve = curve(&[], 9, 17);
        let load = local_load(&slot((10, 0), (11, 0)), &curve);
        assert_eq!(load.peak, LoadScore::ZERO);
        assert_eq!(load.cause, None);
    }

    // ========== Selection ==========

    #[test]
    fn busy_gap_gets_movement() {
        let curve = busy_morning();
        let rec = select_recommendation(&slot((11, 30), (12, 0)), &curve, &ActivityCatalog::default())
            .unwrap();

        assert_eq!(rec.activity, Activity::Movement);
        assert_eq!(rec.duration_minutes, 15);
        assert_eq!(rec.rationale, Rationale::Rule(StressRule::MeetingDensity));
        assert!(rec.local_load.value() > 0.5);
    }

    #[test]
    fn short_busy_gap_gets_breathing() {
        let curve = busy_morning();
        // 11:30-11:38 is too short for a walk
        let rec = select_recommendation(&slot((11, 30), (11, 38)), &curve, &ActivityCatalog::default())
            .unwrap();

        assert_eq!(rec.activity, Activity::Breathing);
        assert_eq!(rec.duration_minutes, 5);
    }

    #[test]
    fn quiet_gap_falls_back_to_micro_break() {
        let curve = curve(&[], 9, 17);
        let rec = select_recommendation(&slot((10, 0), (10, 30)), &curve, &ActivityCatalog::default())
            .unwrap();

        assert_eq!(rec.activity, Activity::MicroBreak);
        assert_eq!(rec.rationale, Rationale::Fallback);
        assert_eq!(rec.duration_minutes, 5);
    }

    #[test]
    fn duration_is_capped_by_slot_length() {
        let curve = curve(&[], 9, 17);
        let rec = select_recommendation(&slot((10, 0), (10, 3)), &curve, &ActivityCatalog::default())
            .unwrap();
        assert_eq!(rec.duration_minutes, 3);
    }

    #[test]
    fn slot_shorter_than_every_minimum_gets_nothing() {
        let curve = busy_morning();
        let result =
            select_recommendation(&slot((11, 30), (11, 31)), &curve, &ActivityCatalog::default());
        assert!(result.is_none());
    }

    #[test]
    fn catalog_without_micro_break_has_no_fallback() {
        let catalog = ActivityCatalog {
            profiles: ActivityCatalog::default()
                .profiles
                .into_iter()
                .filter(|p| p.activity != Activity::MicroBreak)
                .collect(),
        };
        let curve = curve(&[], 9, 17);
        assert!(select_recommendation(&slot((10, 0), (10, 30)), &curve, &catalog).is_none());
    }

    #[test]
    fn priority_beats_cause_preference() {
        let catalog = ActivityCatalog {
            profiles: vec![
                ActivityProfile {
                    activity: Activity::Mindfulness,
                    min_minutes: 5,
                    preferred_minutes: 10,
                    threshold: 0.1,
                    priority: 9,
                },
                ActivityProfile {
                    activity: Activity::Movement,
                    min_minutes: 5,
                    preferred_minutes: 10,
                    threshold: 0.1,
                    priority: 1,
                },
            ],
        };
        let rec = select_recommendation(&slot((11, 30), (12, 0)), &busy_morning(), &catalog)
            .unwrap();
        assert_eq!(rec.activity, Activity::Mindfulness);
    }

    #[test]
    fn catalog_order_breaks_remaining_ties() {
        let tie = |activity| ActivityProfile {
            activity,
            min_minutes: 1,
            preferred_minutes: 5,
            threshold: 0.0,
            priority: 1,
        };
        let catalog = ActivityCatalog {
            profiles: vec![tie(Activity::Mindfulness), tie(Activity::Breathing)],
        };
        let curve = curve(&[], 9, 17);
        let rec = select_recommendation(&slot((10, 0), (10, 30)), &curve, &catalog).unwrap();

        assert_eq!(rec.activity, Activity::Mindfulness);
        assert_eq!(rec.rationale, Rationale::Threshold);
    }
}
