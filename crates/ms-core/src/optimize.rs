//! Greedy selection of the final intervention plan.

use serde::{Deserialize, Serialize};

use crate::recommend::Recommendation;
use crate::slots::FreeSlot;

/// Limits on how many breaks a plan may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InterventionCap {
    /// Maximum number of interventions. `None` means unlimited.
    pub max_count: Option<usize>,
    /// Maximum total break minutes. `None` means unlimited.
    pub max_minutes: Option<u32>,
}

/// A scheduled break.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Intervention {
    pub slot: FreeSlot,
    pub recommendation: Recommendation,
}

/// Chronologically ordered, non-overlapping interventions.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct InterventionPlan {
    pub interventions: Vec<Intervention>,
}

impl InterventionPlan {
    pub fn len(&self) -> usize {
        self.interventions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interventions.is_empty()
    }

    pub fn total_minutes(&self) -> u32 {
        self.interventions
            .iter()
            .map(|i| i.recommendation.duration_minutes)
            .sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Intervention> {
        self.interventions.iter()
    }
}

impl<'a> IntoIterator for &'a InterventionPlan {
    type Item = &'a Intervention;
    type IntoIter = std::slice::Iter<'a, Intervention>;

    fn into_iter(self) -> Self::IntoIter {
        self.interventions.iter()
    }
}

/// Picks the highest-load candidates that fit within `cap`.
///
/// Candidates are taken by local load, highest first, with earlier slots
/// winning ties. A candidate is skipped if it overlaps one already taken or
/// would push the plan past the minute budget.
pub fn optimize_plan(candidates: &[Recommendation], cap: &InterventionCap) -> InterventionPlan {
    let mut ranked: Vec<&Recommendation> = candidates.iter().collect();
    ranked.sort_by(|a, b| {
        b.local_load
            .value()
            .total_cmp(&a.local_load.value())
            .then(a.slot.start().cmp(&b.slot.start()))
            .then(a.activity.cmp(&b.activity))
    });

    let mut accepted: Vec<Intervention> = Vec::new();
    let mut minutes = 0u32;
    for candidate in ranked {
        if cap.max_count.is_some_and(|max| accepted.len() >= max) {
            break;
        }
        if accepted.iter().any(|i| i.slot.overlaps(&candidate.slot)) {
            tracing::debug!(slot_start = %candidate.slot.start(), "skipping overlapping candidate");
            continue;
        }
        let next_minutes = minutes.saturating_add(candidate.duration_minutes);
        if cap.max_minutes.is_some_and(|max| next_minutes > max) {
            tracing::debug!(
                slot_start = %candidate.slot.start(),
                minutes = next_minutes,
                "skipping candidate over minute budget"
            );
            continue;
        }
        minutes = next_minutes;
        accepted.push(Intervention {
            slot: candidate.slot,
            recommendation: *candidate,
        });
    }

    accepted.sort_by_key(|i| (i.slot.start(), i.slot.end()));
    InterventionPlan {
        interventions: accepted,
    }
}
