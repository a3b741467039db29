use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::baseline::BaselineState;
use super::report::ChangeAlert;
use super::state::WatchState;
use crate::config::DetectionConfig;
use crate::models::{Snapshot, TrackedResource};
use crate::utils::error::{AppError, Result};

/// One way two snapshots can differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignificanceCriterion {
    Fingerprint,
    SignalSum,
    ItemCount,
}

impl fmt::Display for SignificanceCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignificanceCriterion::Fingerprint => "fingerprint",
            SignificanceCriterion::SignalSum => "signal_sum",
            SignificanceCriterion::ItemCount => "item_count",
        };
        f.write_str(name)
    }
}

/// OR over the configured criteria: any single one differing is significant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignificancePredicate {
    criteria: Vec<SignificanceCriterion>,
}

impl SignificancePredicate {
    pub fn new(criteria: &[SignificanceCriterion]) -> Result<Self> {
        let mut unique = Vec::with_capacity(criteria.len());
        for criterion in criteria {
            if !unique.contains(criterion) {
                unique.push(*criterion);
            }
        }
        if unique.is_empty() {
            return Err(AppError::Validation(
                "At least one significance criterion is required".into(),
            ));
        }
        Ok(Self { criteria: unique })
    }

    pub fn criteria(&self) -> &[SignificanceCriterion] {
        &self.criteria
    }

    /// Criteria on which `candidate` differs from `baseline`; empty means not significant.
    pub fn changed(&self, baseline: &Snapshot, candidate: &Snapshot) -> Vec<SignificanceCriterion> {
        self.criteria
            .iter()
            .copied()
            .filter(|criterion| match criterion {
                SignificanceCriterion::Fingerprint => {
                    baseline.fingerprint() != candidate.fingerprint()
                }
                SignificanceCriterion::SignalSum => {
                    baseline.signals().total() != candidate.signals().total()
                }
                // An absent count on either side counts as unchanged.
                SignificanceCriterion::ItemCount => {
                    match (baseline.item_count(), candidate.item_count()) {
                        (Some(old), Some(new)) => old != new,
                        _ => false,
                    }
                }
            })
            .collect()
    }
}

impl Default for SignificancePredicate {
    fn default() -> Self {
        Self {
            criteria: vec![
                SignificanceCriterion::Fingerprint,
                SignificanceCriterion::ItemCount,
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// Resource was removed before the result could be applied.
    NotTracked,
    /// Snapshot was taken before the current baseline or before the resource was added.
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// First successful scan; baseline set, no alert.
    Baselined,
    Unchanged,
    Changed(ChangeAlert),
    Discarded(DiscardReason),
}

/// Compares snapshots against baselines and advances the per-resource state machine.
#[derive(Debug, Clone, Default)]
pub struct ChangeDetector {
    predicate: SignificancePredicate,
}

impl ChangeDetector {
    pub fn new(predicate: SignificancePredicate) -> Self {
        Self { predicate }
    }

    pub fn from_config(config: &DetectionConfig) -> Result<Self> {
        Ok(Self::new(SignificancePredicate::new(&config.significance)?))
    }

    pub fn predicate(&self) -> &SignificancePredicate {
        &self.predicate
    }

    /// Applies `snapshot` to the resource's baseline if the resource is still tracked.
    pub async fn apply(&self, watch: &WatchState, resource_id: &str, snapshot: Snapshot) -> Decision {
        watch
            .apply(resource_id, |resource, state| {
                self.evaluate(resource, state, snapshot)
            })
            .await
            .unwrap_or(Decision::Discarded(DiscardReason::NotTracked))
    }

    /// State transition for a single resource.
    pub fn evaluate(
        &self,
        resource: &TrackedResource,
        state: &mut BaselineState,
        snapshot: Snapshot,
    ) -> Decision {
        if snapshot.taken_at() < resource.added_at {
            return Decision::Discarded(DiscardReason::Stale);
        }

        let baseline = match state {
            BaselineState::NoBaseline => {
                *state = BaselineState::Baselined(snapshot);
                return Decision::Baselined;
            }
            BaselineState::Baselined(baseline) => baseline,
        };

        if snapshot.taken_at() < baseline.taken_at() {
            return Decision::Discarded(DiscardReason::Stale);
        }

        let criteria = self.predicate.changed(baseline, &snapshot);
        if criteria.is_empty() {
            return Decision::Unchanged;
        }

        let previous_count = baseline.item_count();
        let current_count = snapshot.item_count();
        let delta = match (previous_count, current_count) {
            (Some(old), Some(new)) => Some(i64::from(new) - i64::from(old)),
            _ => None,
        };

        let alert = ChangeAlert {
            resource_id: resource.id.clone(),
            previous_count,
            current_count,
            delta,
            histogram: snapshot.quantitative().histogram.clone(),
            criteria,
            detected_at: Local::now(),
        };

        *state = BaselineState::Baselined(snapshot);
        Decision::Changed(alert)
    }
}
