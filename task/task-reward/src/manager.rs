//! Weighted reward aggregation.

use std::sync::Arc;

use task_types::{GripperConfig, StepSnapshot};
use tracing::{debug, trace};

use crate::error::RewardError;
use crate::terms::{RewardKind, RewardTerm};
use crate::Result;

/// One term's contribution to a step reward.
#[derive(Debug, Clone, PartialEq)]
pub struct TermValue {
    /// Term name.
    pub name: Arc<str>,
    /// Kernel output before weighting.
    pub raw: f64,
    /// `raw * weight * step_dt`.
    pub weighted: f64,
}

/// Step reward with its per-term decomposition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RewardBreakdown {
    /// Sum of all weighted term values.
    pub total: f64,
    /// Contributions in configuration order.
    pub terms: Vec<TermValue>,
}

impl RewardBreakdown {
    /// Look up a term's contribution by name.
    #[must_use]
    pub fn term(&self, name: &str) -> Option<&TermValue> {
        self.terms.iter().find(|t| &*t.name == name)
    }
}

#[derive(Debug, Clone)]
struct ActiveTerm {
    name: Arc<str>,
    weight: f64,
    kind: RewardKind,
}

/// Evaluates a reward table against step snapshots.
///
/// Each term contributes `raw * weight * step_dt`, so the summed reward does
/// not depend on the control frequency. Zero-weight terms are skipped.
///
/// # Example
///
/// ```
/// use task_reward::{pick_place_terms, RewardManager};
/// use task_types::{GripperConfig, Pose, Point3, StepSnapshot};
///
/// let manager = RewardManager::new(pick_place_terms(), 0.02, GripperConfig::franka()).unwrap();
///
/// let snap = StepSnapshot::new(
///     0,
///     Pose::from_position(Point3::new(1.385, 1.6, 0.508)),
///     Pose::from_position(Point3::new(1.354, 1.258, 0.425)),
///     Pose::from_position(Point3::new(0.406, 0.222, 0.375)),
///     [0.04, 0.04],
/// );
/// let reward = manager.compute(&snap);
/// assert_eq!(reward.term("command_progress").map(|t| t.raw), Some(0.0));
/// ```
#[derive(Debug, Clone)]
pub struct RewardManager {
    terms: Vec<ActiveTerm>,
    step_dt: f64,
    gripper: GripperConfig,
}

impl RewardManager {
    /// Build a manager from a validated term list.
    pub fn new(terms: Vec<RewardTerm>, step_dt: f64, gripper: GripperConfig) -> Result<Self> {
        if !step_dt.is_finite() || step_dt <= 0.0 {
            return Err(RewardError::InvalidStepDt(step_dt));
        }
        gripper
            .validate()
            .map_err(|e| RewardError::invalid("gripper", e.to_string()))?;

        let mut active: Vec<ActiveTerm> = Vec::with_capacity(terms.len());
        for term in terms {
            term.validate()?;
            if active.iter().any(|t| *t.name == *term.name) {
                return Err(RewardError::DuplicateTerm { name: term.name });
            }
            active.push(ActiveTerm {
                name: term.name.into(),
                weight: term.weight,
                kind: term.kind,
            });
        }

        debug!(terms = active.len(), step_dt, "Reward manager configured");
        Ok(Self {
            terms: active,
            step_dt,
            gripper,
        })
    }

    /// Evaluate every term on one snapshot.
    #[must_use]
    pub fn compute(&self, snap: &StepSnapshot) -> RewardBreakdown {
        let mut breakdown = RewardBreakdown {
            total: 0.0,
            terms: Vec::with_capacity(self.terms.len()),
        };
        for term in &self.terms {
            if term.weight == 0.0 {
                continue;
            }
            let raw = term.kind.evaluate(snap, &self.gripper);
            let weighted = raw * term.weight * self.step_dt;
            breakdown.total += weighted;
            breakdown.terms.push(TermValue {
                name: Arc::clone(&term.name),
                raw,
                weighted,
            });
        }
        trace!(step = snap.step, total = breakdown.total, "Reward computed");
        breakdown
    }

    /// Current weight of a term.
    #[must_use]
    pub fn weight(&self, name: &str) -> Option<f64> {
        self.terms.iter().find(|t| &*t.name == name).map(|t| t.weight)
    }

    /// Replace a term's weight.
    pub fn set_weight(&mut self, name: &str, weight: f64) -> Result<()> {
        if !weight.is_finite() {
            return Err(RewardError::invalid(name, "weight must be finite"));
        }
        let term = self
            .terms
            .iter_mut()
            .find(|t| &*t.name == name)
            .ok_or_else(|| RewardError::unknown(name))?;
        debug!(term = name, from = term.weight, to = weight, "Reward weight changed");
        term.weight = weight;
        Ok(())
    }

    /// Term names in configuration order.
    pub fn term_names(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| &*t.name)
    }

    /// Environment step duration used to scale weights.
    #[must_use]
    pub const fn step_dt(&self) -> f64 {
        self.step_dt
    }

    /// Gripper classification used by gripper-aware terms.
    #[must_use]
    pub const fn gripper(&self) -> &GripperConfig {
        &self.gripper
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::terms::pick_place_terms;
    use approx::assert_relative_eq;
    use task_types::{Point3, Pose};

    const STEP_DT: f64 = 0.02;

    fn manager() -> RewardManager {
        RewardManager::new(pick_place_terms(), STEP_DT, GripperConfig::franka()).unwrap()
    }

    fn snapshot_at(object: Point3<f64>, gripper: [f64; 2]) -> StepSnapshot {
        StepSnapshot::new(
            10,
            Pose::from_position(object),
            Pose::from_position(Point3::new(1.354, 1.258, 0.425)),
            Pose::from_position(Point3::new(0.406, 0.222, 0.375)),
            gripper,
        )
        .with_ee_position(object)
        .with_container(Pose::from_position(Point3::new(1.77, 1.48, 0.48)))
    }

    #[test]
    fn test_total_is_sum_of_weighted_terms() {
        let reward = manager().compute(&snapshot_at(Point3::new(1.6, 1.5, 0.7), [0.0, 0.0]));
        let sum: f64 = reward.terms.iter().map(|t| t.weighted).sum();
        assert_relative_eq!(reward.total, sum, epsilon = 1e-12);
        assert_eq!(reward.terms.len(), 9);
    }

    #[test]
    fn test_holding_at_goal_is_penalized() {
        let reward = manager().compute(&snapshot_at(Point3::new(1.76, 1.48, 0.8), [0.0, 0.0]));
        let penalty = reward.term("gripper_closed_penalty").unwrap();
        assert_eq!(penalty.raw, 1.0);
        assert_relative_eq!(penalty.weighted, -100.0 * STEP_DT);

        let progress = reward.term("command_progress").unwrap();
        assert_relative_eq!(progress.raw, 1.0, epsilon = 1e-9);
        assert_relative_eq!(progress.weighted, 30.0 * STEP_DT, epsilon = 1e-9);
    }

    #[test]
    fn test_released_in_basket_scores_success() {
        let reward = manager().compute(&snapshot_at(Point3::new(1.77, 1.48, 0.55), [0.04, 0.04]));
        assert_eq!(reward.term("success_reward").unwrap().raw, 1.0);
        assert_eq!(reward.term("gripper_closed_penalty").unwrap().raw, 0.0);
    }

    #[test]
    fn test_zero_weight_terms_skipped() {
        let mut m = manager();
        m.set_weight("joint_vel", 0.0).unwrap();
        let reward = m.compute(&snapshot_at(Point3::new(1.6, 1.5, 0.7), [0.0, 0.0]));
        assert!(reward.term("joint_vel").is_none());
    }

    #[test]
    fn test_set_weight_unknown_term() {
        let mut m = manager();
        let err = m.set_weight("lift_bonus", 1.0).unwrap_err();
        assert_eq!(err, RewardError::unknown("lift_bonus"));
        assert_eq!(m.weight("action_rate"), Some(-1e-4));
    }

    #[test]
    fn test_rejects_duplicates_and_bad_dt() {
        let mut terms = pick_place_terms();
        terms.push(terms[0].clone());
        let err = RewardManager::new(terms, STEP_DT, GripperConfig::franka()).unwrap_err();
        assert!(matches!(err, RewardError::DuplicateTerm { .. }));

        let err = RewardManager::new(pick_place_terms(), 0.0, GripperConfig::franka()).unwrap_err();
        assert_eq!(err, RewardError::InvalidStepDt(0.0));
    }
}
