//! Data-parallel evaluation across environment instances.

use rayon::prelude::*;
use task_types::StepSnapshot;

use crate::manager::{RewardBreakdown, RewardManager};
use crate::progress::ProgressScorer;
use crate::termination::{TerminationManager, TerminationOutcome};

/// Reward and termination result for one environment instance.
#[derive(Debug, Clone, PartialEq)]
pub struct StepEvaluation {
    /// Weighted reward decomposition.
    pub reward: RewardBreakdown,
    /// Done flags.
    pub termination: TerminationOutcome,
}

/// Evaluate one snapshot per environment instance in parallel.
///
/// Instances share no state; `out[i]` depends only on `snapshots[i]`.
#[must_use]
pub fn evaluate_batch(
    rewards: &RewardManager,
    terminations: &TerminationManager,
    snapshots: &[StepSnapshot],
) -> Vec<StepEvaluation> {
    snapshots
        .par_iter()
        .map(|snap| StepEvaluation {
            reward: rewards.compute(snap),
            termination: terminations.check(snap),
        })
        .collect()
}

/// Progress score for each instance, in parallel.
#[must_use]
pub fn score_progress_batch(scorer: &ProgressScorer, snapshots: &[StepSnapshot]) -> Vec<f64> {
    snapshots
        .par_iter()
        .map(|s| scorer.score(&s.object, &s.robot_root, &s.goal_local))
        .collect()
}
