//! Step-scheduled reward weight changes.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::manager::RewardManager;
use crate::Result;

/// Switch a reward term to a new weight once training passes a step count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSchedule {
    /// Reward term to modify.
    pub term_name: String,
    /// Weight applied after `num_steps`.
    pub weight: f64,
    /// Common step counter value after which the new weight applies.
    pub num_steps: u64,
}

impl WeightSchedule {
    /// Create a schedule.
    #[must_use]
    pub fn new(term_name: impl Into<String>, weight: f64, num_steps: u64) -> Self {
        Self {
            term_name: term_name.into(),
            weight,
            num_steps,
        }
    }
}

/// Penalty ramp of the pick-and-place task: `action_rate` and `joint_vel`
/// go from -1e-4 to -0.1 after 10 000 steps.
#[must_use]
pub fn pick_place_curriculum() -> Vec<WeightSchedule> {
    vec![
        WeightSchedule::new("action_rate", -1e-1, 10_000),
        WeightSchedule::new("joint_vel", -1e-1, 10_000),
    ]
}

/// Applies weight schedules to a reward manager.
#[derive(Debug, Clone, Default)]
pub struct Curriculum {
    schedules: Vec<WeightSchedule>,
    applied: Vec<bool>,
}

impl Curriculum {
    /// Create a curriculum, checking every scheduled term exists.
    pub fn new(schedules: Vec<WeightSchedule>, rewards: &RewardManager) -> Result<Self> {
        for s in &schedules {
            if rewards.weight(&s.term_name).is_none() {
                return Err(crate::RewardError::unknown(&s.term_name));
            }
            if !s.weight.is_finite() {
                return Err(crate::RewardError::invalid(&s.term_name, "weight must be finite"));
            }
        }
        let applied = vec![false; schedules.len()];
        Ok(Self { schedules, applied })
    }

    /// Apply every schedule whose threshold the counter has passed.
    ///
    /// Returns the number of schedules applied by this call. A schedule fires
    /// once, when `common_step_counter > num_steps` first holds.
    pub fn update(&mut self, common_step_counter: u64, rewards: &mut RewardManager) -> Result<usize> {
        let mut count = 0;
        for (schedule, applied) in self.schedules.iter().zip(self.applied.iter_mut()) {
            if *applied || common_step_counter <= schedule.num_steps {
                continue;
            }
            rewards.set_weight(&schedule.term_name, schedule.weight)?;
            *applied = true;
            count += 1;
            info!(
                term = %schedule.term_name,
                weight = schedule.weight,
                step = common_step_counter,
                "Curriculum weight applied"
            );
        }
        Ok(count)
    }

    /// Whether every schedule has fired.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.applied.iter().all(|a| *a)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::terms::pick_place_terms;
    use task_types::GripperConfig;

    fn rewards() -> RewardManager {
        RewardManager::new(pick_place_terms(), 0.02, GripperConfig::franka()).unwrap()
    }

    #[test]
    fn test_weights_switch_after_threshold() {
        let mut rewards = rewards();
        let mut curriculum = Curriculum::new(pick_place_curriculum(), &rewards).unwrap();

        assert_eq!(curriculum.update(10_000, &mut rewards).unwrap(), 0);
        assert_eq!(rewards.weight("action_rate"), Some(-1e-4));

        assert_eq!(curriculum.update(10_001, &mut rewards).unwrap(), 2);
        assert_eq!(rewards.weight("action_rate"), Some(-0.1));
        assert_eq!(rewards.weight("joint_vel"), Some(-0.1));
        assert!(curriculum.is_complete());

        // Already applied; later calls are no-ops
        assert_eq!(curriculum.update(20_000, &mut rewards).unwrap(), 0);
    }

    #[test]
    fn test_unknown_term_rejected() {
        let rewards = rewards();
        let err = Curriculum::new(vec![WeightSchedule::new("gravity", 1.0, 5)], &rewards)
            .unwrap_err();
        assert!(err.to_string().contains("gravity"));
    }
}
