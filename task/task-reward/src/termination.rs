//! Episode termination terms.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use task_types::{GripperConfig, StepSnapshot};
use tracing::debug;

use crate::error::RewardError;
use crate::kernels::ContainerCheck;
use crate::Result;

/// Condition checked by a termination term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TerminationKind {
    /// Episode step budget exhausted.
    TimeOut,
    /// Object fell below a height (dropped off the table).
    RootHeightBelow {
        /// World z below which the episode ends.
        minimum_height: f64,
    },
    /// Object released inside the container.
    ObjectInContainer(ContainerCheck),
}

/// A named termination term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminationTerm {
    /// Unique term name.
    pub name: String,
    /// Whether firing means truncation (time limit) rather than a terminal state.
    #[serde(default)]
    pub time_out: bool,
    /// Condition.
    #[serde(flatten)]
    pub kind: TerminationKind,
}

impl TerminationTerm {
    /// Create a term that ends the episode in a terminal state.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: TerminationKind) -> Self {
        Self {
            name: name.into(),
            time_out: false,
            kind,
        }
    }

    /// Create the time-limit truncation term.
    #[must_use]
    pub fn time_out(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            time_out: true,
            kind: TerminationKind::TimeOut,
        }
    }
}

/// Termination terms of the pick-and-place task: time limit, object dropped
/// below 0.3 m, object released in the basket.
#[must_use]
pub fn pick_place_terminations() -> Vec<TerminationTerm> {
    vec![
        TerminationTerm::time_out("time_out"),
        TerminationTerm::new(
            "object_dropping",
            TerminationKind::RootHeightBelow {
                minimum_height: 0.3,
            },
        ),
        TerminationTerm::new(
            "success",
            TerminationKind::ObjectInContainer(ContainerCheck::default()),
        ),
    ]
}

/// Result of checking all termination terms on one step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TerminationOutcome {
    /// A non-time-out term fired.
    pub terminated: bool,
    /// A time-out term fired.
    pub truncated: bool,
    /// Names of every term that fired.
    pub fired: Vec<Arc<str>>,
}

impl TerminationOutcome {
    /// Whether the episode ends this step.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.terminated || self.truncated
    }

    /// Whether a specific term fired.
    #[must_use]
    pub fn fired(&self, name: &str) -> bool {
        self.fired.iter().any(|n| &**n == name)
    }
}

#[derive(Debug, Clone)]
struct ActiveTermination {
    name: Arc<str>,
    time_out: bool,
    kind: TerminationKind,
}

/// ORs termination terms into a per-step done decision.
#[derive(Debug, Clone)]
pub struct TerminationManager {
    terms: Vec<ActiveTermination>,
    max_episode_steps: u64,
    gripper: GripperConfig,
}

impl TerminationManager {
    /// Build a manager. `max_episode_steps` drives [`TerminationKind::TimeOut`].
    pub fn new(
        terms: Vec<TerminationTerm>,
        max_episode_steps: u64,
        gripper: GripperConfig,
    ) -> Result<Self> {
        if max_episode_steps == 0 {
            return Err(RewardError::invalid("time_out", "max_episode_steps must be > 0"));
        }
        let mut active: Vec<ActiveTermination> = Vec::with_capacity(terms.len());
        for term in terms {
            if active.iter().any(|t| *t.name == *term.name) {
                return Err(RewardError::DuplicateTerm { name: term.name });
            }
            match &term.kind {
                TerminationKind::RootHeightBelow { minimum_height }
                    if !minimum_height.is_finite() =>
                {
                    return Err(RewardError::invalid(&term.name, "minimum_height must be finite"));
                }
                TerminationKind::ObjectInContainer(check) => check.validate(&term.name)?,
                _ => {}
            }
            active.push(ActiveTermination {
                name: term.name.into(),
                time_out: term.time_out,
                kind: term.kind,
            });
        }
        Ok(Self {
            terms: active,
            max_episode_steps,
            gripper,
        })
    }

    /// Check every term on one snapshot.
    #[must_use]
    pub fn check(&self, snap: &StepSnapshot) -> TerminationOutcome {
        let mut outcome = TerminationOutcome::default();
        for term in &self.terms {
            let fired = match &term.kind {
                TerminationKind::TimeOut => snap.step >= self.max_episode_steps,
                TerminationKind::RootHeightBelow { minimum_height } => {
                    snap.object.position.z < *minimum_height
                }
                TerminationKind::ObjectInContainer(check) => {
                    check.is_inside(&snap.object, &snap.container, snap.gripper, &self.gripper)
                }
            };
            if fired {
                if term.time_out {
                    outcome.truncated = true;
                } else {
                    outcome.terminated = true;
                }
                outcome.fired.push(Arc::clone(&term.name));
            }
        }
        if outcome.is_done() {
            debug!(step = snap.step, fired = ?outcome.fired, "Episode ended");
        }
        outcome
    }

    /// Step budget per episode.
    #[must_use]
    pub const fn max_episode_steps(&self) -> u64 {
        self.max_episode_steps
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use task_types::{Point3, Pose};

    fn manager() -> TerminationManager {
        TerminationManager::new(pick_place_terminations(), 250, GripperConfig::franka()).unwrap()
    }

    fn snapshot(step: u64, object: Point3<f64>, gripper: [f64; 2]) -> StepSnapshot {
        StepSnapshot::new(
            step,
            Pose::from_position(object),
            Pose::identity(),
            Pose::identity(),
            gripper,
        )
        .with_container(Pose::from_position(Point3::new(1.77, 1.48, 0.48)))
    }

    #[test]
    fn test_running_episode() {
        let outcome = manager().check(&snapshot(10, Point3::new(1.38, 1.6, 0.6), [0.0, 0.0]));
        assert!(!outcome.is_done());
        assert!(outcome.fired.is_empty());
    }

    #[test]
    fn test_time_out_truncates() {
        let outcome = manager().check(&snapshot(250, Point3::new(1.38, 1.6, 0.6), [0.0, 0.0]));
        assert!(outcome.truncated);
        assert!(!outcome.terminated);
        assert!(outcome.fired("time_out"));
    }

    #[test]
    fn test_drop_terminates() {
        let outcome = manager().check(&snapshot(40, Point3::new(1.38, 1.6, 0.1), [0.04, 0.04]));
        assert!(outcome.terminated);
        assert!(outcome.fired("object_dropping"));
    }

    #[test]
    fn test_success_terminates() {
        let outcome = manager().check(&snapshot(120, Point3::new(1.77, 1.48, 0.55), [0.04, 0.04]));
        assert!(outcome.terminated);
        assert!(outcome.fired("success"));
        assert!(!outcome.fired("object_dropping"));
    }

    #[test]
    fn test_several_terms_fire_together() {
        let outcome = manager().check(&snapshot(300, Point3::new(1.77, 1.48, 0.55), [0.04, 0.04]));
        assert!(outcome.terminated && outcome.truncated);
        assert_eq!(outcome.fired.len(), 2);
    }

    #[test]
    fn test_invalid_configuration() {
        let err = TerminationManager::new(pick_place_terminations(), 0, GripperConfig::franka())
            .unwrap_err();
        assert!(matches!(err, RewardError::InvalidParameter { .. }));

        let mut terms = pick_place_terminations();
        terms.push(TerminationTerm::time_out("time_out"));
        assert!(TerminationManager::new(terms, 250, GripperConfig::franka()).is_err());
    }

    #[test]
    fn test_nan_container_threshold_rejected() {
        let mut terms = pick_place_terminations();
        for term in &mut terms {
            if let TerminationKind::ObjectInContainer(check) = &mut term.kind {
                check.xy_threshold = f64::NAN;
            }
        }
        let err = TerminationManager::new(terms, 250, GripperConfig::franka()).unwrap_err();
        assert!(matches!(err, RewardError::InvalidParameter { .. }));
    }

    #[test]
    fn test_term_json() {
        let json = r#"{"name": "object_dropping", "kind": "root_height_below", "minimum_height": 0.3}"#;
        let term: TerminationTerm = serde_json::from_str(json).unwrap();
        assert!(!term.time_out);
        assert_eq!(
            term.kind,
            TerminationKind::RootHeightBelow {
                minimum_height: 0.3
            }
        );
    }
}
