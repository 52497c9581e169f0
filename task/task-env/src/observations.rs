//! Observation groups fed to the policy.
//!
//! The RL policy reads one concatenated vector; the demonstration policy
//! reads named terms that match the recorded dataset layout. Object poses
//! are expressed in the robot-root frame so that observations do not
//! depend on where an instance sits in the world.

use rand::Rng;
use serde::{Deserialize, Serialize};

use task_types::{EntityHandle, FrameTransform, Pose, SceneRegistry};

use crate::error::EnvError;
use crate::Result;

/// What an observation term reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObservationKind {
    /// Joint positions minus their reset values.
    JointPosRel,
    /// Joint velocities (reset velocities are zero).
    JointVelRel,
    /// Action applied on the previous step.
    LastAction,
    /// Object position in the robot-root frame.
    ObjectPositionInRobotRootFrame {
        /// Scene entity.
        object: String,
    },
    /// Goal pose command: position and `(w, x, y, z)` in the robot-root frame.
    GeneratedCommands,
    /// End-effector position.
    EePosition,
    /// End-effector orientation `(w, x, y, z)`.
    EeOrientation,
    /// Finger positions, second finger mirrored.
    GripperPosition,
    /// Entity position in the robot-root frame.
    PositionInBaseFrame {
        /// Scene entity.
        object: String,
    },
    /// Entity orientation `(w, x, y, z)` in the robot-root frame.
    OrientationInBaseFrame {
        /// Scene entity.
        object: String,
    },
}

impl ObservationKind {
    fn entity(&self) -> Option<&str> {
        match self {
            Self::ObjectPositionInRobotRootFrame { object }
            | Self::PositionInBaseFrame { object }
            | Self::OrientationInBaseFrame { object } => Some(object),
            _ => None,
        }
    }
}

/// A named observation term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationTerm {
    /// Term name, unique within its group.
    pub name: String,
    /// Quantity read.
    #[serde(flatten)]
    pub kind: ObservationKind,
    /// Uniform additive noise `(lo, hi)` applied when the group is corrupted.
    #[serde(default)]
    pub noise: Option<(f64, f64)>,
}

impl ObservationTerm {
    /// Noise-free term.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ObservationKind) -> Self {
        Self {
            name: name.into(),
            kind,
            noise: None,
        }
    }

    /// Add uniform noise.
    #[must_use]
    pub fn with_noise(mut self, lo: f64, hi: f64) -> Self {
        self.noise = Some((lo, hi));
        self
    }
}

/// Ordered observation terms and how they are delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationGroup {
    /// Terms in output order.
    pub terms: Vec<ObservationTerm>,
    /// Apply per-term noise.
    pub enable_corruption: bool,
    /// Deliver one flat vector instead of named terms.
    pub concatenate_terms: bool,
}

impl ObservationGroup {
    /// RL policy group tracking `object`.
    #[must_use]
    pub fn policy(object: &str) -> Self {
        Self {
            terms: vec![
                ObservationTerm::new("joint_pos", ObservationKind::JointPosRel),
                ObservationTerm::new("joint_vel", ObservationKind::JointVelRel),
                ObservationTerm::new(
                    "object_position",
                    ObservationKind::ObjectPositionInRobotRootFrame {
                        object: object.to_owned(),
                    },
                ),
                ObservationTerm::new("target_object_position", ObservationKind::GeneratedCommands),
                ObservationTerm::new("actions", ObservationKind::LastAction),
            ],
            enable_corruption: true,
            concatenate_terms: true,
        }
    }

    /// Demonstration policy group: named terms matching the dataset.
    #[must_use]
    pub fn demo_policy(object: &str, container: &str) -> Self {
        let mut terms = vec![
            ObservationTerm::new("actions", ObservationKind::LastAction),
            ObservationTerm::new("joint_pos", ObservationKind::JointPosRel),
            ObservationTerm::new("joint_vel", ObservationKind::JointVelRel),
            ObservationTerm::new("eef_pos", ObservationKind::EePosition),
            ObservationTerm::new("eef_quat", ObservationKind::EeOrientation),
            ObservationTerm::new("gripper_pos", ObservationKind::GripperPosition),
        ];
        for entity in [object, container] {
            terms.push(ObservationTerm::new(
                format!("{entity}_pos"),
                ObservationKind::PositionInBaseFrame {
                    object: entity.to_owned(),
                },
            ));
            terms.push(ObservationTerm::new(
                format!("{entity}_quat"),
                ObservationKind::OrientationInBaseFrame {
                    object: entity.to_owned(),
                },
            ));
        }
        Self {
            terms,
            enable_corruption: false,
            concatenate_terms: false,
        }
    }

    /// Disable noise.
    #[must_use]
    pub fn without_corruption(mut self) -> Self {
        self.enable_corruption = false;
        self
    }

    /// Check names and noise ranges.
    pub fn validate(&self) -> Result<()> {
        if self.terms.is_empty() {
            return Err(EnvError::invalid_config("observation group has no terms"));
        }
        for (i, term) in self.terms.iter().enumerate() {
            if self.terms[..i].iter().any(|t| t.name == term.name) {
                return Err(EnvError::invalid_config(format!(
                    "duplicate observation term '{}'",
                    term.name
                )));
            }
            if let Some((lo, hi)) = term.noise {
                if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
                    return Err(EnvError::invalid_range(
                        format!("{}.noise", term.name),
                        lo,
                        hi,
                    ));
                }
            }
        }
        Ok(())
    }

    /// Entity names referenced by the terms.
    pub fn entities(&self) -> impl Iterator<Item = &str> + '_ {
        self.terms.iter().filter_map(|t| t.kind.entity())
    }

    /// Resolve entity names against the scene.
    pub fn bind(&self, registry: &SceneRegistry) -> Result<ObservationPipeline> {
        self.validate()?;
        let terms = self
            .terms
            .iter()
            .map(|term| -> Result<BoundTerm> {
                let entity = term
                    .kind
                    .entity()
                    .map(|name| registry.resolve(name))
                    .transpose()?;
                Ok(BoundTerm {
                    term: term.clone(),
                    entity,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ObservationPipeline {
            terms,
            enable_corruption: self.enable_corruption,
            concatenate_terms: self.concatenate_terms,
        })
    }
}

/// Observation groups of the task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationConfig {
    /// Group read by the policy.
    pub policy: ObservationGroup,
}

impl Default for ObservationConfig {
    fn default() -> Self {
        Self::rl("ketchup")
    }
}

impl ObservationConfig {
    /// RL observations tracking `object`.
    #[must_use]
    pub fn rl(object: &str) -> Self {
        Self {
            policy: ObservationGroup::policy(object),
        }
    }

    /// Demonstration observations over `object` and `container`.
    #[must_use]
    pub fn demo(object: &str, container: &str) -> Self {
        Self {
            policy: ObservationGroup::demo_policy(object, container),
        }
    }

    /// Validate every group.
    pub fn validate(&self) -> Result<()> {
        self.policy.validate()
    }
}

/// Simulator state read by the observation terms for one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationFrame {
    /// Robot root pose.
    pub robot_root: Pose,
    /// End-effector frame pose.
    pub ee: Pose,
    /// Finger positions.
    pub gripper: [f64; 2],
    /// Goal in the robot-root frame.
    pub goal_local: FrameTransform,
    /// Joint positions.
    pub joint_pos: Vec<f64>,
    /// Joint positions at reset.
    pub default_joint_pos: Vec<f64>,
    /// Joint velocities.
    pub joint_vel: Vec<f64>,
    /// Previous action.
    pub last_action: Vec<f64>,
    entities: Vec<Option<Pose>>,
}

impl ObservationFrame {
    /// Frame with empty joint and action vectors and no entity poses.
    #[must_use]
    pub fn new(robot_root: Pose, ee: Pose, gripper: [f64; 2], goal_local: FrameTransform) -> Self {
        Self {
            robot_root,
            ee,
            gripper,
            goal_local,
            joint_pos: Vec::new(),
            default_joint_pos: Vec::new(),
            joint_vel: Vec::new(),
            last_action: Vec::new(),
            entities: Vec::new(),
        }
    }

    /// Set joint state.
    #[must_use]
    pub fn with_joints(
        mut self,
        joint_pos: Vec<f64>,
        default_joint_pos: Vec<f64>,
        joint_vel: Vec<f64>,
    ) -> Self {
        self.joint_pos = joint_pos;
        self.default_joint_pos = default_joint_pos;
        self.joint_vel = joint_vel;
        self
    }

    /// Set the previous action.
    #[must_use]
    pub fn with_last_action(mut self, last_action: Vec<f64>) -> Self {
        self.last_action = last_action;
        self
    }

    /// Record the world pose of an entity.
    #[must_use]
    pub fn with_entity(mut self, handle: EntityHandle, pose: Pose) -> Self {
        let index = handle.index();
        if self.entities.len() <= index {
            self.entities.resize(index + 1, None);
        }
        self.entities[index] = Some(pose);
        self
    }

    /// World pose of an entity, if recorded.
    #[must_use]
    pub fn entity(&self, handle: EntityHandle) -> Option<Pose> {
        self.entities.get(handle.index()).copied().flatten()
    }
}

/// Observation of one group.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// All terms in one vector.
    Concatenated(Vec<f64>),
    /// Terms kept apart, in group order.
    Terms(Vec<(String, Vec<f64>)>),
}

impl Observation {
    /// Values of a named term. `None` for concatenated observations.
    #[must_use]
    pub fn term(&self, name: &str) -> Option<&[f64]> {
        match self {
            Self::Concatenated(_) => None,
            Self::Terms(terms) => terms
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_slice()),
        }
    }

    /// Total number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Concatenated(v) => v.len(),
            Self::Terms(terms) => terms.iter().map(|(_, v)| v.len()).sum(),
        }
    }

    /// Whether there are no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
struct BoundTerm {
    term: ObservationTerm,
    entity: Option<EntityHandle>,
}

/// An observation group resolved against a scene.
#[derive(Debug, Clone)]
pub struct ObservationPipeline {
    terms: Vec<BoundTerm>,
    enable_corruption: bool,
    concatenate_terms: bool,
}

impl ObservationPipeline {
    /// Compute every term on `frame`.
    pub fn compute<R: Rng + ?Sized>(
        &self,
        frame: &ObservationFrame,
        rng: &mut R,
    ) -> Result<Observation> {
        let mut values = Vec::with_capacity(self.terms.len());
        for bound in &self.terms {
            let mut value = self.term_value(bound, frame)?;
            if self.enable_corruption {
                if let Some((lo, hi)) = bound.term.noise {
                    for v in &mut value {
                        *v += rng.gen_range(lo..=hi);
                    }
                }
            }
            values.push((bound.term.name.clone(), value));
        }

        Ok(if self.concatenate_terms {
            Observation::Concatenated(values.into_iter().flat_map(|(_, v)| v).collect())
        } else {
            Observation::Terms(values)
        })
    }

    fn term_value(&self, bound: &BoundTerm, frame: &ObservationFrame) -> Result<Vec<f64>> {
        let entity_pose = || -> Result<Pose> {
            bound
                .entity
                .and_then(|h| frame.entity(h))
                .ok_or_else(|| EnvError::MissingPose(bound.term.name.clone()))
        };
        Ok(match &bound.term.kind {
            ObservationKind::JointPosRel => frame
                .joint_pos
                .iter()
                .zip(&frame.default_joint_pos)
                .map(|(q, q0)| q - q0)
                .collect(),
            ObservationKind::JointVelRel => frame.joint_vel.clone(),
            ObservationKind::LastAction => frame.last_action.clone(),
            ObservationKind::ObjectPositionInRobotRootFrame { .. }
            | ObservationKind::PositionInBaseFrame { .. } => {
                let local = frame
                    .robot_root
                    .inverse_transform_point(&entity_pose()?.position);
                local.coords.iter().copied().collect()
            }
            ObservationKind::OrientationInBaseFrame { .. } => {
                in_root_frame(&frame.robot_root, &entity_pose()?).wxyz().to_vec()
            }
            ObservationKind::GeneratedCommands => {
                let goal = &frame.goal_local;
                let mut v: Vec<f64> = goal.position.coords.iter().copied().collect();
                v.extend(goal.wxyz());
                v
            }
            ObservationKind::EePosition => frame.ee.position.coords.iter().copied().collect(),
            ObservationKind::EeOrientation => frame.ee.wxyz().to_vec(),
            ObservationKind::GripperPosition => vec![frame.gripper[0], -frame.gripper[1]],
        })
    }

    /// Whether terms are delivered as one vector.
    #[must_use]
    pub const fn concatenates(&self) -> bool {
        self.concatenate_terms
    }

    /// Whether noise is applied.
    #[must_use]
    pub const fn corrupts(&self) -> bool {
        self.enable_corruption
    }
}

fn in_root_frame(root: &Pose, world: &Pose) -> Pose {
    Pose::from_position_rotation(
        root.inverse_transform_point(&world.position),
        root.rotation.inverse() * world.rotation,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use task_types::{EntityKind, Point3};

    fn registry() -> SceneRegistry {
        let mut registry = SceneRegistry::new();
        registry.register("robot", EntityKind::Robot).unwrap();
        registry.register("ketchup", EntityKind::Object).unwrap();
        registry.register("basket", EntityKind::Container).unwrap();
        registry
    }

    fn root() -> Pose {
        // Rotated -90 degrees about z
        Pose::from_wxyz([1.0, 2.0, 0.4], [0.707_106_78, 0.0, 0.0, -0.707_106_78])
    }

    #[test]
    fn test_policy_vector_layout() {
        let registry = registry();
        let pipeline = ObservationGroup::policy("ketchup").bind(&registry).unwrap();
        let ketchup = registry.resolve("ketchup").unwrap();

        let goal = Pose::from_position(Point3::new(0.406, 0.222, 0.375));
        let frame = ObservationFrame::new(root(), Pose::identity(), [0.04, 0.04], goal)
            .with_joints(vec![0.1, -0.5], vec![0.0, -0.79], vec![0.3, 0.0])
            .with_last_action(vec![0.0; 7])
            .with_entity(ketchup, Pose::from_position(Point3::new(1.0, 1.0, 0.5)));

        let obs = pipeline
            .compute(&frame, &mut ChaCha8Rng::seed_from_u64(0))
            .unwrap();
        let Observation::Concatenated(v) = obs else {
            panic!("policy group concatenates");
        };
        assert_eq!(v.len(), 2 + 2 + 3 + 7 + 7);
        assert_relative_eq!(v[1], 0.29, epsilon = 1e-12);

        // One meter along world -y is one meter along the root's +x
        assert_relative_eq!(v[4], 1.0, epsilon = 1e-6);
        assert_relative_eq!(v[5], 0.0, epsilon = 1e-6);
        assert_relative_eq!(v[6], 0.1, epsilon = 1e-12);

        assert_eq!(&v[7..10], &[0.406, 0.222, 0.375]);
        assert_eq!(v[10], 1.0);
    }

    #[test]
    fn test_demo_terms_in_base_frame() {
        let registry = registry();
        let pipeline = ObservationGroup::demo_policy("ketchup", "basket")
            .bind(&registry)
            .unwrap();
        let ketchup = registry.resolve("ketchup").unwrap();
        let basket = registry.resolve("basket").unwrap();

        let frame = ObservationFrame::new(root(), Pose::identity(), [0.03, 0.03], Pose::identity())
            .with_entity(ketchup, root())
            .with_entity(basket, Pose::from_position(Point3::new(1.0, 2.0, 0.5)));

        let obs = pipeline
            .compute(&frame, &mut ChaCha8Rng::seed_from_u64(0))
            .unwrap();
        assert!(!pipeline.concatenates());
        assert_eq!(obs.term("gripper_pos").unwrap(), [0.03, -0.03]);

        let q = obs.term("ketchup_quat").unwrap();
        assert_relative_eq!(q[0].abs(), 1.0, epsilon = 1e-9);
        let p = obs.term("ketchup_pos").unwrap();
        assert_relative_eq!(p[0], 0.0, epsilon = 1e-12);

        let basket_pos = obs.term("basket_pos").unwrap();
        assert_relative_eq!(basket_pos[2], 0.1, epsilon = 1e-12);
        assert_eq!(obs.term("eef_quat").unwrap(), [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_missing_entity_pose() {
        let registry = registry();
        let pipeline = ObservationGroup::policy("ketchup").bind(&registry).unwrap();
        let frame = ObservationFrame::new(root(), Pose::identity(), [0.04, 0.04], Pose::identity());
        let err = pipeline
            .compute(&frame, &mut ChaCha8Rng::seed_from_u64(0))
            .unwrap_err();
        assert!(matches!(err, EnvError::MissingPose(name) if name == "object_position"));
    }

    #[test]
    fn test_noise_only_when_corrupted() {
        let registry = registry();
        let mut group = ObservationGroup::policy("ketchup");
        group.terms = vec![ObservationTerm::new("joint_vel", ObservationKind::JointVelRel)
            .with_noise(-0.01, 0.01)];
        let frame = ObservationFrame::new(root(), Pose::identity(), [0.04, 0.04], Pose::identity())
            .with_joints(vec![], vec![], vec![0.0; 9]);
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let noisy = group.bind(&registry).unwrap().compute(&frame, &mut rng).unwrap();
        let Observation::Concatenated(v) = noisy else {
            panic!("policy group concatenates");
        };
        assert!(v.iter().all(|x| x.abs() <= 0.01));
        assert!(v.iter().any(|x| *x != 0.0));

        let clean = group
            .without_corruption()
            .bind(&registry)
            .unwrap()
            .compute(&frame, &mut rng)
            .unwrap();
        assert_eq!(clean, Observation::Concatenated(vec![0.0; 9]));
    }

    #[test]
    fn test_validation() {
        let registry = registry();
        assert!(ObservationGroup::policy("mustard").bind(&registry).is_err());

        let mut group = ObservationGroup::policy("ketchup");
        group.terms.push(ObservationTerm::new("actions", ObservationKind::LastAction));
        assert!(matches!(group.validate(), Err(EnvError::InvalidConfig(_))));

        let mut group = ObservationGroup::policy("ketchup");
        group.terms[0].noise = Some((0.1, -0.1));
        assert!(matches!(group.validate(), Err(EnvError::InvalidRange { .. })));
    }

    #[test]
    fn test_json_round_trip() {
        let config = ObservationConfig::demo("ketchup", "basket");
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"position_in_base_frame\""));
        let back: ObservationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
