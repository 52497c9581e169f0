//! Robot joint state and gripper classification.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::TaskError;
use crate::Result;

/// Ordered joint positions of an articulated robot, indexed by name.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointPositions {
    names: Vec<String>,
    values: Vec<f64>,
}

impl JointPositions {
    /// Create from parallel name and value lists.
    pub fn new(names: Vec<String>, values: Vec<f64>) -> Result<Self> {
        if names.len() != values.len() {
            return Err(TaskError::JointCountMismatch {
                names: names.len(),
                values: values.len(),
            });
        }
        Ok(Self { names, values })
    }

    /// Create from `(name, value)` pairs.
    #[must_use]
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        let (names, values) = pairs
            .into_iter()
            .map(|(n, v)| (n.to_owned(), v))
            .unzip();
        Self { names, values }
    }

    /// Index of a joint by name.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Position of a joint by index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Position of a joint by name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<f64> {
        self.index_of(name).and_then(|i| self.get(i))
    }

    /// Overwrite a joint position by index. Returns `false` if out of range.
    pub fn set(&mut self, index: usize, value: f64) -> bool {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Joint names in order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Joint values in order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of joints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no joints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Indices of the two gripper finger joints, resolved once by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GripperJoints {
    first: usize,
    second: usize,
}

impl GripperJoints {
    /// Resolve both finger joint names against a joint list.
    pub fn resolve(joints: &JointPositions, names: &[String; 2]) -> Result<Self> {
        let find = |name: &String| {
            joints
                .index_of(name)
                .ok_or_else(|| TaskError::joint_not_found(name.as_str()))
        };
        Ok(Self {
            first: find(&names[0])?,
            second: find(&names[1])?,
        })
    }

    /// Read the two finger positions.
    #[must_use]
    pub fn read(&self, joints: &JointPositions) -> Option<[f64; 2]> {
        Some([joints.get(self.first)?, joints.get(self.second)?])
    }

    /// Indices of the two finger joints.
    #[must_use]
    pub const fn indices(&self) -> [usize; 2] {
        [self.first, self.second]
    }
}

/// Open/closed classification of the gripper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GripperState {
    /// At least one finger is within tolerance of the open position.
    Open,
    /// Both fingers are away from the open position.
    Closed,
}

/// Parameters for classifying finger joint positions.
///
/// A finger is *closed* when `| |q| - open_value | > tolerance`. The absolute
/// value of `q` is taken because mirrored fingers may report negative
/// positions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GripperConfig {
    /// Names of the two finger joints.
    pub joint_names: [String; 2],
    /// Finger position when fully open (meters).
    pub open_value: f64,
    /// Maximum deviation from `open_value` still considered open.
    pub tolerance: f64,
}

impl Default for GripperConfig {
    fn default() -> Self {
        Self::franka()
    }
}

impl GripperConfig {
    /// Franka Panda hand: fingers open at 0.04 m, 1 cm tolerance.
    #[must_use]
    pub fn franka() -> Self {
        Self {
            joint_names: [
                "panda_finger_joint1".to_owned(),
                "panda_finger_joint2".to_owned(),
            ],
            open_value: 0.04,
            tolerance: 0.01,
        }
    }

    /// Set the open reference value.
    #[must_use]
    pub fn with_open_value(mut self, open_value: f64) -> Self {
        self.open_value = open_value;
        self
    }

    /// Set the classification tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.open_value.is_finite() || self.open_value < 0.0 {
            return Err(TaskError::invalid_gripper(format!(
                "open value must be finite and non-negative, got {}",
                self.open_value
            )));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(TaskError::invalid_gripper(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.joint_names[0] == self.joint_names[1] {
            return Err(TaskError::invalid_gripper(
                "finger joint names must be distinct",
            ));
        }
        Ok(())
    }

    /// Whether a single finger registers as closed.
    #[must_use]
    pub fn finger_closed(&self, position: f64) -> bool {
        (position.abs() - self.open_value).abs() > self.tolerance
    }

    /// Classify a finger pair. Closed only if both fingers are closed.
    #[must_use]
    pub fn classify(&self, fingers: [f64; 2]) -> GripperState {
        if self.finger_closed(fingers[0]) && self.finger_closed(fingers[1]) {
            GripperState::Closed
        } else {
            GripperState::Open
        }
    }

    /// Whether both fingers are within tolerance of the open position.
    ///
    /// Stricter than `classify(..) == Open`, which accepts a half-open hand.
    /// A finger exactly at the tolerance does not count as open.
    #[must_use]
    pub fn is_fully_open(&self, fingers: [f64; 2]) -> bool {
        fingers
            .iter()
            .all(|f| (f.abs() - self.open_value).abs() < self.tolerance)
    }
}
