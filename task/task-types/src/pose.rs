//! Rigid poses and frame composition.

use nalgebra::{Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Position and orientation of a body or frame.
///
/// Poses of scene entities are expressed in the world frame. A pose can also
/// describe one frame relative to another (see [`FrameTransform`]), in which
/// case [`Pose::compose`] maps it into the parent's frame.
///
/// # Example
///
/// ```
/// use task_types::Pose;
/// use nalgebra::{Point3, UnitQuaternion};
///
/// let root = Pose::from_position_rotation(
///     Point3::new(1.0, 0.0, 0.0),
///     UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2),
/// );
///
/// // (1, 0, 0) in the root frame is (1, 1, 0) in the world
/// let world = root.transform_point(&Point3::new(1.0, 0.0, 0.0));
/// assert!((world.x - 1.0).abs() < 1e-10);
/// assert!((world.y - 1.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// Position in meters.
    pub position: Point3<f64>,
    /// Orientation as a unit quaternion.
    pub rotation: UnitQuaternion<f64>,
}

/// A pose used as the transform from a child frame into its parent frame.
///
/// Goal commands are stored as a `FrameTransform` relative to the robot root,
/// so they move rigidly with the robot base.
pub type FrameTransform = Pose;

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// Create an identity pose (origin, no rotation).
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from position only (identity rotation).
    #[must_use]
    pub fn from_position(position: Point3<f64>) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from position and rotation.
    #[must_use]
    pub const fn from_position_rotation(
        position: Point3<f64>,
        rotation: UnitQuaternion<f64>,
    ) -> Self {
        Self { position, rotation }
    }

    /// Create a pose from a position and a `(w, x, y, z)` quaternion.
    ///
    /// The quaternion is normalized, so configuration values rounded to a few
    /// digits (e.g. `0.70710678`) are accepted.
    #[must_use]
    pub fn from_wxyz(position: [f64; 3], wxyz: [f64; 4]) -> Self {
        let [w, x, y, z] = wxyz;
        Self {
            position: Point3::from(position),
            rotation: UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(w, x, y, z)),
        }
    }

    /// Create a pose from a position and roll/pitch/yaw angles (radians).
    #[must_use]
    pub fn from_xyz_rpy(position: [f64; 3], roll: f64, pitch: f64, yaw: f64) -> Self {
        Self {
            position: Point3::from(position),
            rotation: UnitQuaternion::from_euler_angles(roll, pitch, yaw),
        }
    }

    /// Orientation as a `(w, x, y, z)` array.
    #[must_use]
    pub fn wxyz(&self) -> [f64; 4] {
        let q = self.rotation.quaternion();
        [q.w, q.i, q.j, q.k]
    }

    /// Transform a point from local to parent coordinates.
    #[must_use]
    pub fn transform_point(&self, local: &Point3<f64>) -> Point3<f64> {
        self.position + self.rotation * local.coords
    }

    /// Transform a point from parent to local coordinates.
    #[must_use]
    pub fn inverse_transform_point(&self, world: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation.inverse() * (world - self.position))
    }

    /// Compose two poses: `self * other`.
    ///
    /// `other` is expressed in the frame described by `self`; the result is
    /// `other` expressed in `self`'s parent frame.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            position: self.transform_point(&other.position),
            rotation: self.rotation * other.rotation,
        }
    }

    /// Euclidean distance between the two positions.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        (other.position - self.position).norm()
    }

    /// Offset from `self` to `other` in the parent frame.
    #[must_use]
    pub fn offset_to(&self, other: &Self) -> Vector3<f64> {
        other.position - self.position
    }

    /// Yaw angle (rotation about +Z) in radians.
    #[must_use]
    pub fn yaw(&self) -> f64 {
        self.rotation.euler_angles().2
    }

    /// Check if the pose contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|x| x.is_finite())
            && self.rotation.coords.iter().all(|x| x.is_finite())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity_compose() {
        let p = Pose::from_position(Point3::new(1.0, 2.0, 3.0));
        assert_eq!(Pose::identity().compose(&p), p);
    }

    #[test]
    fn test_compose_rotates_then_translates() {
        let root = Pose::from_position_rotation(
            Point3::new(1.0, 2.0, 0.0),
            UnitQuaternion::from_euler_angles(0.0, 0.0, FRAC_PI_2),
        );
        let local = Pose::from_position(Point3::new(0.5, 0.0, 0.25));

        let world = root.compose(&local);
        assert_relative_eq!(world.position.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(world.position.y, 2.5, epsilon = 1e-12);
        assert_relative_eq!(world.position.z, 0.25, epsilon = 1e-12);
        assert_relative_eq!(world.yaw(), FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_transform_round_trip() {
        let root = Pose::from_xyz_rpy([1.5, 1.9, 0.4], 0.1, -0.2, 0.7);
        let p = Point3::new(1.76, 1.48, 0.8);
        let back = root.transform_point(&root.inverse_transform_point(&p));
        assert_relative_eq!(back, p, epsilon = 1e-12);
    }

    #[test]
    fn test_from_wxyz_normalizes() {
        // Franka base: -90 degrees about Z, rounded to 8 digits
        let pose = Pose::from_wxyz([1.53773, 1.88609, 0.42492], [0.70710678, 0.0, 0.0, -0.70710678]);
        assert_relative_eq!(pose.rotation.quaternion().norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(pose.yaw(), -FRAC_PI_2, epsilon = 1e-6);

        let [w, _, _, z] = pose.wxyz();
        assert_relative_eq!(w, std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-6);
        assert_relative_eq!(z, -std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-6);
    }

    #[test]
    fn test_distance() {
        let a = Pose::from_position(Point3::new(0.0, 0.0, 0.0));
        let b = Pose::from_position(Point3::new(3.0, 4.0, 0.0));
        assert_relative_eq!(a.distance_to(&b), 5.0);
        assert_eq!(a.offset_to(&b), Vector3::new(3.0, 4.0, 0.0));
    }

    #[test]
    fn test_is_finite() {
        assert!(Pose::identity().is_finite());
        let bad = Pose::from_position(Point3::new(f64::NAN, 0.0, 0.0));
        assert!(!bad.is_finite());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_round_trip() {
        let pose = Pose::from_xyz_rpy([1.0, 2.0, 3.0], 1.5708, 0.0, 0.3);
        let json = serde_json::to_string(&pose).unwrap();
        let back: Pose = serde_json::from_str(&json).unwrap();
        assert_relative_eq!(back.position, pose.position);
    }
}
