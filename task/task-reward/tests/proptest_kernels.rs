//! Property-based tests for the progress and release kernels.
//!
//! Run with: cargo test -p task-reward -- proptest

#![allow(clippy::unwrap_used, clippy::approx_constant)]

use proptest::prelude::*;
use task_reward::{detect_hold_at_goal, score_progress};
use task_types::{Point3, Pose, UnitQuaternion};

// =============================================================================
// Strategies
// =============================================================================

fn arb_point(lo: f64, hi: f64) -> impl Strategy<Value = Point3<f64>> {
    prop::array::uniform3(lo..hi).prop_map(|[x, y, z]| Point3::new(x, y, z))
}

fn arb_root() -> impl Strategy<Value = Pose> {
    (arb_point(-2.0, 2.0), -3.14..3.14f64).prop_map(|(p, yaw)| {
        Pose::from_position_rotation(p, UnitQuaternion::from_euler_angles(0.0, 0.0, yaw))
    })
}

fn arb_finger() -> impl Strategy<Value = f64> {
    -0.05..0.05f64
}

// =============================================================================
// Progress scorer
// =============================================================================

proptest! {
    #[test]
    fn proptest_progress_in_unit_interval(
        object in arb_point(-3.0, 3.0),
        root in arb_root(),
        goal in arb_point(-1.0, 1.0),
        sigma in 0.01..2.0f64,
        min_lift in -1.0..1.0f64,
    ) {
        let r = score_progress(
            &Pose::from_position(object),
            &root,
            &Pose::from_position(goal),
            sigma,
            min_lift,
            1.0,
        );
        prop_assert!((0.0..=1.0).contains(&r));
        if object.z <= min_lift {
            prop_assert_eq!(r, 0.0);
        }
    }

    #[test]
    fn proptest_progress_non_increasing_with_distance(
        root in arb_root(),
        goal in arb_point(-1.0, 1.0),
        dir in arb_point(-1.0, 1.0),
        near in 0.0..1.0f64,
        extra in 0.0..1.0f64,
        sigma in 0.05..2.0f64,
    ) {
        prop_assume!(dir.coords.norm() > 1e-3);
        let goal_local = Pose::from_position(goal);
        let goal_world = root.compose(&goal_local).position;
        let unit = dir.coords.normalize();

        // Keep both samples lifted by using a threshold far below either point
        let min_lift = goal_world.z - 10.0;
        let a = Pose::from_position(goal_world + unit * near);
        let b = Pose::from_position(goal_world + unit * (near + extra));

        let ra = score_progress(&a, &root, &goal_local, sigma, min_lift, 1.0);
        let rb = score_progress(&b, &root, &goal_local, sigma, min_lift, 1.0);
        prop_assert!(rb <= ra + 1e-12);
    }
}

// =============================================================================
// Release-penalty detector
// =============================================================================

proptest! {
    #[test]
    fn proptest_hold_requires_both_fingers_closed(
        root in arb_root(),
        goal in arb_point(-1.0, 1.0),
        q1 in arb_finger(),
        q2 in arb_finger(),
    ) {
        let goal_local = Pose::from_position(goal);
        let object = root.compose(&goal_local);

        let closed = |q: f64| (q.abs() - 0.04).abs() > 0.01;
        let fired = detect_hold_at_goal(&object, &root, &goal_local, 0.08, [q1, q2], 0.04, 0.01);
        prop_assert_eq!(fired, closed(q1) && closed(q2));
    }

    #[test]
    fn proptest_hold_never_fires_away_from_goal(
        root in arb_root(),
        goal in arb_point(-1.0, 1.0),
        offset in 0.081..2.0f64,
    ) {
        let goal_local = Pose::from_position(goal);
        let mut object = root.compose(&goal_local);
        object.position.x += offset;

        prop_assert!(!detect_hold_at_goal(&object, &root, &goal_local, 0.08, [0.0, 0.0], 0.04, 0.01));
    }
}
