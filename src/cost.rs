//! Motion-time cost model.
//!
//! A move between two poses is priced in seconds. The stage translates and
//! the camera rotates at the same time, so a segment lasts as long as the
//! slower of the two axes. Each axis follows a trapezoidal velocity profile
//! (accelerate, cruise, decelerate) that degenerates to a triangle when the
//! move is too short to reach peak velocity.

use crate::instance::{KinematicLimits, Pose};
use serde::{Deserialize, Serialize};

/// Time needed to cover `distance` with peak velocity `v_max` and
/// symmetric acceleration/deceleration `a_max`.
///
/// Up to the ramp distance `2·v_max²/a_max` the profile is triangular
/// (`sqrt(4·distance/a_max)`), past it the accelerate/cruise/decelerate
/// time `2·v_max/a_max + (distance - ramp)/v_max` applies. The two branches
/// do not meet at the ramp distance; see [`monotone_translation_time`].
///
/// Non-positive limits fall back to constant velocity (`distance / v_max`),
/// and to zero when `v_max` is not positive either.
pub fn translation_time(distance: f64, v_max: f64, a_max: f64) -> f64 {
    if a_max <= 0.0 || v_max <= 0.0 {
        return constant_velocity_time(distance, v_max);
    }

    let t_accel = v_max / a_max;
    let ramp_distance = 2.0 * v_max * t_accel;

    if distance <= ramp_distance {
        (4.0 * distance / a_max).sqrt()
    } else {
        2.0 * t_accel + (distance - ramp_distance) / v_max
    }
}

/// [`translation_time`] held at the triangular time of the ramp distance
/// until the cruise branch catches up, so time never drops as distance grows.
pub fn monotone_translation_time(distance: f64, v_max: f64, a_max: f64) -> f64 {
    let t = translation_time(distance, v_max, a_max);
    if a_max <= 0.0 || v_max <= 0.0 {
        return t;
    }

    let ramp_distance = 2.0 * v_max * v_max / a_max;
    if distance > ramp_distance {
        t.max((4.0 * ramp_distance / a_max).sqrt())
    } else {
        t
    }
}

/// Same profile as [`translation_time`], applied to an angle in degrees.
/// Only the magnitude of `delta_angle` matters.
pub fn rotation_time(delta_angle: f64, omega_max: f64, alpha_max: f64) -> f64 {
    translation_time(delta_angle.abs(), omega_max, alpha_max)
}

/// Same profile as [`monotone_translation_time`], applied to an angle in degrees.
pub fn monotone_rotation_time(delta_angle: f64, omega_max: f64, alpha_max: f64) -> f64 {
    monotone_translation_time(delta_angle.abs(), omega_max, alpha_max)
}

/// `distance / velocity`, or 0 for a non-positive velocity.
#[inline]
pub fn constant_velocity_time(distance: f64, velocity: f64) -> f64 {
    if velocity > 0.0 {
        distance / velocity
    } else {
        0.0
    }
}

/// Smallest rotation in degrees between two headings, in `[0, 180]`.
///
/// `minimal_angle_delta(0.0, 350.0) == 10.0`.
pub fn minimal_angle_delta(from: f64, to: f64) -> f64 {
    // |to - from| keeps the result bit-identical when the arguments swap.
    let d = (to - from).abs() % 360.0;
    d.min(360.0 - d)
}

/// Duration of the move `from -> to`: the slower of translation and rotation.
///
/// Symmetric in its pose arguments.
pub fn segment_time(from: &Pose, to: &Pose, limits: &KinematicLimits) -> f64 {
    let distance = from.position.distance(&to.position);
    let delta_angle = minimal_angle_delta(from.angle, to.angle);

    let trans = translation_time(distance, limits.stage_velocity, limits.stage_acceleration);
    let rot = rotation_time(delta_angle, limits.camera_velocity, limits.camera_acceleration);

    trans.max(rot)
}

/// [`segment_time`] with both axes on the monotone profile.
pub fn monotone_segment_time(from: &Pose, to: &Pose, limits: &KinematicLimits) -> f64 {
    let distance = from.position.distance(&to.position);
    let delta_angle = minimal_angle_delta(from.angle, to.angle);

    let trans = monotone_translation_time(distance, limits.stage_velocity, limits.stage_acceleration);
    let rot = monotone_rotation_time(delta_angle, limits.camera_velocity, limits.camera_acceleration);

    trans.max(rot)
}

/// Metric a route is scored with.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CostModel {
    /// Trapezoidal translation and rotation, concurrent axes.
    #[default]
    Trapezoidal,
    /// Trapezoidal, with the cruise branch never faster than the longest
    /// triangular move.
    MonotoneTrapezoidal,
    /// Straight-line distance at the stage's peak velocity, no rotation.
    ConstantVelocity,
}

impl CostModel {
    pub fn segment_time(self, from: &Pose, to: &Pose, limits: &KinematicLimits) -> f64 {
        match self {
            CostModel::Trapezoidal => segment_time(from, to, limits),
            CostModel::MonotoneTrapezoidal => monotone_segment_time(from, to, limits),
            CostModel::ConstantVelocity => constant_velocity_time(
                from.position.distance(&to.position),
                limits.stage_velocity,
            ),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CostModel::Trapezoidal => "trapezoidal",
            CostModel::MonotoneTrapezoidal => "monotone-trapezoidal",
            CostModel::ConstantVelocity => "constant-velocity",
        }
    }
}

impl std::fmt::Display for CostModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Position;
    use proptest::prelude::*;

    fn limits() -> KinematicLimits {
        KinematicLimits::new(10.0, 100.0, 90.0, 1000.0)
    }

    #[test]
    fn test_cruise_profile() {
        // ramp distance 2 < 10: 0.2 s of ramps + 0.8 s cruise
        assert!((translation_time(10.0, 10.0, 100.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_triangular_profile() {
        // ramp distance 2 >= 1
        let t = translation_time(1.0, 10.0, 100.0);
        assert!((t - (4.0_f64 / 100.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_cruise_branch_past_ramp_distance() {
        let at_ramp = translation_time(2.0, 10.0, 100.0);
        assert!((at_ramp - 0.08_f64.sqrt()).abs() < 1e-12);

        // 0.2 s of ramps + 0.05 s cruise, below the time at the ramp distance
        let just_past = translation_time(2.5, 10.0, 100.0);
        assert!((just_past - 0.25).abs() < 1e-12);

        // 64.8 deg ramp: 0.36 s + 5.2 / 180 s
        let turn = rotation_time(70.0, 180.0, 1000.0);
        assert!((turn - (0.36 + 5.2 / 180.0)).abs() < 1e-12);
    }

    #[test]
    fn test_monotone_profile_holds_ramp_time() {
        let at_ramp = monotone_translation_time(2.0, 10.0, 100.0);
        let just_past = monotone_translation_time(2.5, 10.0, 100.0);
        assert!((just_past - at_ramp).abs() < 1e-12);

        // outside the band both profiles agree
        assert_eq!(monotone_translation_time(1.0, 10.0, 100.0), translation_time(1.0, 10.0, 100.0));
        assert_eq!(monotone_translation_time(3.0, 10.0, 100.0), translation_time(3.0, 10.0, 100.0));
        assert_eq!(monotone_translation_time(10.0, 5.0, 0.0), 2.0);

        let a = Pose::new(Position::new(0.0, 0.0), 0.0);
        let b = Pose::new(Position::new(2.5, 0.0), 0.0);
        let t = CostModel::MonotoneTrapezoidal.segment_time(&a, &b, &limits());
        assert!((t - at_ramp).abs() < 1e-12);
        assert!((CostModel::Trapezoidal.segment_time(&a, &b, &limits()) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_limits() {
        assert_eq!(translation_time(10.0, 5.0, 0.0), 2.0);
        assert_eq!(translation_time(10.0, 0.0, 100.0), 0.0);
        assert_eq!(translation_time(0.0, 0.0, 0.0), 0.0);
        assert_eq!(rotation_time(-30.0, 10.0, -1.0), 3.0);
    }

    #[test]
    fn test_angle_wraparound() {
        assert!((minimal_angle_delta(0.0, 350.0) - 10.0).abs() < 1e-12);
        assert!((minimal_angle_delta(350.0, 0.0) - 10.0).abs() < 1e-12);
        assert!((minimal_angle_delta(-170.0, 170.0) - 20.0).abs() < 1e-12);
        assert!((minimal_angle_delta(0.0, 180.0) - 180.0).abs() < 1e-12);
        assert_eq!(minimal_angle_delta(45.0, 405.0), 0.0);

        let raw = rotation_time(minimal_angle_delta(0.0, 350.0), 90.0, 1000.0);
        let short = rotation_time(minimal_angle_delta(0.0, 10.0), 90.0, 1000.0);
        assert!((raw - short).abs() < 1e-12);
    }

    #[test]
    fn test_segment_takes_slower_axis() {
        let origin = Pose::new(Position::new(0.0, 0.0), 0.0);
        let near_turned = Pose::new(Position::new(1.0, 0.0), 90.0);

        let trans = translation_time(1.0, 10.0, 100.0);
        let rot = rotation_time(90.0, 90.0, 1000.0);
        assert!(rot > trans);

        let t = segment_time(&origin, &near_turned, &limits());
        assert!((t - rot).abs() < 1e-12);
    }

    #[test]
    fn test_constant_velocity_model_ignores_rotation() {
        let a = Pose::new(Position::new(0.0, 0.0), 0.0);
        let b = Pose::new(Position::new(3.0, 4.0), 179.0);
        let t = CostModel::ConstantVelocity.segment_time(&a, &b, &limits());
        assert!((t - 0.5).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn segment_time_is_symmetric(
            ax in -500.0..500.0f64, ay in -500.0..500.0f64, aa in -720.0..720.0f64,
            bx in -500.0..500.0f64, by in -500.0..500.0f64, ba in -720.0..720.0f64,
            v in 0.0..100.0f64, acc in 0.0..1000.0f64,
            w in 0.0..360.0f64, alpha in 0.0..5000.0f64,
        ) {
            let limits = KinematicLimits::new(v, acc, w, alpha);
            let a = Pose::new(Position::new(ax, ay), aa);
            let b = Pose::new(Position::new(bx, by), ba);
            let ab = segment_time(&a, &b, &limits);
            let ba_ = segment_time(&b, &a, &limits);
            prop_assert_eq!(ab, ba_);
            prop_assert!(ab.is_finite() && ab >= 0.0);
        }

        #[test]
        fn monotone_translation_time_is_monotonic(
            d1 in 0.0..1000.0f64, extra in 0.0..1000.0f64,
            v in 0.01..100.0f64, acc in 0.01..1000.0f64,
        ) {
            let t1 = monotone_translation_time(d1, v, acc);
            let t2 = monotone_translation_time(d1 + extra, v, acc);
            prop_assert!(t2 + 1e-12 >= t1);
        }

        #[test]
        fn translation_time_is_monotonic_within_each_branch(
            f1 in 0.0..1.0f64, f2 in 0.0..1.0f64,
            over1 in 0.0..1000.0f64, over2 in 0.0..1000.0f64,
            v in 0.01..100.0f64, acc in 0.01..1000.0f64,
        ) {
            let ramp = 2.0 * v * v / acc;

            let (lo, hi) = if f1 <= f2 { (f1, f2) } else { (f2, f1) };
            prop_assert!(translation_time(hi * ramp, v, acc) + 1e-12 >= translation_time(lo * ramp, v, acc));

            let (lo, hi) = if over1 <= over2 { (over1, over2) } else { (over2, over1) };
            let near = translation_time(ramp * (1.0 + 1e-9) + lo, v, acc);
            let far = translation_time(ramp * (1.0 + 1e-9) + hi, v, acc);
            prop_assert!(far + 1e-12 >= near);
        }

        #[test]
        fn minimal_delta_is_bounded(from in -1000.0..1000.0f64, to in -1000.0..1000.0f64) {
            let d = minimal_angle_delta(from, to);
            prop_assert!((0.0..=180.0).contains(&d));
        }
    }
}
