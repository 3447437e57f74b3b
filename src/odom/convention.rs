//! Remapping of device conventions to the robot's motion convention.
//!
//! The device reports a compass heading (zero at North, East at 90°,
//! clockwise) while the robot convention has zero pointing east (+X) with
//! counter-clockwise rotation positive. Pitch and the transverse/down angular
//! rates flip sign for the same reason; forward speed is unsigned on the wire
//! and takes its sign from the transmission gear.

use std::f64::consts::{PI, TAU};

use nalgebra::Vector3;

use super::datatypes::{Gear, Velocity3D};
use crate::device::NavSample;

/// Wraps an angle in radians to the canonical range (−π, π].
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI { wrapped - TAU } else { wrapped }
}

/// Attitude in robot convention: (roll, pitch, yaw) in radians.
pub fn orientation(sample: &NavSample) -> (f64, f64, f64) {
    let roll = sample.roll_deg.to_radians();
    let pitch = (-sample.pitch_deg).to_radians();
    let yaw = normalize_angle((90.0 - sample.heading_deg).to_radians());

    (roll, pitch, yaw)
}

/// Body-frame velocity with the gear-aware sign correction applied to the
/// forward speed.
pub fn velocity(sample: &NavSample, gear: Gear) -> Velocity3D {
    let speed = if gear == Gear::Reverse {
        -sample.speed_mps
    } else {
        sample.speed_mps
    };

    Velocity3D {
        linear: Vector3::new(speed, 0.0, -sample.vel_down_mps),
        angular: Vector3::new(
            sample.arate_lon_dps.to_radians(),
            (-sample.arate_trans_dps).to_radians(),
            (-sample.arate_down_dps).to_radians(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::Utc;

    use super::*;
    use crate::device::AlignmentStatus;

    fn sample() -> NavSample {
        NavSample {
            time: Utc::now(),
            lat_deg: 30.285,
            lon_deg: -97.7335,
            alt_m: 160.0,
            heading_deg: 0.0,
            roll_deg: 0.0,
            pitch_deg: 0.0,
            speed_mps: 0.0,
            vel_down_mps: 0.0,
            arate_lon_dps: 0.0,
            arate_trans_dps: 0.0,
            arate_down_dps: 0.0,
            alignment: AlignmentStatus::Full,
        }
    }

    #[test]
    fn test_compass_north_is_yaw_half_pi() {
        let mut s = sample();
        s.heading_deg = 0.0;

        let (_, _, yaw) = orientation(&s);

        assert_abs_diff_eq!(yaw, PI / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_compass_east_is_yaw_zero() {
        let mut s = sample();
        s.heading_deg = 90.0;

        let (_, _, yaw) = orientation(&s);

        assert_abs_diff_eq!(yaw, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_compass_south_wraps_to_canonical_range() {
        let mut s = sample();
        s.heading_deg = 270.0;

        let (_, _, yaw) = orientation(&s);

        // 90° − 270° = −180°, which wraps to +π in (−π, π]
        assert_abs_diff_eq!(yaw, PI, epsilon = 1e-12);
    }

    #[test]
    fn test_yaw_always_in_canonical_range() {
        let mut s = sample();

        let mut heading = -720.0;
        while heading <= 720.0 {
            s.heading_deg = heading;
            let (_, _, yaw) = orientation(&s);

            assert!(yaw > -PI && yaw <= PI, "yaw {yaw} for heading {heading}");
            heading += 7.3;
        }
    }

    #[test]
    fn test_pitch_sign_inverted() {
        let mut s = sample();
        s.roll_deg = 10.0;
        s.pitch_deg = 5.0;

        let (roll, pitch, _) = orientation(&s);

        assert_abs_diff_eq!(roll, 10.0_f64.to_radians(), epsilon = 1e-12);
        assert_abs_diff_eq!(pitch, -5.0_f64.to_radians(), epsilon = 1e-12);
    }

    #[test]
    fn test_gear_sign_flip() {
        let mut s = sample();
        s.speed_mps = 5.0;

        assert_eq!(velocity(&s, Gear::Drive).linear.x, 5.0);
        assert_eq!(velocity(&s, Gear::Reverse).linear.x, -5.0);
        assert_eq!(velocity(&s, Gear::Neutral).linear.x, 5.0);
    }

    #[test]
    fn test_lateral_velocity_unmodeled() {
        let mut s = sample();
        s.speed_mps = 3.0;

        assert_eq!(velocity(&s, Gear::Drive).linear.y, 0.0);
    }

    #[test]
    fn test_vertical_velocity_sign() {
        let mut s = sample();
        s.vel_down_mps = 0.4;

        assert_abs_diff_eq!(velocity(&s, Gear::Drive).linear.z, -0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_angular_rate_remapping() {
        let mut s = sample();
        s.arate_lon_dps = 1.0;
        s.arate_trans_dps = 2.0;
        s.arate_down_dps = 3.0;

        let v = velocity(&s, Gear::Drive);

        assert_abs_diff_eq!(v.angular.x, 1.0_f64.to_radians(), epsilon = 1e-12);
        assert_abs_diff_eq!(v.angular.y, -2.0_f64.to_radians(), epsilon = 1e-12);
        assert_abs_diff_eq!(v.angular.z, -3.0_f64.to_radians(), epsilon = 1e-12);
    }
}
