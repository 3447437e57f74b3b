use nalgebra::{UnitQuaternion, Vector3};

use crate::device::AlignmentStatus;

/// Transmission gear as reported by the drivetrain interface. Only `Reverse`
/// changes behavior here: it flips the sign of the forward speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gear {
    Park,
    Reverse,
    Neutral,
    Drive,
}

/// Position in local meters, orientation in radians. Yaw is normalized to
/// (−π, π], zero pointing east, counter-clockwise positive.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose3D {
    pub position: Vector3<f64>,
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

/// Body-frame velocity. Lateral (y) velocity is not estimated from this data
/// path and stays zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Velocity3D {
    pub linear: Vector3<f64>,
    pub angular: Vector3<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixQuality {
    Invalid,
    Gps,
    Dgps,
}

impl From<AlignmentStatus> for FixQuality {
    fn from(alignment: AlignmentStatus) -> Self {
        match alignment {
            AlignmentStatus::Invalid => FixQuality::Invalid,
            AlignmentStatus::Fine => FixQuality::Gps,
            AlignmentStatus::Full => FixQuality::Dgps,
        }
    }
}

/// Pose and velocity of the vehicle, published once per accepted cycle.
/// The pose is relative to `frame`, the velocity to `child_frame`.
#[derive(Debug, Clone, PartialEq)]
pub struct Odometry {
    pub frame: String,
    pub child_frame: String,
    pub pose: Pose3D,
    pub velocity: Velocity3D,
}

/// Raw GPS status alongside the projected planar coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct GpsFix {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_m: f64,
    pub easting_m: f64,
    pub northing_m: f64,
    pub quality: FixQuality,
}

/// Transform from the body frame to the reference frame, broadcast alongside
/// each odometry record.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTransform {
    pub frame: String,
    pub child_frame: String,
    pub translation: Vector3<f64>,
    pub rotation: UnitQuaternion<f64>,
}
