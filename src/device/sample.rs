use chrono::{DateTime, Utc};

/// Convergence state of the device's navigation solution.
///
/// `Fine` corresponds to a plain GPS fix, `Full` to a differential fix with
/// the inertial alignment complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentStatus {
    Invalid,
    Fine,
    Full,
}

impl AlignmentStatus {
    /// Decodes the wire/capture status code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(AlignmentStatus::Invalid),
            1 => Some(AlignmentStatus::Fine),
            2 => Some(AlignmentStatus::Full),
            _ => None,
        }
    }
}

/// One navigation solution as reported by the device.
///
/// Heading is a compass bearing (0° = North, 90° = East, clockwise). Forward
/// speed is unsigned; the device cannot tell forward from reverse motion.
/// Angular rates follow the device axes: longitudinal, transverse, down.
#[derive(Debug, Clone, PartialEq)]
pub struct NavSample {
    pub time: DateTime<Utc>,

    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_m: f64,

    pub heading_deg: f64,
    pub roll_deg: f64,
    pub pitch_deg: f64,

    pub speed_mps: f64,
    pub vel_down_mps: f64,

    pub arate_lon_dps: f64,
    pub arate_trans_dps: f64,
    pub arate_down_dps: f64,

    pub alignment: AlignmentStatus,
}
