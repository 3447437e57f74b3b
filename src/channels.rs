//! Well-known telemetry channel names.

pub mod vehicle {
    /// Current transmission gear, published by the drivetrain interface.
    pub const SHIFTER: &str = "/vehicle/shifter";
}

pub mod odometry {
    pub const ODOM: &str = "/odom";
    pub const GPS: &str = "/gps";
    pub const TF: &str = "/tf";
}
