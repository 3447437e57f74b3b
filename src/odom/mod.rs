//! Odometry core: sample acquisition, local-frame normalization, convention
//! adaptation, and the fixed-rate driver that ties them together.

mod acquire;
mod convention;
mod datatypes;
mod driver;
mod local_frame;

pub use acquire::SampleAcquirer;
pub use convention::{normalize_angle, orientation, velocity};
pub use datatypes::{FixQuality, FrameTransform, Gear, GpsFix, Odometry, Pose3D, Velocity3D};
pub use driver::OdometryDriver;
pub use local_frame::{LocalFrame, ORIGIN_GRID_M};
