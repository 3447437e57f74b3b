pub mod channels;
pub mod config;
pub mod device;
pub mod logging;
pub mod nodes;
pub mod odom;
pub mod projection;
pub mod telemetry;
pub mod utils;
