//! Console sink for the published telemetry streams.

use anyhow::Result;
use log::debug;

use crate::{
    channels,
    nodes::{Node, StepResult},
    odom::{GpsFix, Odometry},
    telemetry::{TelemetryError, TelemetryReceiver, TelemetryService, Timestamped},
};

/// Drains the odometry and GPS channels each cycle and writes them to the
/// log at debug level. Keeps subscribers attached so the streams are
/// observable without any external consumer.
pub struct LogSink {
    rx_odom: TelemetryReceiver<Odometry>,
    rx_gps: TelemetryReceiver<GpsFix>,
}

impl LogSink {
    pub fn new(ts: &TelemetryService, queue_depth: usize) -> Result<Self, TelemetryError> {
        Ok(Self {
            rx_odom: ts.subscribe(channels::odometry::ODOM, queue_depth)?,
            rx_gps: ts.subscribe(channels::odometry::GPS, queue_depth)?,
        })
    }
}

impl Node for LogSink {
    fn step(&mut self) -> Result<StepResult> {
        while let Ok(Timestamped(time, odom)) = self.rx_odom.try_recv() {
            debug!(
                "[{time}] pose ({:.3}, {:.3}, {:.3}) yaw {:.4} speed {:.3}",
                odom.pose.position.x,
                odom.pose.position.y,
                odom.pose.position.z,
                odom.pose.yaw,
                odom.velocity.linear.x,
            );
        }

        while let Ok(Timestamped(time, fix)) = self.rx_gps.try_recv() {
            debug!(
                "[{time}] fix {:?} at ({:.7}, {:.7}, {:.3})",
                fix.quality, fix.lat_deg, fix.lon_deg, fix.alt_m
            );
        }

        Ok(StepResult::Continue)
    }
}
