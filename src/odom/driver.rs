use anyhow::Result;
use log::info;
use nalgebra::UnitQuaternion;

use super::{
    SampleAcquirer, convention,
    datatypes::{FrameTransform, Gear, GpsFix, Odometry, Pose3D},
    local_frame::LocalFrame,
};
use crate::{
    channels,
    config::DriverConfig,
    device::PosSource,
    nodes::{Node, StepResult},
    projection,
    telemetry::{TelemetryError, TelemetryReceiver, TelemetrySender, TelemetryService, Timestamped},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverState {
    /// No valid fix normalized yet; nothing published.
    Idle,
    /// Origin established, publishing every accepted cycle.
    Tracking,
}

/// The odometry cycle: acquire the newest sample, project it, normalize it
/// into the local frame, adapt conventions, and publish pose, velocity, GPS
/// quality and the frame transform.
///
/// Gear changes arrive asynchronously on their own channel; the driver reads
/// whatever value is current at the start of each cycle. Only the latest
/// value matters, so the subscription is a single-slot mailbox.
pub struct OdometryDriver {
    source: Box<dyn PosSource + Send>,
    acquirer: SampleAcquirer,
    frame: LocalFrame,
    state: DriverState,
    gear: Gear,

    frame_id: String,
    child_frame_id: String,

    rx_gear: TelemetryReceiver<Gear>,
    tx_odom: TelemetrySender<Odometry>,
    tx_gps: TelemetrySender<GpsFix>,
    tx_tf: TelemetrySender<FrameTransform>,
}

impl OdometryDriver {
    pub fn new(
        ts: &TelemetryService,
        source: Box<dyn PosSource + Send>,
        config: &DriverConfig,
    ) -> Result<Self, TelemetryError> {
        let rx_gear = ts.subscribe(channels::vehicle::SHIFTER, 1)?;

        let tx_odom = ts.publish(channels::odometry::ODOM)?;
        let tx_gps = ts.publish(channels::odometry::GPS)?;
        let tx_tf = ts.publish(channels::odometry::TF)?;

        Ok(Self {
            source,
            acquirer: SampleAcquirer::new(),
            frame: LocalFrame::new(),
            state: DriverState::Idle,
            gear: Gear::Drive,
            frame_id: config.frame.clone(),
            child_frame_id: config.child_frame.clone(),
            rx_gear,
            tx_odom,
            tx_gps,
            tx_tf,
        })
    }

    fn update_gear(&mut self) {
        while let Ok(Timestamped(_, gear)) = self.rx_gear.try_recv() {
            if gear != self.gear {
                info!("Gear changed from {:?} to {:?}", self.gear, gear);
            }
            self.gear = gear;
        }
    }
}

impl Node for OdometryDriver {
    fn step(&mut self) -> Result<StepResult> {
        self.update_gear();

        let Some(sample) = self.acquirer.acquire(self.source.as_mut())? else {
            return Ok(StepResult::Continue);
        };

        let (easting, northing) = projection::latlon_to_planar(sample.lat_deg, sample.lon_deg);

        let (position, is_first) = self.frame.normalize(easting, northing, sample.alt_m);

        if is_first {
            // The first fix defines the local frame and carries no
            // information relative to itself
            self.state = DriverState::Tracking;

            if let Some(origin) = self.frame.origin() {
                info!(
                    "Initial fix ({easting:.3}, {northing:.3}, {:.3}), map origin ({:.3}, {:.3}, {:.3})",
                    sample.alt_m, origin.x, origin.y, origin.z
                );
            }

            return Ok(StepResult::Continue);
        }

        debug_assert_eq!(self.state, DriverState::Tracking);

        let (roll, pitch, yaw) = convention::orientation(&sample);
        let pose = Pose3D {
            position,
            roll,
            pitch,
            yaw,
        };
        let velocity = convention::velocity(&sample, self.gear);

        self.tx_gps.send(
            sample.time,
            GpsFix {
                lat_deg: sample.lat_deg,
                lon_deg: sample.lon_deg,
                alt_m: sample.alt_m,
                easting_m: easting,
                northing_m: northing,
                quality: sample.alignment.into(),
            },
        );

        self.tx_tf.send(
            sample.time,
            FrameTransform {
                frame: self.frame_id.clone(),
                child_frame: self.child_frame_id.clone(),
                translation: position,
                rotation: UnitQuaternion::from_euler_angles(roll, pitch, yaw),
            },
        );

        self.tx_odom.send(
            sample.time,
            Odometry {
                frame: self.frame_id.clone(),
                child_frame: self.child_frame_id.clone(),
                pose,
                velocity,
            },
        );

        Ok(StepResult::Continue)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use approx::assert_abs_diff_eq;
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::{
        device::{AlignmentStatus, Error, FixtureSource, NavSample},
        odom::{FixQuality, ORIGIN_GRID_M},
        telemetry::TelemetryError,
    };

    /// Fixture handle that stays usable after the driver takes ownership of
    /// the source.
    #[derive(Debug, Default, Clone)]
    struct SharedFixture(Arc<Mutex<FixtureSource>>);

    impl SharedFixture {
        fn push(&self, sample: NavSample) {
            self.0.lock().unwrap().push(sample);
        }
    }

    impl PosSource for SharedFixture {
        fn poll(&mut self) -> Result<Option<NavSample>, Error> {
            self.0.lock().unwrap().poll()
        }
    }

    fn sample(seconds: i64, lat_deg: f64, lon_deg: f64) -> NavSample {
        NavSample {
            time: DateTime::from_timestamp(seconds, 0).unwrap(),
            lat_deg,
            lon_deg,
            alt_m: 160.0,
            heading_deg: 90.0,
            roll_deg: 0.0,
            pitch_deg: 0.0,
            speed_mps: 5.0,
            vel_down_mps: 0.0,
            arate_lon_dps: 0.0,
            arate_trans_dps: 0.0,
            arate_down_dps: 0.0,
            alignment: AlignmentStatus::Full,
        }
    }

    struct Harness {
        fixture: SharedFixture,
        driver: OdometryDriver,
        ts: TelemetryService,
        rx_odom: TelemetryReceiver<Odometry>,
        rx_gps: TelemetryReceiver<GpsFix>,
        rx_tf: TelemetryReceiver<FrameTransform>,
    }

    impl Harness {
        fn new() -> Self {
            let ts = TelemetryService::default();

            let rx_odom = ts.subscribe(channels::odometry::ODOM, 4).unwrap();
            let rx_gps = ts.subscribe(channels::odometry::GPS, 4).unwrap();
            let rx_tf = ts.subscribe(channels::odometry::TF, 4).unwrap();

            let fixture = SharedFixture::default();
            let driver = OdometryDriver::new(
                &ts,
                Box::new(fixture.clone()),
                &DriverConfig::default(),
            )
            .unwrap();

            Self {
                fixture,
                driver,
                ts,
                rx_odom,
                rx_gps,
                rx_tf,
            }
        }
    }

    #[test]
    fn test_first_fix_suppressed_then_published() {
        let mut h = Harness::new();

        h.fixture.push(sample(1, 30.285, -97.7335));
        h.driver.step().unwrap();

        assert_eq!(h.rx_odom.try_recv(), Err(TelemetryError::EmptyChannel));
        assert_eq!(h.rx_gps.try_recv(), Err(TelemetryError::EmptyChannel));
        assert_eq!(h.rx_tf.try_recv(), Err(TelemetryError::EmptyChannel));

        h.fixture.push(sample(2, 30.286, -97.7335));
        h.driver.step().unwrap();

        let Timestamped(time, odom) = h.rx_odom.try_recv().unwrap();
        assert_eq!(time, DateTime::from_timestamp(2, 0).unwrap());
        assert_eq!(odom.frame, "odom");
        assert_eq!(odom.child_frame, "vehicle");

        // Published position equals the projection minus the snapped origin
        let (e, n) = projection::latlon_to_planar(30.286, -97.7335);
        let expected_x = e - (e / ORIGIN_GRID_M).round() * ORIGIN_GRID_M;
        // Both samples fall in the same grid cell, so recomputing the snap
        // from the second sample gives the same origin here
        assert_abs_diff_eq!(odom.pose.position.x, expected_x, epsilon = 1.0);
        assert_abs_diff_eq!(
            odom.pose.position.y,
            n - (n / ORIGIN_GRID_M).round() * ORIGIN_GRID_M,
            epsilon = 120.0
        );

        let Timestamped(_, fix) = h.rx_gps.try_recv().unwrap();
        assert_eq!(fix.quality, FixQuality::Dgps);
        assert_eq!(fix.easting_m, e);
        assert_eq!(fix.northing_m, n);

        let Timestamped(_, tf) = h.rx_tf.try_recv().unwrap();
        assert_eq!(tf.translation, odom.pose.position);
    }

    #[test]
    fn test_local_delta_matches_planar_delta() {
        let mut h = Harness::new();

        h.fixture.push(sample(1, 30.2850, -97.7335));
        h.driver.step().unwrap();

        h.fixture.push(sample(2, 30.2852, -97.7335));
        h.driver.step().unwrap();
        let Timestamped(_, odom_a) = h.rx_odom.try_recv().unwrap();

        h.fixture.push(sample(3, 30.2856, -97.7330));
        h.driver.step().unwrap();
        let Timestamped(_, odom_b) = h.rx_odom.try_recv().unwrap();

        let (e_a, n_a) = projection::latlon_to_planar(30.2852, -97.7335);
        let (e_b, n_b) = projection::latlon_to_planar(30.2856, -97.7330);

        let delta = odom_b.pose.position - odom_a.pose.position;
        assert_abs_diff_eq!(delta.x, e_b - e_a, epsilon = 1e-6);
        assert_abs_diff_eq!(delta.y, n_b - n_a, epsilon = 1e-6);
    }

    #[test]
    fn test_duplicate_timestamp_publishes_nothing() {
        let mut h = Harness::new();

        h.fixture.push(sample(1, 30.285, -97.7335));
        h.driver.step().unwrap();
        h.fixture.push(sample(2, 30.286, -97.7335));
        h.driver.step().unwrap();
        h.rx_odom.try_recv().unwrap();
        h.rx_gps.try_recv().unwrap();

        h.fixture.push(sample(2, 30.286, -97.7335));
        h.driver.step().unwrap();

        assert_eq!(h.rx_odom.try_recv(), Err(TelemetryError::EmptyChannel));
        assert_eq!(h.rx_gps.try_recv(), Err(TelemetryError::EmptyChannel));
    }

    #[test]
    fn test_reverse_gear_flips_forward_speed() {
        let mut h = Harness::new();
        let tx_gear = h.ts.publish::<Gear>(channels::vehicle::SHIFTER).unwrap();

        h.fixture.push(sample(1, 30.285, -97.7335));
        h.driver.step().unwrap();

        h.fixture.push(sample(2, 30.286, -97.7335));
        h.driver.step().unwrap();
        let Timestamped(_, odom) = h.rx_odom.try_recv().unwrap();
        assert_eq!(odom.velocity.linear.x, 5.0);

        tx_gear.send(Utc::now(), Gear::Reverse);
        h.fixture.push(sample(3, 30.287, -97.7335));
        h.driver.step().unwrap();
        let Timestamped(_, odom) = h.rx_odom.try_recv().unwrap();
        assert_eq!(odom.velocity.linear.x, -5.0);
    }

    #[test]
    fn test_gear_mailbox_keeps_latest() {
        let mut h = Harness::new();
        let tx_gear = h.ts.publish::<Gear>(channels::vehicle::SHIFTER).unwrap();

        h.fixture.push(sample(1, 30.285, -97.7335));
        h.driver.step().unwrap();

        // Two notifications between cycles: only the last one matters
        tx_gear.send(Utc::now(), Gear::Reverse);
        tx_gear.send(Utc::now(), Gear::Drive);

        h.fixture.push(sample(2, 30.286, -97.7335));
        h.driver.step().unwrap();
        let Timestamped(_, odom) = h.rx_odom.try_recv().unwrap();

        assert_eq!(odom.velocity.linear.x, 5.0);
    }

    #[test]
    fn test_unconverged_sample_keeps_driver_idle() {
        let mut h = Harness::new();

        let mut s = sample(1, 30.285, -97.7335);
        s.alignment = AlignmentStatus::Invalid;
        h.fixture.push(s);
        h.driver.step().unwrap();

        // Still idle: the next valid sample is the origin-defining one
        h.fixture.push(sample(2, 30.285, -97.7335));
        h.driver.step().unwrap();
        assert_eq!(h.rx_odom.try_recv(), Err(TelemetryError::EmptyChannel));

        h.fixture.push(sample(3, 30.286, -97.7335));
        h.driver.step().unwrap();
        assert!(h.rx_odom.try_recv().is_ok());
    }
}
