use std::collections::VecDeque;

use chrono::{DateTime, TimeDelta, Utc};

use super::{AlignmentStatus, Error, NavSample, PosSource};

/// Scripted in-memory source. Samples are handed out in push order, then the
/// source reports no data. Used by unit tests and bench harnesses.
#[derive(Debug, Default)]
pub struct FixtureSource {
    queue: VecDeque<NavSample>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: NavSample) {
        self.queue.push_back(sample);
    }
}

impl PosSource for FixtureSource {
    fn poll(&mut self) -> Result<Option<NavSample>, Error> {
        Ok(self.queue.pop_front())
    }
}

/// Free-running synthetic source: a stationary vehicle with a converged
/// solution at a fixed location. Emits at most one sample per period of wall
/// time, so drain-to-newest polling terminates.
#[derive(Debug)]
pub struct SyntheticSource {
    lat_deg: f64,
    lon_deg: f64,
    period: TimeDelta,
    next_emit: DateTime<Utc>,
}

impl SyntheticSource {
    pub fn new(lat_deg: f64, lon_deg: f64, rate_hz: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            period: TimeDelta::microseconds((1e6 / rate_hz) as i64),
            next_emit: Utc::now(),
        }
    }
}

impl PosSource for SyntheticSource {
    fn poll(&mut self) -> Result<Option<NavSample>, Error> {
        let now = Utc::now();
        if now < self.next_emit {
            return Ok(None);
        }
        self.next_emit = now + self.period;

        Ok(Some(NavSample {
            time: now,
            lat_deg: self.lat_deg,
            lon_deg: self.lon_deg,
            alt_m: 0.0,
            heading_deg: 0.0,
            roll_deg: 0.0,
            pitch_deg: 0.0,
            speed_mps: 0.0,
            vel_down_mps: 0.0,
            arate_lon_dps: 0.0,
            arate_trans_dps: 0.0,
            arate_down_dps: 0.0,
            alignment: AlignmentStatus::Full,
        }))
    }
}
