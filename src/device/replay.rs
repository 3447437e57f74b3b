use std::{path::Path, vec};

use chrono::DateTime;
use log::info;
use serde::Deserialize;

use super::{AlignmentStatus, Error, NavSample, PosSource};

/// One row of a recorded capture.
#[derive(Debug, Deserialize)]
struct CaptureRecord {
    time_us: i64,
    lat_deg: f64,
    lon_deg: f64,
    alt_m: f64,
    heading_deg: f64,
    roll_deg: f64,
    pitch_deg: f64,
    speed_mps: f64,
    vel_down_mps: f64,
    arate_lon_dps: f64,
    arate_trans_dps: f64,
    arate_down_dps: f64,
    alignment: u8,
}

impl CaptureRecord {
    fn into_sample(self) -> Result<NavSample, Error> {
        let time =
            DateTime::from_timestamp_micros(self.time_us).ok_or(Error::BadTimestamp(self.time_us))?;

        let alignment =
            AlignmentStatus::from_code(self.alignment).ok_or(Error::BadAlignment(self.alignment))?;

        Ok(NavSample {
            time,
            lat_deg: self.lat_deg,
            lon_deg: self.lon_deg,
            alt_m: self.alt_m,
            heading_deg: self.heading_deg,
            roll_deg: self.roll_deg,
            pitch_deg: self.pitch_deg,
            speed_mps: self.speed_mps,
            vel_down_mps: self.vel_down_mps,
            arate_lon_dps: self.arate_lon_dps,
            arate_trans_dps: self.arate_trans_dps,
            arate_down_dps: self.arate_down_dps,
            alignment,
        })
    }
}

/// Replays a recorded capture, one sample per poll. The whole file is read
/// and validated at open time; once exhausted the source reports no data
/// forever.
#[derive(Debug)]
pub struct CsvSource {
    samples: vec::IntoIter<NavSample>,
}

impl CsvSource {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let mut reader = csv::Reader::from_path(path).map_err(|source| Error::Capture {
            path: path.to_path_buf(),
            source,
        })?;

        let mut samples = Vec::new();
        for record in reader.deserialize::<CaptureRecord>() {
            let record = record.map_err(|source| Error::Capture {
                path: path.to_path_buf(),
                source,
            })?;
            samples.push(record.into_sample()?);
        }

        info!(
            "Replaying {} navigation records from '{}'",
            samples.len(),
            path.display()
        );

        Ok(Self {
            samples: samples.into_iter(),
        })
    }
}

impl PosSource for CsvSource {
    fn poll(&mut self) -> Result<Option<NavSample>, Error> {
        Ok(self.samples.next())
    }
}
