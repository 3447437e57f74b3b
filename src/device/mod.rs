//! Navigation data sources.
//!
//! A [`PosSource`] yields zero or more queued, timestamped navigation samples
//! per poll. Three implementations exist, mirroring the configuration
//! surface: a live device socket, a recorded CSV capture, and a synthetic
//! fixture.

mod fixture;
mod replay;
mod sample;
mod socket;

use std::path::PathBuf;

use thiserror::Error;

pub use fixture::{FixtureSource, SyntheticSource};
pub use replay::CsvSource;
pub use sample::{AlignmentStatus, NavSample};
pub use socket::UdpSource;

use crate::config::SourceConfig;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot open capture file '{path}': {source}")]
    Capture { path: PathBuf, source: csv::Error },

    #[error("Short navigation record ({len} bytes)")]
    ShortRecord { len: usize },

    #[error("Unknown alignment status code {0}")]
    BadAlignment(u8),

    #[error("Navigation record timestamp {0} out of range")]
    BadTimestamp(i64),
}

/// Source of timestamped navigation samples.
///
/// `poll` never blocks: it returns `Ok(None)` when no sample is currently
/// queued, which is the expected steady state while waiting for a fix.
pub trait PosSource {
    fn poll(&mut self) -> Result<Option<NavSample>, Error>;
}

/// Opens the source selected by configuration. Failure here is fatal to the
/// process; transient data absence after a successful open is not.
pub fn open_source(config: &SourceConfig) -> Result<Box<dyn PosSource + Send>, Error> {
    match config {
        SourceConfig::Live { address } => Ok(Box::new(UdpSource::bind(address)?)),
        SourceConfig::Capture { path } => Ok(Box::new(CsvSource::open(path)?)),
        SourceConfig::Synthetic {
            lat_deg,
            lon_deg,
            rate_hz,
        } => Ok(Box::new(SyntheticSource::new(*lat_deg, *lon_deg, *rate_hz))),
    }
}
