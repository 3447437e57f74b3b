use chrono::{DateTime, Utc};
use log::debug;

use crate::device::{AlignmentStatus, Error, NavSample, PosSource};

/// Drains the source each cycle and keeps only the newest queued sample,
/// favoring freshness over completeness. A sample is accepted only if its
/// timestamp differs from the previously accepted one and the navigation
/// solution has converged.
#[derive(Debug, Default)]
pub struct SampleAcquirer {
    last_time: Option<DateTime<Utc>>,
}

impl SampleAcquirer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the newest acceptable sample, or `None` when there is nothing
    /// new this cycle. Absence is the expected steady state while waiting for
    /// a fix, never an error; only source I/O failures propagate.
    pub fn acquire(&mut self, source: &mut dyn PosSource) -> Result<Option<NavSample>, Error> {
        let mut newest = None;
        while let Some(sample) = source.poll()? {
            newest = Some(sample);
        }

        let Some(sample) = newest else {
            debug!("no sample queued");
            return Ok(None);
        };

        // The device repeats its last solution until a new one is computed
        if self.last_time == Some(sample.time) {
            debug!("navigation solution unchanged at {}", sample.time);
            return Ok(None);
        }

        if sample.alignment == AlignmentStatus::Invalid {
            debug!("no valid navigation solution yet");
            return Ok(None);
        }

        self.last_time = Some(sample.time);

        Ok(Some(sample))
    }
}
