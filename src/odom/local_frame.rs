use nalgebra::Vector3;

/// Horizontal grid resolution of the map origin, in meters. Snapping to a
/// coarse grid makes a driver restarted in the same region pick the same
/// origin, so local coordinates stay comparable across runs without any
/// persisted state.
pub const ORIGIN_GRID_M: f64 = 10_000.0;

/// Global-to-local coordinate transform with a lazily initialized origin.
///
/// The origin is fixed by the first normalized position: easting and northing
/// rounded to the nearest grid multiple, altitude taken as-is. Once set it
/// never changes for the lifetime of the process.
#[derive(Debug, Default)]
pub struct LocalFrame {
    origin: Option<Vector3<f64>>,
}

impl LocalFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn origin(&self) -> Option<Vector3<f64>> {
        self.origin
    }

    /// Converts projected planar coordinates to the local frame. Returns the
    /// local position and whether this call initialized the origin; the first
    /// position is a degenerate reference point and callers must not publish
    /// it.
    pub fn normalize(&mut self, easting_m: f64, northing_m: f64, alt_m: f64) -> (Vector3<f64>, bool) {
        let is_first = self.origin.is_none();

        let origin = *self.origin.get_or_insert_with(|| {
            Vector3::new(
                (easting_m / ORIGIN_GRID_M).round() * ORIGIN_GRID_M,
                (northing_m / ORIGIN_GRID_M).round() * ORIGIN_GRID_M,
                // Altitude is not snapped
                alt_m,
            )
        });

        (
            Vector3::new(easting_m, northing_m, alt_m) - origin,
            is_first,
        )
    }
}
