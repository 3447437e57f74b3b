//! Conversion of geodetic coordinates to planar meters.
//!
//! Standard UTM transverse Mercator on the WGS-84 ellipsoid, series form.
//! Pure functions over already-valid input; the driver core treats this as an
//! opaque projection. Coordinates within one zone are absolute, so repeated
//! runs in the same region see the same easting/northing values.

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;

const K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// UTM zone containing the given longitude.
pub fn utm_zone(lon_deg: f64) -> u8 {
    (((lon_deg + 180.0) / 6.0).floor() as i32 + 1).clamp(1, 60) as u8
}

/// Central meridian of a UTM zone, in degrees.
fn central_meridian_deg(zone: u8) -> f64 {
    (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0
}

/// Projects latitude/longitude (degrees) to UTM easting/northing (meters).
pub fn latlon_to_planar(lat_deg: f64, lon_deg: f64) -> (f64, f64) {
    let e2 = WGS84_F * (2.0 - WGS84_F);
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    let ep2 = e2 / (1.0 - e2);

    let lat = lat_deg.to_radians();
    let lon0 = central_meridian_deg(utm_zone(lon_deg)).to_radians();
    let dlon = lon_deg.to_radians() - lon0;

    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let tan_lat = lat.tan();

    let n = WGS84_A / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    let t = tan_lat * tan_lat;
    let c = ep2 * cos_lat * cos_lat;
    let a = cos_lat * dlon;

    // Meridional arc length from the equator
    let m = WGS84_A
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * lat).sin());

    let a2 = a * a;
    let a3 = a2 * a;
    let a4 = a3 * a;
    let a5 = a4 * a;
    let a6 = a5 * a;

    let easting = K0
        * n
        * (a + (1.0 - t + c) * a3 / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a5 / 120.0)
        + FALSE_EASTING;

    let mut northing = K0
        * (m + n
            * tan_lat
            * (a2 / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a6 / 720.0));

    if lat_deg < 0.0 {
        northing += FALSE_NORTHING_SOUTH;
    }

    (easting, northing)
}
