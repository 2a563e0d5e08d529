//! Plate carree (CAR) projection with the reference point on the equator
//! of the projection plane. Longitude wraps inside the image, which is why
//! drawing code checks for wrapped segments on this projection.

use crate::spherical::wrap_180;

/// Celestial (`lon`, `lat`) in degrees to plane (`x`, `y`) in degrees.
pub fn project(lon: f64, lat: f64, lon0: f64, lat0: f64) -> Option<(f64, f64)> {
    if !(-90.0..=90.0).contains(&lat) {
        return None;
    }
    Some((wrap_180(lon - lon0), lat - lat0))
}

/// Plane (`x`, `y`) in degrees back to celestial degrees.
pub fn deproject(x: f64, y: f64, lon0: f64, lat0: f64) -> Option<(f64, f64)> {
    let lat = lat0 + y;
    if !(-90.0..=90.0).contains(&lat) || x.abs() > 180.0 {
        return None;
    }
    Some(((lon0 + x).rem_euclid(360.0), lat))
}
