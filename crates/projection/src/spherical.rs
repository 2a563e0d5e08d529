//! Spherical trigonometry helpers.
//!
//! Native spherical coordinates follow the FITS WCS convention for
//! zenithal projections: the reference point sits at the native pole and
//! the celestial pole lies at native longitude 180 degrees.

use nalgebra::Vector3;

/// Native longitude of the celestial pole (LONPOLE), radians.
const PHI_P: f64 = std::f64::consts::PI;

/// Convert celestial (`lon`, `lat`) to native (`phi`, `theta`), all radians,
/// for a projection whose reference point is (`lon0`, `lat0`).
pub fn celestial_to_native(lon: f64, lat: f64, lon0: f64, lat0: f64) -> (f64, f64) {
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lat0, cos_lat0) = lat0.sin_cos();
    let (sin_dlon, cos_dlon) = (lon - lon0).sin_cos();

    // Rotated unit vector; atan2 keeps theta exact near the native pole.
    let x = sin_lat * cos_lat0 - cos_lat * sin_lat0 * cos_dlon;
    let y = -cos_lat * sin_dlon;
    let z = sin_lat * sin_lat0 + cos_lat * cos_lat0 * cos_dlon;
    (PHI_P + y.atan2(x), z.atan2(x.hypot(y)))
}

/// Inverse of [`celestial_to_native`]. Returns radians; longitude is not
/// normalized.
pub fn native_to_celestial(phi: f64, theta: f64, lon0: f64, lat0: f64) -> (f64, f64) {
    let (sin_theta, cos_theta) = theta.sin_cos();
    let (sin_lat0, cos_lat0) = lat0.sin_cos();
    let (sin_dphi, cos_dphi) = (phi - PHI_P).sin_cos();

    let x = sin_theta * cos_lat0 - cos_theta * sin_lat0 * cos_dphi;
    let y = -cos_theta * sin_dphi;
    let z = sin_theta * sin_lat0 + cos_theta * cos_lat0 * cos_dphi;
    (lon0 + y.atan2(x), z.atan2(x.hypot(y)))
}

/// Great-circle distance in degrees (haversine form, stable for small
/// separations).
pub fn angular_distance(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (lat1, lat2) = (lat1.to_radians(), lat2.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (lon2 - lon1).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    (2.0 * h.sqrt().min(1.0).asin()).to_degrees()
}

/// Unit vector for a (`lon`, `lat`) position in degrees.
pub fn to_unit_vector(lon: f64, lat: f64) -> Vector3<f64> {
    let (sin_lon, cos_lon) = lon.to_radians().sin_cos();
    let (sin_lat, cos_lat) = lat.to_radians().sin_cos();
    Vector3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat)
}

/// (`lon`, `lat`) in degrees for a vector; longitude in `[0, 360)`.
pub fn from_unit_vector(v: &Vector3<f64>) -> (f64, f64) {
    let lat = v.z.atan2(v.x.hypot(v.y)).to_degrees();
    let lon = v.y.atan2(v.x).to_degrees().rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative angles
    let lon = if lon >= 360.0 { 0.0 } else { lon };
    (lon, lat)
}

/// Position angle of (`lon`, `lat`) as seen from (`lon0`, `lat0`), in
/// degrees east of north within `[0, 360)`.
pub fn position_angle(lon0: f64, lat0: f64, lon: f64, lat: f64) -> f64 {
    if lat0 == 90.0 {
        return 180.0;
    }
    if lat0 == -90.0 {
        return 0.0;
    }
    let (sin_d0, cos_d0) = lat0.to_radians().sin_cos();
    let (sin_d, cos_d) = lat.to_radians().sin_cos();
    let dlon = (lon - lon0).to_radians();
    let y = cos_d * dlon.sin();
    let x = sin_d * cos_d0 - cos_d * sin_d0 * dlon.cos();
    if y == 0.0 && x == 0.0 {
        return 0.0;
    }
    y.atan2(x).to_degrees().rem_euclid(360.0)
}

/// Wrap an angle in degrees into `(-180, 180]`.
pub fn wrap_180(deg: f64) -> f64 {
    let w = deg.rem_euclid(360.0);
    if w > 180.0 {
        w - 360.0
    } else {
        w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_point_is_native_pole() {
        let (lon0, lat0) = (30f64.to_radians(), 40f64.to_radians());
        let (_, theta) = celestial_to_native(lon0, lat0, lon0, lat0);
        assert!((theta - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_theta_accurate_near_native_pole() {
        let (lon0, lat0) = (30f64.to_radians(), 40f64.to_radians());
        let offset = 1e-7f64.to_radians();
        let (_, theta) = celestial_to_native(lon0, lat0 + offset, lon0, lat0);
        assert!((std::f64::consts::FRAC_PI_2 - theta - offset).abs() < 1e-14);

        let (lon, lat) = native_to_celestial(0.0, std::f64::consts::FRAC_PI_2, lon0, lat0);
        assert!((lat - lat0).abs() < 1e-15);
        assert!((lon - lon0).abs() < 1e-12);
    }

    #[test]
    fn test_native_roundtrip() {
        let (lon0, lat0) = (200f64.to_radians(), -35f64.to_radians());
        for &(lon, lat) in &[(201.0, -34.0), (199.5, -36.2), (200.0, -30.0)] {
            let (phi, theta) = celestial_to_native(
                f64::to_radians(lon),
                f64::to_radians(lat),
                lon0,
                lat0,
            );
            let (l, b) = native_to_celestial(phi, theta, lon0, lat0);
            assert!((l.to_degrees().rem_euclid(360.0) - lon).abs() < 1e-9, "lon {}", lon);
            assert!((b.to_degrees() - lat).abs() < 1e-9, "lat {}", lat);
        }
    }

    #[test]
    fn test_angular_distance() {
        assert!((angular_distance(0.0, 0.0, 90.0, 0.0) - 90.0).abs() < 1e-9);
        assert!((angular_distance(10.0, 89.0, 190.0, 89.0) - 2.0).abs() < 1e-9);
        assert!(angular_distance(5.0, 5.0, 5.0, 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_unit_vector_roundtrip() {
        let v = to_unit_vector(123.4, -56.7);
        let (lon, lat) = from_unit_vector(&v);
        assert!((lon - 123.4).abs() < 1e-10);
        assert!((lat + 56.7).abs() < 1e-10);
    }

    #[test]
    fn test_position_angle() {
        assert!(position_angle(10.0, 20.0, 10.0, 21.0).abs() < 1e-9);
        assert!((position_angle(10.0, 0.0, 11.0, 0.0) - 90.0).abs() < 1e-9);
        assert!((position_angle(10.0, 0.0, 9.0, 0.0) - 270.0).abs() < 1e-9);
        assert_eq!(position_angle(10.0, 90.0, 50.0, 80.0), 180.0);
    }

    #[test]
    fn test_wrap_180() {
        assert_eq!(wrap_180(190.0), -170.0);
        assert_eq!(wrap_180(-190.0), 170.0);
        assert_eq!(wrap_180(180.0), 180.0);
    }
}
