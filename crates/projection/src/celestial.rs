//! Conversion between celestial reference frames.

use nalgebra::Matrix3;
use sky_common::{CoordSys, WorldPt};

use crate::spherical::{from_unit_vector, to_unit_vector};

/// Mean obliquity of the ecliptic at J2000, degrees.
const OBLIQUITY_J2000: f64 = 23.439_291_1;

/// Rotation taking equatorial J2000 vectors to galactic vectors.
fn equatorial_to_galactic() -> Matrix3<f64> {
    Matrix3::new(
        -0.054_875_560_416_215_4, -0.873_437_090_234_885_0, -0.483_835_015_548_713_2,
        0.494_109_427_875_583_7, -0.444_829_629_960_011_2, 0.746_982_244_497_218_9,
        -0.867_666_149_019_004_7, -0.198_076_373_431_201_5, 0.455_983_776_175_066_9,
    )
}

/// Rotation taking equatorial J2000 vectors to ecliptic J2000 vectors.
fn equatorial_to_ecliptic() -> Matrix3<f64> {
    let (s, c) = OBLIQUITY_J2000.to_radians().sin_cos();
    Matrix3::new(
        1.0, 0.0, 0.0,
        0.0, c, s,
        0.0, -s, c,
    )
}

/// Rotation from `csys` into equatorial J2000, or None for non-sky systems.
fn to_equatorial(csys: CoordSys) -> Option<Matrix3<f64>> {
    match csys {
        CoordSys::EqJ2000 => Some(Matrix3::identity()),
        CoordSys::Galactic => Some(equatorial_to_galactic().transpose()),
        CoordSys::EclJ2000 => Some(equatorial_to_ecliptic().transpose()),
        CoordSys::Pixel | CoordSys::ScreenPixel => None,
    }
}

/// Convert a world point into another celestial system.
///
/// Returns None when either system is not celestial.
pub fn convert(pt: &WorldPt, to: CoordSys) -> Option<WorldPt> {
    if pt.csys == to {
        return Some(*pt);
    }
    let into_eq = to_equatorial(pt.csys)?;
    let from_eq = to_equatorial(to)?.transpose();
    let v = from_eq * (into_eq * to_unit_vector(pt.lon, pt.lat));
    let (lon, lat) = from_unit_vector(&v);
    Some(WorldPt::with_csys(lon, lat, to))
}
