//! Rigid rotation of the celestial sphere about a reference position.

use nalgebra::{Rotation3, Vector3};
use sky_common::WorldPt;

use crate::spherical::{from_unit_vector, to_unit_vector};

/// Rotation that carries a reference position to the canonical point
/// (lon 180, lat 0): first about Z by `180 - lon0`, then about Y by
/// `-lat0`. [`SphereRotation::unrotate`] applies the inverse.
#[derive(Debug, Clone, Copy)]
pub struct SphereRotation {
    matrix: Rotation3<f64>,
}

impl SphereRotation {
    pub fn new(reference: &WorldPt) -> Self {
        let about_z = Rotation3::from_axis_angle(
            &Vector3::z_axis(),
            (180.0 - reference.lon).to_radians(),
        );
        let about_y = Rotation3::from_axis_angle(&Vector3::y_axis(), -reference.lat.to_radians());
        Self {
            matrix: about_y * about_z,
        }
    }

    pub fn rotate(&self, pt: &WorldPt) -> WorldPt {
        self.apply(pt, &self.matrix)
    }

    pub fn unrotate(&self, pt: &WorldPt) -> WorldPt {
        self.apply(pt, &self.matrix.inverse())
    }

    fn apply(&self, pt: &WorldPt, rotation: &Rotation3<f64>) -> WorldPt {
        let v = rotation * to_unit_vector(pt.lon, pt.lat);
        let (lon, lat) = from_unit_vector(&v);
        WorldPt::with_csys(lon, lat, pt.csys)
    }
}
