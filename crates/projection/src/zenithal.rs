//! Zenithal projections: gnomonic (TAN) and orthographic (SIN).
//!
//! Both map native spherical coordinates (`phi`, `theta`) onto the
//! projection plane as `x = R sin(phi)`, `y = -R cos(phi)` and differ only
//! in the radial function `R(theta)`.

use std::f64::consts::FRAC_PI_2;

/// Which radial function to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zenithal {
    /// `R = cot(theta)`; only the hemisphere around the reference point.
    Gnomonic,
    /// `R = cos(theta)`; the visible hemisphere, `R <= 1`.
    Orthographic,
}

impl Zenithal {
    /// Native (`phi`, `theta`) in radians to plane (`x`, `y`) in degrees.
    /// Returns None when the point lies outside the projectable hemisphere.
    pub fn project(&self, phi: f64, theta: f64) -> Option<(f64, f64)> {
        let r_rad = match self {
            Zenithal::Gnomonic => {
                if theta <= 0.0 {
                    return None;
                }
                theta.cos() / theta.sin()
            }
            Zenithal::Orthographic => {
                if theta < 0.0 {
                    return None;
                }
                theta.cos()
            }
        };
        let r = r_rad.to_degrees();
        Some((r * phi.sin(), -r * phi.cos()))
    }

    /// Plane (`x`, `y`) in degrees to native (`phi`, `theta`) in radians.
    pub fn deproject(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let r_rad = x.hypot(y).to_radians();
        let phi = if r_rad == 0.0 { 0.0 } else { x.atan2(-y) };
        let theta = match self {
            Zenithal::Gnomonic => 1.0f64.atan2(r_rad),
            Zenithal::Orthographic => {
                if r_rad > 1.0 {
                    return None;
                }
                r_rad.acos()
            }
        };
        if !(theta.is_finite() && theta <= FRAC_PI_2) {
            return None;
        }
        Some((phi, theta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pole_maps_to_origin() {
        for z in [Zenithal::Gnomonic, Zenithal::Orthographic] {
            let (x, y) = z.project(1.0, FRAC_PI_2).unwrap();
            assert!(x.abs() < 1e-12 && y.abs() < 1e-12);
        }
    }

    #[test]
    fn test_roundtrip() {
        for z in [Zenithal::Gnomonic, Zenithal::Orthographic] {
            let (phi, theta) = (0.7, 1.2);
            let (x, y) = z.project(phi, theta).unwrap();
            let (p, t) = z.deproject(x, y).unwrap();
            assert!((p - phi).abs() < 1e-12, "{:?} phi {}", z, p);
            assert!((t - theta).abs() < 1e-12, "{:?} theta {}", z, t);
        }
    }

    #[test]
    fn test_gnomonic_rejects_far_hemisphere() {
        assert!(Zenithal::Gnomonic.project(0.0, -0.1).is_none());
        assert!(Zenithal::Gnomonic.project(0.0, 0.0).is_none());
    }

    #[test]
    fn test_orthographic_rejects_outside_disk() {
        assert!(Zenithal::Orthographic.deproject(58.0, 0.0).is_none());
        assert!(Zenithal::Orthographic.deproject(57.0, 0.0).is_some());
    }
}
