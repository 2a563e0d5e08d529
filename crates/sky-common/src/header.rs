//! FITS image header with the WCS keywords the projection and resampling
//! code understands. Unrecognized keywords ride along in `cards`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::coord_sys::CoordSys;
use crate::error::{SkyError, SkyResult};

/// Projection families recognized from the `CTYPE1` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionType {
    /// `-TAN` (and `-TAN-SIP` when distortion terms are present)
    Gnomonic,
    /// `-SIN`
    Orthographic,
    /// `-CAR` or a bare axis name; plate carree
    Linear,
    /// Any other code
    Unsupported,
}

impl ProjectionType {
    pub fn from_ctype(ctype1: &str) -> Self {
        let upper = ctype1.to_uppercase();
        let code = upper.get(4..).unwrap_or("").trim_start_matches('-');
        if code.starts_with("TAN") {
            ProjectionType::Gnomonic
        } else if code.starts_with("SIN") {
            ProjectionType::Orthographic
        } else if code.is_empty() || code.starts_with("CAR") {
            ProjectionType::Linear
        } else {
            ProjectionType::Unsupported
        }
    }

    /// All-sky projections whose longitude wraps inside the image.
    pub fn is_wrapping(&self) -> bool {
        matches!(self, ProjectionType::Linear)
    }

    pub fn code(&self) -> &'static str {
        match self {
            ProjectionType::Gnomonic => "TAN",
            ProjectionType::Orthographic => "SIN",
            ProjectionType::Linear => "CAR",
            ProjectionType::Unsupported => "???",
        }
    }
}

/// Simple Imaging Polynomial distortion terms, indexed `[p][q]` for the
/// `u^p v^q` coefficient. Inverse terms are optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SipCoefficients {
    pub a: Vec<Vec<f64>>,
    pub b: Vec<Vec<f64>>,
    #[serde(default)]
    pub ap: Vec<Vec<f64>>,
    #[serde(default)]
    pub bp: Vec<Vec<f64>>,
}

impl SipCoefficients {
    pub fn has_inverse(&self) -> bool {
        !self.ap.is_empty() && !self.bp.is_empty()
    }
}

fn default_axis() -> usize {
    1
}

fn default_bitpix() -> i32 {
    -32
}

/// Image header. Pixel coordinates in `crpix` are FITS 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageHeader {
    #[serde(default = "default_bitpix")]
    pub bitpix: i32,
    pub naxis1: usize,
    pub naxis2: usize,
    #[serde(default = "default_axis")]
    pub naxis3: usize,
    #[serde(default = "default_axis")]
    pub naxis4: usize,
    pub crpix1: f64,
    pub crpix2: f64,
    pub crval1: f64,
    pub crval2: f64,
    #[serde(default)]
    pub cdelt1: f64,
    #[serde(default)]
    pub cdelt2: f64,
    #[serde(default)]
    pub crota2: f64,
    /// Explicit CD matrix; takes precedence over CDELT/CROTA2.
    #[serde(default)]
    pub cd: Option<[[f64; 2]; 2]>,
    pub ctype1: String,
    pub ctype2: String,
    #[serde(default)]
    pub sip: Option<SipCoefficients>,
    #[serde(default)]
    pub blank: Option<f64>,
    #[serde(default)]
    pub datamin: Option<f64>,
    #[serde(default)]
    pub datamax: Option<f64>,
    #[serde(default)]
    pub cards: BTreeMap<String, String>,
}

impl ImageHeader {
    /// A north-up gnomonic header centered on (`ra`, `dec`) with square
    /// pixels of `scale_deg`, RA increasing to the left.
    pub fn new_tan(naxis1: usize, naxis2: usize, ra: f64, dec: f64, scale_deg: f64) -> Self {
        Self {
            bitpix: -32,
            naxis1,
            naxis2,
            naxis3: 1,
            naxis4: 1,
            crpix1: naxis1 as f64 / 2.0 + 0.5,
            crpix2: naxis2 as f64 / 2.0 + 0.5,
            crval1: ra,
            crval2: dec,
            cdelt1: -scale_deg,
            cdelt2: scale_deg,
            crota2: 0.0,
            cd: None,
            ctype1: "RA---TAN".to_string(),
            ctype2: "DEC--TAN".to_string(),
            sip: None,
            blank: None,
            datamin: None,
            datamax: None,
            cards: BTreeMap::new(),
        }
    }

    pub fn projection_type(&self) -> ProjectionType {
        ProjectionType::from_ctype(&self.ctype1)
    }

    pub fn coord_sys(&self) -> CoordSys {
        CoordSys::from_ctype(&self.ctype1)
    }

    /// Number of meaningful axes.
    pub fn naxis(&self) -> usize {
        if self.naxis4 > 1 {
            4
        } else if self.naxis3 > 1 {
            3
        } else {
            2
        }
    }

    pub fn dims(&self) -> Vec<usize> {
        let mut dims = vec![self.naxis1, self.naxis2];
        if self.naxis() >= 3 {
            dims.push(self.naxis3);
        }
        if self.naxis() == 4 {
            dims.push(self.naxis4);
        }
        dims
    }

    pub fn is_cube(&self) -> bool {
        self.naxis3 > 1 || self.naxis4 > 1
    }

    /// Effective CD matrix, built from CDELT and CROTA2 when no explicit
    /// matrix is present.
    pub fn cd_matrix(&self) -> [[f64; 2]; 2] {
        if let Some(cd) = self.cd {
            return cd;
        }
        let (sin_r, cos_r) = self.crota2.to_radians().sin_cos();
        [
            [self.cdelt1 * cos_r, -self.cdelt2 * sin_r],
            [self.cdelt1 * sin_r, self.cdelt2 * cos_r],
        ]
    }

    /// Pixel width in degrees.
    pub fn pixel_scale_deg(&self) -> f64 {
        if self.cd.is_none() && self.cdelt1 != 0.0 {
            return self.cdelt1.abs();
        }
        let m = self.cd_matrix();
        (m[0][0] * m[1][1] - m[0][1] * m[1][0]).abs().sqrt()
    }

    /// CDELT values, derived from the CD matrix when needed.
    pub fn effective_cdelt(&self) -> (f64, f64) {
        match self.cd {
            None => (self.cdelt1, self.cdelt2),
            Some(m) => {
                let c1 = m[0][0].hypot(m[1][0]);
                let c2 = m[0][1].hypot(m[1][1]);
                let det = m[0][0] * m[1][1] - m[0][1] * m[1][0];
                // a negative determinant means RA increases to the left
                if det < 0.0 {
                    (-c1, c2)
                } else {
                    (c1, c2)
                }
            }
        }
    }

    /// Check that the header describes a usable 2D grid.
    pub fn validate(&self) -> SkyResult<()> {
        if self.naxis1 == 0 || self.naxis2 == 0 {
            return Err(SkyError::invalid_header(format!(
                "NAXIS1/NAXIS2 must be > 0, got {}x{}",
                self.naxis1, self.naxis2
            )));
        }
        let m = self.cd_matrix();
        let det = m[0][0] * m[1][1] - m[0][1] * m[1][0];
        if !det.is_finite() || det == 0.0 {
            return Err(SkyError::invalid_header("singular CD/CDELT matrix"));
        }
        if self.projection_type() == ProjectionType::Unsupported {
            return Err(SkyError::UnsupportedProjection(self.ctype1.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_type_from_ctype() {
        assert_eq!(ProjectionType::from_ctype("RA---TAN"), ProjectionType::Gnomonic);
        assert_eq!(ProjectionType::from_ctype("RA---TAN-SIP"), ProjectionType::Gnomonic);
        assert_eq!(ProjectionType::from_ctype("GLON-SIN"), ProjectionType::Orthographic);
        assert_eq!(ProjectionType::from_ctype("GLON-CAR"), ProjectionType::Linear);
        assert_eq!(ProjectionType::from_ctype("RA"), ProjectionType::Linear);
        assert_eq!(ProjectionType::from_ctype("RA---AIT"), ProjectionType::Unsupported);
    }

    #[test]
    fn test_cd_matrix_from_cdelt_rotation() {
        let mut h = ImageHeader::new_tan(100, 100, 10.0, 20.0, 0.001);
        h.crota2 = 90.0;
        let m = h.cd_matrix();
        assert!(m[0][0].abs() < 1e-15);
        assert!((m[0][1] + 0.001).abs() < 1e-15);
        assert!((m[1][0] + 0.001).abs() < 1e-15);
        assert!(m[1][1].abs() < 1e-15);
    }

    #[test]
    fn test_pixel_scale_with_cd() {
        let mut h = ImageHeader::new_tan(10, 10, 0.0, 0.0, 0.5);
        h.cd = Some([[-0.002, 0.0], [0.0, 0.002]]);
        assert!((h.pixel_scale_deg() - 0.002).abs() < 1e-12);
        let (c1, c2) = h.effective_cdelt();
        assert!((c1 + 0.002).abs() < 1e-12);
        assert!((c2 - 0.002).abs() < 1e-12);
    }

    #[test]
    fn test_validate() {
        let mut h = ImageHeader::new_tan(10, 10, 0.0, 0.0, 0.01);
        assert!(h.validate().is_ok());
        h.cdelt2 = 0.0;
        assert!(h.validate().is_err());
        let mut h = ImageHeader::new_tan(0, 10, 0.0, 0.0, 0.01);
        assert!(h.validate().is_err());
        h.naxis1 = 10;
        h.ctype1 = "RA---ZEA".to_string();
        assert!(matches!(h.validate(), Err(SkyError::UnsupportedProjection(_))));
    }

    #[test]
    fn test_dims_and_cube() {
        let mut h = ImageHeader::new_tan(4, 3, 0.0, 0.0, 0.01);
        assert_eq!(h.dims(), vec![4, 3]);
        assert!(!h.is_cube());
        h.naxis3 = 5;
        assert_eq!(h.dims(), vec![4, 3, 5]);
        assert!(h.is_cube());
    }
}
