//! Pixel <-> world projection built from an image header.

use nalgebra::{Matrix2, Vector2};
use sky_common::{CoordSys, ImageHeader, ProjectionType, SkyError, SkyResult, WorldPt};
use tracing::{debug, trace};

use crate::celestial;
use crate::linear;
use crate::sip::SipDistortion;
use crate::spherical::{celestial_to_native, native_to_celestial};
use crate::zenithal::Zenithal;

/// A WCS projection for one image.
///
/// Pixel coordinates here are 0-based with pixel centers on integers, so
/// FITS pixel `p` is `p - 1`.
#[derive(Debug, Clone)]
pub struct Projection {
    kind: ProjectionType,
    csys: CoordSys,
    crpix: (f64, f64),
    crval: (f64, f64),
    cd: Matrix2<f64>,
    cd_inv: Matrix2<f64>,
    sip: Option<SipDistortion>,
    pixel_scale_deg: f64,
    naxis: (usize, usize),
}

impl Projection {
    /// Build a projection from the header's WCS keywords.
    pub fn from_header(header: &ImageHeader) -> SkyResult<Self> {
        if let Err(err) = header.validate() {
            debug!(error = %err, ctype1 = %header.ctype1, "Rejected header");
            return Err(err);
        }
        let m = header.cd_matrix();
        let cd = Matrix2::new(m[0][0], m[0][1], m[1][0], m[1][1]);
        let cd_inv = cd.try_inverse().ok_or_else(|| {
            debug!(cd = ?m, "CD matrix is not invertible");
            SkyError::invalid_header("CD matrix is not invertible")
        })?;

        Ok(Self {
            kind: header.projection_type(),
            csys: header.coord_sys(),
            crpix: (header.crpix1, header.crpix2),
            crval: (header.crval1, header.crval2),
            cd,
            cd_inv,
            sip: header.sip.clone().map(SipDistortion::new),
            pixel_scale_deg: header.pixel_scale_deg(),
            naxis: (header.naxis1, header.naxis2),
        })
    }

    pub fn kind(&self) -> ProjectionType {
        self.kind
    }

    /// Coordinate system of the image's world axes.
    pub fn coord_sys(&self) -> CoordSys {
        self.csys
    }

    /// Pixel width in degrees.
    pub fn pixel_scale_deg(&self) -> f64 {
        self.pixel_scale_deg
    }

    pub fn is_wrapping(&self) -> bool {
        self.kind.is_wrapping()
    }

    pub fn dimensions(&self) -> (usize, usize) {
        self.naxis
    }

    /// Pixel (0-based) to world coordinates in the image's system.
    /// Returns None when the pixel does not map onto the sky.
    pub fn pixel_to_world(&self, x: f64, y: f64) -> Option<WorldPt> {
        let mut u = x + 1.0 - self.crpix.0;
        let mut v = y + 1.0 - self.crpix.1;
        if let Some(sip) = &self.sip {
            (u, v) = sip.distort(u, v);
        }
        let plane = self.cd * Vector2::new(u, v);

        let (lon, lat) = match self.kind {
            ProjectionType::Gnomonic | ProjectionType::Orthographic => {
                let (phi, theta) = self.zenithal().deproject(plane.x, plane.y)?;
                let (lon, lat) = native_to_celestial(
                    phi,
                    theta,
                    self.crval.0.to_radians(),
                    self.crval.1.to_radians(),
                );
                (lon.to_degrees().rem_euclid(360.0), lat.to_degrees())
            }
            ProjectionType::Linear => linear::deproject(plane.x, plane.y, self.crval.0, self.crval.1)?,
            ProjectionType::Unsupported => return None,
        };

        if !(lon.is_finite() && lat.is_finite()) {
            return None;
        }
        Some(WorldPt::with_csys(lon, lat, self.csys))
    }

    /// World coordinates to pixel (0-based). Points in another celestial
    /// system are converted first. Returns None when the point is off the
    /// projectable region.
    pub fn world_to_pixel(&self, wp: &WorldPt) -> Option<(f64, f64)> {
        let wp = celestial::convert(wp, self.csys)?;

        let (px, py) = match self.kind {
            ProjectionType::Gnomonic | ProjectionType::Orthographic => {
                let (phi, theta) = celestial_to_native(
                    wp.lon.to_radians(),
                    wp.lat.to_radians(),
                    self.crval.0.to_radians(),
                    self.crval.1.to_radians(),
                );
                self.zenithal().project(phi, theta)?
            }
            ProjectionType::Linear => linear::project(wp.lon, wp.lat, self.crval.0, self.crval.1)?,
            ProjectionType::Unsupported => return None,
        };

        let uv = self.cd_inv * Vector2::new(px, py);
        let (u, v) = match &self.sip {
            Some(sip) => match sip.undistort(uv.x, uv.y) {
                Some(uv) => uv,
                None => {
                    trace!(lon = wp.lon, lat = wp.lat, "SIP inverse did not converge");
                    return None;
                }
            },
            None => (uv.x, uv.y),
        };

        let x = u + self.crpix.0 - 1.0;
        let y = v + self.crpix.1 - 1.0;
        if x.is_finite() && y.is_finite() {
            Some((x, y))
        } else {
            None
        }
    }

    fn zenithal(&self) -> Zenithal {
        match self.kind {
            ProjectionType::Orthographic => Zenithal::Orthographic,
            _ => Zenithal::Gnomonic,
        }
    }
}
