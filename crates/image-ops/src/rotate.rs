//! Image rotation by resampling onto a rotated gnomonic grid.

use projection::{celestial, spherical, Projection};
use sky_common::{CoordSys, ImageHeader, SkyImage, WorldPt};
use tracing::info;

use crate::error::{ImageOpsError, Result};
use crate::geom::{Geom, GeomOverrides};

/// Resample `image` so north of `csys` points up.
pub fn rotate_to_north(geom: &Geom, image: &SkyImage, csys: CoordSys) -> Result<SkyImage> {
    rotate_to_position_angle(geom, image, 0.0, csys)
}

/// Rotate `image` counter-clockwise by `angle_deg` relative to its
/// current orientation.
pub fn rotate_by_angle(geom: &Geom, image: &SkyImage, angle_deg: f64) -> Result<SkyImage> {
    let header = &image.header;
    let proj = Projection::from_header(header)?;
    let (cx, cy) = pixel_center(header);
    let below = proj.pixel_to_world(cx, cy - 1.0);
    let center = proj.pixel_to_world(cx, cy);
    let (below, center) = match (below, center) {
        (Some(b), Some(c)) => (b, c),
        _ => {
            return Err(ImageOpsError::resampling(
                "could not rotate image: center is off the projection",
                header.naxis1,
                header.naxis2,
            ))
        }
    };
    let current = -spherical::wrap_180(spherical::position_angle(
        below.lon, below.lat, center.lon, center.lat,
    ));
    rotate_to_position_angle(geom, image, current + angle_deg, CoordSys::EqJ2000)
}

/// Resample `image` onto a TAN grid in `csys` with CROTA2 set to
/// `position_angle`, sized to hold the whole input.
pub fn rotate_to_position_angle(
    geom: &Geom,
    image: &SkyImage,
    position_angle: f64,
    csys: CoordSys,
) -> Result<SkyImage> {
    let reference = rotated_header(&image.header, position_angle, csys)?;
    let overrides = GeomOverrides {
        naxis1: Some(0),
        ..Default::default()
    };
    let out = geom.resample(image, Some(&reference), &overrides)?;
    info!(
        position_angle,
        csys = %csys,
        naxis1 = out.header.naxis1,
        naxis2 = out.header.naxis2,
        "Rotated image"
    );
    Ok(out)
}

/// Reference header for a rotation: TAN centered on the image center,
/// same pixel size, north at `position_angle`. CD matrix and SIP terms of
/// the input are dropped.
pub fn rotated_header(header: &ImageHeader, position_angle: f64, csys: CoordSys) -> Result<ImageHeader> {
    if !csys.is_celestial() {
        return Err(ImageOpsError::Config(format!(
            "cannot rotate into non-sky coordinate system {}",
            csys
        )));
    }

    let proj = Projection::from_header(header)?;
    let (cx, cy) = pixel_center(header);
    let center: WorldPt = proj
        .pixel_to_world(cx, cy)
        .and_then(|wp| celestial::convert(&wp, csys))
        .ok_or_else(|| {
            ImageOpsError::resampling(
                "could not rotate image: center is off the projection",
                header.naxis1,
                header.naxis2,
            )
        })?;

    let (cdelt1, cdelt2) = header.effective_cdelt();
    let (lon_axis, lat_axis) = csys.ctype_prefixes();

    let mut reference = ImageHeader::new_tan(header.naxis1, header.naxis2, center.lon, center.lat, 1.0);
    reference.cdelt1 = -cdelt1.abs();
    reference.cdelt2 = cdelt2.abs();
    reference.crpix1 = (header.naxis1 / 2) as f64;
    reference.crpix2 = (header.naxis2 / 2) as f64;
    reference.crota2 = position_angle;
    reference.ctype1 = format!("{}-TAN", lon_axis);
    reference.ctype2 = format!("{}-TAN", lat_axis);
    Ok(reference)
}

/// 0-based pixel center.
fn pixel_center(header: &ImageHeader) -> (f64, f64) {
    (
        (header.naxis1 as f64 + 1.0) / 2.0 - 1.0,
        (header.naxis2 as f64 + 1.0) / 2.0 - 1.0,
    )
}
