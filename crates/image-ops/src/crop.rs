//! Sub-rectangle extraction.

use projection::Projection;
use rayon::prelude::*;
use sky_common::{PixelArray, SkyImage, WorldPt};
use tracing::debug;

use crate::error::{ImageOpsError, Result};

/// Plate-solution headers carry the crop offset in CNPIX instead of CRPIX.
const PLATE_KEY: &str = "PLTRAH";

/// Crop `image` to the 0-based inclusive box (`min_x`, `min_y`) -
/// (`max_x`, `max_y`).
///
/// Reversed bounds are swapped and the box is clamped to the image. When
/// CDELT2 is negative the y bounds count from the top row. Cubes are
/// rejected.
pub fn crop(image: &SkyImage, min_x: i64, min_y: i64, max_x: i64, max_y: i64) -> Result<SkyImage> {
    let header = &image.header;
    if header.is_cube() {
        return Err(ImageOpsError::UnsupportedDimensions(
            "cannot crop a cube".to_string(),
        ));
    }

    let (n1, n2) = (header.naxis1 as i64, header.naxis2 as i64);
    let (mut min_y, mut max_y) = (min_y, max_y);
    if header.effective_cdelt().1 < 0.0 {
        min_y = n2 - min_y - 1;
        max_y = n2 - max_y - 1;
    }

    let (x0, x1) = ordered(min_x, max_x);
    let (y0, y1) = ordered(min_y, max_y);
    let (x0, x1) = (x0.max(0), x1.min(n1 - 1));
    let (y0, y1) = (y0.max(0), y1.min(n2 - 1));
    if x0 > x1 || y0 > y1 {
        return Err(ImageOpsError::out_of_bounds(
            format!("({}, {}) - ({}, {})", min_x, min_y, max_x, max_y),
            format!("{}x{}", n1, n2),
        ));
    }

    let rect = CropRect { x0, y0, x1, y1 };
    let out = extract(image, &rect);
    debug!(
        x0,
        y0,
        naxis1 = out.header.naxis1,
        naxis2 = out.header.naxis2,
        "Cropped image"
    );
    Ok(out)
}

/// Crop a square of half-width `radius_deg` around `center`.
///
/// The box is clamped to the image like [`crop`]; a box that misses the
/// image entirely is an error.
pub fn crop_sky(image: &SkyImage, center: &WorldPt, radius_deg: f64) -> Result<SkyImage> {
    let header = &image.header;
    if !(radius_deg.is_finite() && radius_deg >= 0.0) {
        return Err(ImageOpsError::invalid_parameter(
            "radius",
            format!("must be a non-negative number of degrees, got {}", radius_deg),
        ));
    }
    let cdelt2 = header.effective_cdelt().1;
    if !(cdelt2.is_finite() && cdelt2 != 0.0) {
        return Err(ImageOpsError::invalid_header(format!(
            "CDELT2 must be finite and non-zero, got {}",
            cdelt2
        )));
    }

    let proj = Projection::from_header(header)?;
    let (px, py) = proj.world_to_pixel(center).ok_or_else(|| {
        ImageOpsError::out_of_bounds(
            format!("({:.6}, {:.6})", center.lon, center.lat),
            "projection",
        )
    })?;

    // Bounds are limited to one pixel past each edge before the integer
    // cast; crop() then clamps them onto the image.
    let radius_px = (radius_deg / cdelt2.abs()).trunc();
    let (cx, cy) = (px.trunc(), py.trunc());
    let (n1, n2) = (header.naxis1 as f64, header.naxis2 as f64);
    let bound = |v: f64, n: f64| v.clamp(-1.0, n) as i64;
    let (x0, x1) = (bound(cx - radius_px, n1), bound(cx + radius_px, n1));
    let (y0, y1) = (bound(cy - radius_px, n2), bound(cy + radius_px, n2));

    debug!(cx, cy, radius_px, "Cropping around sky position");
    crop(image, x0, y0, x1, y1)
}

#[derive(Debug, Clone, Copy)]
struct CropRect {
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
}

impl CropRect {
    fn width(&self) -> usize {
        (self.x1 - self.x0 + 1) as usize
    }

    fn height(&self) -> usize {
        (self.y1 - self.y0 + 1) as usize
    }
}

fn ordered(a: i64, b: i64) -> (i64, i64) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

/// Copy `rect`, which must lie inside the image, out of the first plane
/// and shift the reference pixel to match.
fn extract(image: &SkyImage, rect: &CropRect) -> SkyImage {
    let src = &image.pixels;
    let src_w = src.width();
    let plane = src.plane(0);
    let (width, height) = (rect.width(), rect.height());
    let (x0, y0) = (rect.x0 as usize, rect.y0 as usize);

    let mut data = vec![0.0f32; width * height];
    data.par_chunks_mut(width)
        .enumerate()
        .for_each(|(row, out_row)| {
            let base = (y0 + row) * src_w + x0;
            out_row.copy_from_slice(&plane[base..base + width]);
        });

    let mut header = image.header.clone();
    header.naxis1 = width;
    header.naxis2 = height;
    if header.cards.contains_key(PLATE_KEY) {
        shift_card(&mut header.cards, "CNPIX1", rect.x0);
        shift_card(&mut header.cards, "CNPIX2", rect.y0);
    } else {
        header.crpix1 -= rect.x0 as f64;
        header.crpix2 -= rect.y0 as f64;
    }

    let (lo, hi) = data
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v as f64), hi.max(v as f64))
        });
    if lo <= hi {
        header.datamin = Some(lo);
        header.datamax = Some(hi);
    }

    SkyImage {
        header,
        pixels: PixelArray {
            dims: vec![width, height],
            data,
        },
    }
}

fn shift_card(cards: &mut std::collections::BTreeMap<String, String>, key: &str, by: i64) {
    let current = cards
        .get(key)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(0.0);
    cards.insert(key.to_string(), (current + by as f64).to_string());
}
