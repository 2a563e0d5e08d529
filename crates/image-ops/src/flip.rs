//! Mirror an image along one pixel axis while keeping its sky mapping.
//!
//! Both flips work on every plane of a cube. Flipping twice along the
//! same axis restores the pixels exactly; the header comes back exact
//! for reference pixels on the usual integer or half-integer grid.

use rayon::prelude::*;
use sky_common::{ImageHeader, SipCoefficients, SkyImage};
use tracing::debug;

/// Mirror left to right.
pub fn flip_x(image: &SkyImage) -> SkyImage {
    let width = image.pixels.width();
    let mut pixels = image.pixels.clone();
    if width > 0 {
        pixels.data.par_chunks_mut(width).for_each(|row| row.reverse());
    }

    let mut header = image.header.clone();
    header.crpix1 = header.naxis1 as f64 + 1.0 - header.crpix1;
    header.cdelt1 = -header.cdelt1;
    if let Some(cd) = header.cd.as_mut() {
        cd[0][0] = -cd[0][0];
        cd[1][0] = -cd[1][0];
    }
    flip_sip(&mut header, Axis::X);
    debug!(crpix1 = header.crpix1, "Flipped image along x");

    SkyImage { header, pixels }
}

/// Mirror top to bottom.
pub fn flip_y(image: &SkyImage) -> SkyImage {
    let (width, height) = (image.pixels.width(), image.pixels.height());
    let plane_len = width * height;
    let mut pixels = image.pixels.clone();
    if plane_len > 0 {
        pixels.data.par_chunks_mut(plane_len).for_each(|plane| {
            for row in 0..height / 2 {
                let (top, bottom) = plane.split_at_mut((height - 1 - row) * width);
                top[row * width..(row + 1) * width].swap_with_slice(&mut bottom[..width]);
            }
        });
    }

    let mut header = image.header.clone();
    header.crpix2 = header.naxis2 as f64 + 1.0 - header.crpix2;
    header.cdelt2 = -header.cdelt2;
    if let Some(cd) = header.cd.as_mut() {
        cd[0][1] = -cd[0][1];
        cd[1][1] = -cd[1][1];
    }
    flip_sip(&mut header, Axis::Y);
    debug!(crpix2 = header.crpix2, "Flipped image along y");

    SkyImage { header, pixels }
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    X,
    Y,
}

/// Negating pixel offset u (or v) turns A into -A(-u, v) and B into
/// B(-u, v), and the same for the inverse terms.
fn flip_sip(header: &mut ImageHeader, axis: Axis) {
    let Some(sip) = header.sip.as_mut() else {
        return;
    };
    let SipCoefficients { a, b, ap, bp } = sip;
    let (along, across) = match axis {
        Axis::X => ((a, ap), (b, bp)),
        Axis::Y => ((b, bp), (a, ap)),
    };
    for m in [along.0, along.1] {
        negate_terms(m, axis, true);
    }
    for m in [across.0, across.1] {
        negate_terms(m, axis, false);
    }
}

/// `m[p][q]` multiplies u^p v^q.
fn negate_terms(m: &mut [Vec<f64>], axis: Axis, along: bool) {
    for (p, row) in m.iter_mut().enumerate() {
        for (q, coef) in row.iter_mut().enumerate() {
            let power = match axis {
                Axis::X => p,
                Axis::Y => q,
            };
            let odd = power % 2 == 1;
            // along-axis terms flip when the power is even, across-axis when odd
            if odd != along {
                *coef = -*coef;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sky_common::PixelArray;

    fn small() -> SkyImage {
        let header = ImageHeader::new_tan(3, 2, 10.0, 20.0, 0.01);
        let pixels = PixelArray::new(vec![3, 2], (0..6).map(|v| v as f32).collect()).unwrap();
        SkyImage::new(header, pixels).unwrap()
    }

    #[test]
    fn test_flip_x_data() {
        let out = flip_x(&small());
        assert_eq!(out.pixels.data, vec![2.0, 1.0, 0.0, 5.0, 4.0, 3.0]);
        assert_eq!(out.header.cdelt1, 0.01);
    }

    #[test]
    fn test_flip_y_data() {
        let out = flip_y(&small());
        assert_eq!(out.pixels.data, vec![3.0, 4.0, 5.0, 0.0, 1.0, 2.0]);
        assert_eq!(out.header.crpix2, 1.5);
    }

    #[test]
    fn test_sip_signs() {
        let mut header = ImageHeader::new_tan(3, 2, 10.0, 20.0, 0.01);
        header.sip = Some(SipCoefficients {
            a: vec![vec![0.0, 0.0, 1.0], vec![0.0, 1.0, 0.0], vec![1.0, 0.0, 0.0]],
            b: vec![vec![0.0, 0.0, 1.0], vec![0.0, 1.0, 0.0], vec![1.0, 0.0, 0.0]],
            ap: Vec::new(),
            bp: Vec::new(),
        });
        flip_sip(&mut header, Axis::X);
        let sip = header.sip.unwrap();
        // A: -A(-u, v); v^2 and u^2 flip, u*v keeps its sign
        assert_eq!(sip.a[0][2], -1.0);
        assert_eq!(sip.a[1][1], 1.0);
        assert_eq!(sip.a[2][0], -1.0);
        // B: B(-u, v); only odd powers of u flip
        assert_eq!(sip.b[0][2], 1.0);
        assert_eq!(sip.b[1][1], -1.0);
        assert_eq!(sip.b[2][0], 1.0);
    }
}
