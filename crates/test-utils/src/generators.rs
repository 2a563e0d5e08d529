//! Generators for synthetic images and catalogs.
//!
//! Everything here is deterministic so failures reproduce.

use std::io::Write;

use serde::Serialize;
use sky_common::{ImageHeader, PixelArray, SkyImage, WorldPt};
use tempfile::NamedTempFile;

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`, so a wrong index
/// shows up immediately in an assertion.
///
/// # Example
///
/// ```
/// use test_utils::create_index_grid;
///
/// let grid = create_index_grid(10, 5);
/// assert_eq!(grid.data.len(), 50);
/// assert_eq!(grid.data[1], 1000.0);  // col=1, row=0
/// assert_eq!(grid.data[10], 1.0);    // col=0, row=1
/// ```
pub fn create_index_grid(width: usize, height: usize) -> PixelArray {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    PixelArray {
        dims: vec![width, height],
        data,
    }
}

/// A 3D version of [`create_index_grid`]: plane `k` adds `k * 1_000_000`.
pub fn create_index_cube(width: usize, height: usize, planes: usize) -> PixelArray {
    let mut data = Vec::with_capacity(width * height * planes);
    for k in 0..planes {
        for row in 0..height {
            for col in 0..width {
                data.push((k * 1_000_000 + col * 1000 + row) as f32);
            }
        }
    }
    PixelArray {
        dims: vec![width, height, planes],
        data,
    }
}

/// A linear ramp `value = x + y` over the image.
pub fn create_ramp(width: usize, height: usize) -> PixelArray {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col + row) as f32);
        }
    }
    PixelArray {
        dims: vec![width, height],
        data,
    }
}

/// Sky background with gaussian stars at pseudo-random positions.
///
/// # Arguments
///
/// * `width`, `height` - image size
/// * `stars` - number of stars
/// * `seed` - seed for the star positions
pub fn create_star_field(width: usize, height: usize, stars: usize, seed: u32) -> PixelArray {
    let mut data = vec![100.0f32; width * height];
    for (i, value) in data.iter_mut().enumerate() {
        // low-level background noise
        *value += (simple_hash(i as u32, 7, seed) % 100) as f32 / 10.0;
    }

    for s in 0..stars {
        let cx = (simple_hash(s as u32, 1, seed) as usize % width) as f32;
        let cy = (simple_hash(s as u32, 2, seed) as usize % height) as f32;
        let peak = 500.0 + (simple_hash(s as u32, 3, seed) % 5000) as f32;
        let sigma = 1.5f32;
        let reach = 6i64;
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let x = cx as i64 + dx;
                let y = cy as i64 + dy;
                if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
                    continue;
                }
                let r2 = (dx * dx + dy * dy) as f32;
                data[y as usize * width + x as usize] += peak * (-r2 / (2.0 * sigma * sigma)).exp();
            }
        }
    }

    PixelArray {
        dims: vec![width, height],
        data,
    }
}

/// Pair a header with a star field of matching size.
pub fn create_sky_image(header: ImageHeader, seed: u32) -> SkyImage {
    let pixels = create_star_field(header.naxis1, header.naxis2, 40, seed);
    SkyImage { header, pixels }
}

/// Replace every `step`-th value with NaN.
pub fn sprinkle_nans(pixels: &mut PixelArray, step: usize) {
    for value in pixels.data.iter_mut().step_by(step.max(1)) {
        *value = f32::NAN;
    }
}

/// `count` sky positions scattered uniformly in a box of `half_width_deg`
/// around `center`.
pub fn create_catalog_positions(
    center: (f64, f64),
    half_width_deg: f64,
    count: usize,
    seed: u32,
) -> Vec<WorldPt> {
    let (ra0, dec0) = center;
    let cos_dec = dec0.to_radians().cos().max(1e-6);
    (0..count)
        .map(|i| {
            let fx = unit_float(simple_hash(i as u32, 11, seed));
            let fy = unit_float(simple_hash(i as u32, 13, seed));
            let ra = ra0 + (fx * 2.0 - 1.0) * half_width_deg / cos_dec;
            let dec = dec0 + (fy * 2.0 - 1.0) * half_width_deg;
            WorldPt::new(ra.rem_euclid(360.0), dec)
        })
        .collect()
}

/// Serialize `value` to JSON in a temp file that lives as long as the
/// returned handle.
pub fn write_temp_json<T: Serialize>(value: &T) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    let json = serde_json::to_vec(value).expect("serialize fixture");
    file.write_all(&json).expect("write fixture");
    file
}

fn unit_float(h: u32) -> f64 {
    h as f64 / u32::MAX as f64
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}
