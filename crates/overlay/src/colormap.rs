//! Density color bands for decimated representatives.

use sky_common::Color;

/// Build `size` color bands running from a light tint of `base` up to
/// `base` itself. Band 0 is the lightest.
pub fn simple_color_map(base: Color, size: usize) -> Vec<Color> {
    match size {
        0 => Vec::new(),
        1 => vec![base],
        _ => {
            let tint = base.lerp(&Color::WHITE, 0.8);
            (0..size)
                .map(|i| tint.lerp(&base, i as f64 / (size - 1) as f64))
                .collect()
        }
    }
}

/// Palette index for a representative standing in for `count` objects,
/// given the largest count in the set.
///
/// When counts exceed the palette the range is split linearly, with
/// `max_entry + 1` as the divisor so the largest count still lands in the
/// last band. Otherwise counts index the palette directly (1-based).
pub fn band_index(count: u32, max_entry: u32, palette_len: usize) -> usize {
    if palette_len == 0 {
        return 0;
    }
    let count = count.max(1) as u64;
    let idx = if max_entry as usize > palette_len {
        (count * palette_len as u64 / (max_entry as u64 + 1)) as usize
    } else {
        (count - 1) as usize
    };
    idx.min(palette_len - 1)
}
