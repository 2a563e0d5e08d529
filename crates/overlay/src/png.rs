//! PNG encoding for rendered overlay layers.
//!
//! Overlays are mostly transparent with a handful of marker colors, so the
//! indexed form (color type 3) is tried first and RGBA (color type 6) is
//! the fallback.

use std::collections::HashMap;
use std::io::Write;

use crate::error::{DrawError, Result};

const MAX_PALETTE_SIZE: usize = 256;

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Encode straight-alpha RGBA bytes, choosing indexed output when the
/// image has at most 256 distinct colors.
pub fn encode_png(rgba: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    if rgba.len() != width * height * 4 {
        return Err(DrawError::surface(format!(
            "pixel buffer has {} bytes, expected {}",
            rgba.len(),
            width * height * 4
        )));
    }
    match extract_palette(rgba) {
        Some((palette, indices)) => encode_indexed(width, height, &palette, &indices),
        None => encode_rgba(rgba, width, height),
    }
}

fn extract_palette(rgba: &[u8]) -> Option<(Vec<[u8; 4]>, Vec<u8>)> {
    let mut lookup: HashMap<[u8; 4], u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices = Vec::with_capacity(rgba.len() / 4);

    for px in rgba.chunks_exact(4) {
        let key = [px[0], px[1], px[2], px[3]];
        let idx = match lookup.get(&key) {
            Some(&idx) => idx,
            None => {
                if palette.len() >= MAX_PALETTE_SIZE {
                    return None;
                }
                let idx = palette.len() as u8;
                palette.push(key);
                lookup.insert(key, idx);
                idx
            }
        };
        indices.push(idx);
    }
    Some((palette, indices))
}

fn encode_indexed(
    width: usize,
    height: usize,
    palette: &[[u8; 4]],
    indices: &[u8],
) -> Result<Vec<u8>> {
    let mut png = SIGNATURE.to_vec();
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));

    let plte: Vec<u8> = palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    // alpha entries may stop at the last non-opaque color
    let trns_len = palette
        .iter()
        .rposition(|c| c[3] != 255)
        .map_or(0, |p| p + 1);
    if trns_len > 0 {
        let trns: Vec<u8> = palette[..trns_len].iter().map(|c| c[3]).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    let idat = deflate_scanlines(indices, width, height, 1)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn encode_rgba(rgba: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    let mut png = SIGNATURE.to_vec();
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 6));
    let idat = deflate_scanlines(rgba, width, height, 4)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn ihdr(width: usize, height: usize, color_type: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(13);
    data.extend_from_slice(&(width as u32).to_be_bytes());
    data.extend_from_slice(&(height as u32).to_be_bytes());
    data.push(8); // bit depth
    data.push(color_type);
    data.extend_from_slice(&[0, 0, 0]); // compression, filter, interlace
    data
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Prefix each scanline with filter type 0 and zlib-compress.
fn deflate_scanlines(data: &[u8], width: usize, height: usize, bpp: usize) -> Result<Vec<u8>> {
    let stride = width * bpp;
    let mut raw = Vec::with_capacity(height * (stride + 1));
    for row in data.chunks_exact(stride.max(1)).take(height) {
        raw.push(0);
        raw.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder
        .write_all(&raw)
        .map_err(|e| DrawError::surface(format!("IDAT compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| DrawError::surface(format!("IDAT compression failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_and_indexed_header() {
        let pixels = [255, 0, 0, 255, 0, 0, 0, 0, 255, 0, 0, 255, 0, 0, 0, 0];
        let png = encode_png(&pixels, 2, 2).unwrap();
        assert_eq!(&png[..8], &SIGNATURE);
        assert_eq!(&png[12..16], b"IHDR");
        // color type byte of IHDR
        assert_eq!(png[25], 3);
    }

    #[test]
    fn test_many_colors_fall_back_to_rgba() {
        let mut pixels = Vec::new();
        for i in 0..300u32 {
            pixels.extend_from_slice(&[(i % 256) as u8, (i / 256) as u8, 7, 255]);
        }
        let png = encode_png(&pixels, 300, 1).unwrap();
        assert_eq!(png[25], 6);
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(encode_png(&[0, 0, 0], 1, 1).is_err());
    }
}
