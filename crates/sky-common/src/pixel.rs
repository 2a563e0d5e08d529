//! Pixel arrays and header/array pairs.

use serde::{Deserialize, Serialize};

use crate::error::{SkyError, SkyResult};
use crate::header::ImageHeader;

/// An N-dimensional float array stored in FITS order: axis 1 varies
/// fastest, so a 2D array is row-major with `dims = [width, height]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixelArray {
    pub dims: Vec<usize>,
    #[serde(with = "blank_as_null")]
    pub data: Vec<f32>,
}

impl PixelArray {
    pub fn new(dims: Vec<usize>, data: Vec<f32>) -> SkyResult<Self> {
        if dims.len() < 2 {
            return Err(SkyError::invalid_parameter(
                "dims",
                format!("need at least 2 axes, got {}", dims.len()),
            ));
        }
        let expected: usize = dims.iter().product();
        if expected != data.len() {
            return Err(SkyError::invalid_parameter(
                "data",
                format!("dims {:?} need {} values, got {}", dims, expected, data.len()),
            ));
        }
        Ok(Self { dims, data })
    }

    /// A 2D array filled with `value`.
    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self {
            dims: vec![width, height],
            data: vec![value; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.dims[0]
    }

    pub fn height(&self) -> usize {
        self.dims[1]
    }

    /// Number of 2D planes (product of axes beyond the second).
    pub fn planes(&self) -> usize {
        self.dims[2..].iter().product()
    }

    pub fn plane_len(&self) -> usize {
        self.width() * self.height()
    }

    pub fn plane(&self, index: usize) -> &[f32] {
        let len = self.plane_len();
        &self.data[index * len..(index + 1) * len]
    }

    /// Value at (`x`, `y`) of the first plane, 0-based.
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        self.data.get(y * self.width() + x).copied()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// JSON has no NaN, so blank pixels travel as `null`.
mod blank_as_null {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[f32], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(data.len()))?;
        for v in data {
            seq.serialize_element(&(!v.is_nan()).then_some(*v))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f32>, D::Error> {
        let values = Vec::<Option<f32>>::deserialize(deserializer)?;
        Ok(values.into_iter().map(|v| v.unwrap_or(f32::NAN)).collect())
    }
}

/// A header and the pixels it describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkyImage {
    pub header: ImageHeader,
    pub pixels: PixelArray,
}

impl SkyImage {
    /// Pair a header with pixels, checking that the axis sizes agree.
    pub fn new(header: ImageHeader, pixels: PixelArray) -> SkyResult<Self> {
        let dims = header.dims();
        let matches = pixels.dims.len() >= 2
            && pixels.dims[0] == dims[0]
            && pixels.dims[1] == dims[1]
            && pixels.planes() == dims[2..].iter().product::<usize>();
        if !matches {
            return Err(SkyError::invalid_header(format!(
                "header axes {:?} do not match pixel axes {:?}",
                dims, pixels.dims
            )));
        }
        Ok(Self { header, pixels })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_length() {
        assert!(PixelArray::new(vec![2, 2], vec![0.0; 4]).is_ok());
        assert!(PixelArray::new(vec![2, 2], vec![0.0; 3]).is_err());
        assert!(PixelArray::new(vec![4], vec![0.0; 4]).is_err());
    }

    #[test]
    fn test_planes() {
        let arr = PixelArray::new(vec![2, 3, 4], (0..24).map(|v| v as f32).collect()).unwrap();
        assert_eq!(arr.planes(), 4);
        assert_eq!(arr.plane(1)[0], 6.0);
        assert_eq!(arr.get(1, 2), Some(5.0));
        assert_eq!(arr.get(2, 0), None);
    }

    #[test]
    fn test_blank_pixels_survive_json() {
        let arr = PixelArray::new(vec![3, 1], vec![1.0, f32::NAN, 3.0]).unwrap();
        let json = serde_json::to_string(&arr).unwrap();
        assert!(json.contains("null"));
        let back: PixelArray = serde_json::from_str(&json).unwrap();
        assert_eq!(back.data[0], 1.0);
        assert!(back.data[1].is_nan());
        assert_eq!(back.data[2], 3.0);
    }

    #[test]
    fn test_sky_image_dims_mismatch() {
        let header = ImageHeader::new_tan(3, 2, 0.0, 0.0, 0.1);
        assert!(SkyImage::new(header.clone(), PixelArray::filled(3, 2, 0.0)).is_ok());
        assert!(SkyImage::new(header, PixelArray::filled(2, 3, 0.0)).is_err());
    }
}
