//! Pixel sampling for resampled images.
//!
//! Positions are 0-based source pixel coordinates with pixel centers on
//! integers. A `None` result means the output pixel stays blank.

use serde::{Deserialize, Serialize};

/// How an output pixel takes its value from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Value of the source pixel containing the position (exact values).
    #[default]
    Nearest,
    /// Weighted mean of the four enclosing source pixels.
    Bilinear,
}

impl Interpolation {
    /// Parse from string (case-insensitive), falling back to `Nearest`.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "bilinear" | "linear" => Self::Bilinear,
            _ => Self::Nearest,
        }
    }

    /// Sample `data` (a `width` x `height` plane) at (`x`, `y`).
    pub fn sample(
        &self,
        data: &[f32],
        width: usize,
        height: usize,
        x: f64,
        y: f64,
        min_weight: f64,
    ) -> Option<f32> {
        match self {
            Self::Nearest => nearest(data, width, height, x, y),
            Self::Bilinear => bilinear(data, width, height, x, y, min_weight),
        }
    }
}

impl std::fmt::Display for Interpolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nearest => write!(f, "nearest"),
            Self::Bilinear => write!(f, "bilinear"),
        }
    }
}

/// Nearest neighbor sampling. Blank (NaN) source pixels give no sample.
pub fn nearest(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> Option<f32> {
    if !(x.is_finite() && y.is_finite()) {
        return None;
    }
    let col = (x + 0.5).floor();
    let row = (y + 0.5).floor();
    if col < 0.0 || row < 0.0 || col >= width as f64 || row >= height as f64 {
        return None;
    }
    data.get(row as usize * width + col as usize)
        .copied()
        .filter(|v| !v.is_nan())
}

/// Bilinear sampling that tolerates blank or missing neighbors.
///
/// Missing neighbors drop out of the weighted mean; the sample is kept
/// only while the remaining weight is at least `min_weight`.
pub fn bilinear(
    data: &[f32],
    width: usize,
    height: usize,
    x: f64,
    y: f64,
    min_weight: f64,
) -> Option<f32> {
    if !(x.is_finite() && y.is_finite()) {
        return None;
    }
    if x < min_weight - 1.0
        || y < min_weight - 1.0
        || x > width as f64 - min_weight
        || y > height as f64 - min_weight
    {
        return None;
    }

    let x0 = x.floor();
    let y0 = y.floor();
    let xf = x - x0;
    let yf = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let corners = [
        (x0, y0, (1.0 - xf) * (1.0 - yf)),
        (x0 + 1, y0, xf * (1.0 - yf)),
        (x0, y0 + 1, (1.0 - xf) * yf),
        (x0 + 1, y0 + 1, xf * yf),
    ];

    let mut sum = 0.0;
    let mut weight = 0.0;
    for (cx, cy, w) in corners {
        if cx < 0 || cy < 0 || cx >= width as i64 || cy >= height as i64 {
            continue;
        }
        let v = data[cy as usize * width + cx as usize];
        if v.is_nan() {
            continue;
        }
        sum += v as f64 * w;
        weight += w;
    }

    if weight >= min_weight && weight > 0.0 {
        Some((sum / weight) as f32)
    } else {
        None
    }
}
