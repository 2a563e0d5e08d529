//! Configuration for overlay drawing and decimation.

use serde::{Deserialize, Serialize};
use sky_common::Color;

/// Tunables for the [`Drawer`](crate::Drawer) and the decimation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawerConfig {
    /// Merge dense point sets into per-bucket representatives.
    pub decimate: bool,

    /// Decimation engages only above this many objects.
    pub decimation_threshold: usize,

    /// Bucket size in screen pixels.
    pub fuzz_level: usize,

    /// Below this many in-viewport objects the undecimated list is drawn.
    pub literal_threshold: usize,

    /// Chunked drawing engages only above this many objects.
    pub very_large_threshold: usize,

    /// Objects per chunk on an optimized surface.
    pub point_chunk_size: usize,
    pub shape_chunk_size: usize,

    /// Objects per chunk on a surface without fast path support.
    pub slow_point_chunk_size: usize,
    pub slow_shape_chunk_size: usize,

    /// Draws larger than this register a pending progress task.
    pub task_threshold: usize,

    /// Color decimated representatives by density.
    pub colormap: bool,

    /// Maximum number of density color bands.
    pub colormap_size: usize,

    /// Color for objects that carry none.
    pub default_color: Color,
}

impl Default for DrawerConfig {
    fn default() -> Self {
        Self {
            decimate: true,
            decimation_threshold: 150,
            fuzz_level: 5,
            literal_threshold: 200,
            very_large_threshold: 500,
            point_chunk_size: 2000,
            shape_chunk_size: 1000,
            slow_point_chunk_size: 500,
            slow_shape_chunk_size: 200,
            task_threshold: 15000,
            colormap: false,
            colormap_size: 10,
            default_color: Color::RED,
        }
    }
}

impl DrawerConfig {
    /// Load configuration from `DRAWER_*` environment variables, keeping
    /// the default for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("DRAWER_DECIMATE") {
            config.decimate = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("DRAWER_COLORMAP") {
            config.colormap = val.to_lowercase() == "true" || val == "1";
        }

        let sizes: [(&str, &mut usize); 10] = [
            ("DRAWER_DECIMATION_THRESHOLD", &mut config.decimation_threshold),
            ("DRAWER_FUZZ_LEVEL", &mut config.fuzz_level),
            ("DRAWER_LITERAL_THRESHOLD", &mut config.literal_threshold),
            ("DRAWER_VERY_LARGE_THRESHOLD", &mut config.very_large_threshold),
            ("DRAWER_POINT_CHUNK_SIZE", &mut config.point_chunk_size),
            ("DRAWER_SHAPE_CHUNK_SIZE", &mut config.shape_chunk_size),
            ("DRAWER_SLOW_POINT_CHUNK_SIZE", &mut config.slow_point_chunk_size),
            ("DRAWER_SLOW_SHAPE_CHUNK_SIZE", &mut config.slow_shape_chunk_size),
            ("DRAWER_TASK_THRESHOLD", &mut config.task_threshold),
            ("DRAWER_COLORMAP_SIZE", &mut config.colormap_size),
        ];
        for (key, slot) in sizes {
            if let Ok(val) = std::env::var(key) {
                if let Ok(parsed) = val.parse() {
                    *slot = parsed;
                }
            }
        }

        if let Ok(val) = std::env::var("DRAWER_DEFAULT_COLOR") {
            if let Ok(color) = val.parse() {
                config.default_color = color;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.fuzz_level == 0 {
            return Err("fuzz_level must be > 0".to_string());
        }

        let chunks = [
            self.point_chunk_size,
            self.shape_chunk_size,
            self.slow_point_chunk_size,
            self.slow_shape_chunk_size,
        ];
        if chunks.iter().any(|&c| c == 0) {
            return Err("chunk sizes must be > 0".to_string());
        }

        if self.colormap_size == 0 {
            return Err("colormap_size must be > 0".to_string());
        }

        Ok(())
    }

    /// Chunk size for a draw whose first object is (or is not) a point,
    /// on a surface that is (or is not) optimized.
    pub fn chunk_size(&self, points: bool, optimized_surface: bool) -> usize {
        match (points, optimized_surface) {
            (true, true) => self.point_chunk_size,
            (true, false) => self.slow_point_chunk_size,
            (false, true) => self.shape_chunk_size,
            (false, false) => self.slow_shape_chunk_size,
        }
    }
}

/// Hint about the size and complexity of the data handed to a drawer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Large catalogs; drawn in cooperative chunks.
    VeryLarge,
    #[default]
    Normal,
    SmallAndSimple,
}

impl DataType {
    /// Parse from string (case-insensitive), falling back to `Normal`.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "very_large" | "verylarge" => Self::VeryLarge,
            "small_and_simple" | "small" => Self::SmallAndSimple,
            _ => Self::Normal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryLarge => "very_large",
            Self::Normal => "normal",
            Self::SmallAndSimple => "small_and_simple",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = DrawerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fuzz_level, 5);
        assert_eq!(config.decimation_threshold, 150);
    }

    #[test]
    fn test_zero_fuzz_rejected() {
        let config = DrawerConfig {
            fuzz_level: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_chunk_size_selection() {
        let config = DrawerConfig::default();
        assert_eq!(config.chunk_size(true, true), 2000);
        assert_eq!(config.chunk_size(false, true), 1000);
        assert_eq!(config.chunk_size(true, false), 500);
        assert_eq!(config.chunk_size(false, false), 200);
    }

    #[test]
    fn test_data_type_parse() {
        assert_eq!(DataType::from_str("VERY_LARGE"), DataType::VeryLarge);
        assert_eq!(DataType::from_str("bogus"), DataType::Normal);
        assert_eq!(DataType::SmallAndSimple.to_string(), "small_and_simple");
    }
}
