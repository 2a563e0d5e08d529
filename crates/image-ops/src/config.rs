//! Configuration for geometric resampling.

use serde::{Deserialize, Serialize};

use crate::interpolation::Interpolation;

fn default_blank() -> f32 {
    f32::NAN
}

fn is_nan(v: &f32) -> bool {
    v.is_nan()
}

/// Configuration for [`Geom`](crate::Geom).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeomConfig {
    /// Output pixels between exactly projected tie points.
    pub tie_skip: usize,

    /// Interpolation method for output pixels.
    pub interpolation: Interpolation,

    /// Minimum fraction of valid source weight for a bilinear sample.
    pub min_weight: f64,

    /// Value written to uncovered output pixels.
    #[serde(default = "default_blank", skip_serializing_if = "is_nan")]
    pub blank_value: f32,

    /// Largest allowed ratio of output to reference axis length.
    pub max_scale_change: usize,
}

impl Default for GeomConfig {
    fn default() -> Self {
        Self {
            tie_skip: 10,
            interpolation: Interpolation::Nearest,
            min_weight: 0.5,
            blank_value: f32::NAN,
            max_scale_change: 30,
        }
    }
}

impl GeomConfig {
    /// Load configuration from `GEOM_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("GEOM_TIE_SKIP") {
            if let Ok(skip) = val.parse() {
                config.tie_skip = skip;
            }
        }

        if let Ok(val) = std::env::var("GEOM_INTERPOLATION") {
            config.interpolation = Interpolation::from_str(&val);
        }

        if let Ok(val) = std::env::var("GEOM_MIN_WEIGHT") {
            if let Ok(weight) = val.parse() {
                config.min_weight = weight;
            }
        }

        if let Ok(val) = std::env::var("GEOM_BLANK_VALUE") {
            if let Ok(blank) = val.parse() {
                config.blank_value = blank;
            }
        }

        if let Ok(val) = std::env::var("GEOM_MAX_SCALE_CHANGE") {
            if let Ok(ratio) = val.parse() {
                config.max_scale_change = ratio;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.tie_skip == 0 {
            return Err("tie_skip must be > 0".to_string());
        }

        if !(self.min_weight > 0.0 && self.min_weight <= 1.0) {
            return Err("min_weight must be in (0, 1]".to_string());
        }

        if self.max_scale_change == 0 {
            return Err("max_scale_change must be > 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeomConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tie_skip, 10);
        assert!(config.blank_value.is_nan());
    }

    #[test]
    fn test_invalid_weight() {
        let config = GeomConfig {
            min_weight: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_without_blank_uses_nan() {
        let json = r#"{"tie_skip":5,"interpolation":"bilinear","min_weight":0.25,"max_scale_change":10}"#;
        let config: GeomConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.tie_skip, 5);
        assert_eq!(config.interpolation, Interpolation::Bilinear);
        assert!(config.blank_value.is_nan());
        assert!(!serde_json::to_string(&GeomConfig::default())
            .unwrap()
            .contains("blank_value"));
    }

    #[test]
    fn test_json_keeps_numeric_blank() {
        let config = GeomConfig {
            blank_value: -999.0,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"blank_value\":-999.0"), "{}", json);
        let back: GeomConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
