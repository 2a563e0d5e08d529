//! Celestial and pixel coordinate systems.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SkyError;

/// Coordinate systems a point can be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CoordSys {
    /// Equatorial, J2000 equinox (RA/Dec in degrees)
    #[default]
    EqJ2000,
    /// Galactic (l/b in degrees)
    Galactic,
    /// Ecliptic, J2000 equinox
    EclJ2000,
    /// Image pixel coordinates
    Pixel,
    /// Screen pixel coordinates
    ScreenPixel,
}

impl CoordSys {
    /// Parse a coordinate system name.
    ///
    /// Accepts formats like:
    /// - "EQ_J2000", "J2000", "ICRS", "FK5"
    /// - "GALACTIC", "GAL"
    /// - "EC_J2000", "ECLIPTIC"
    pub fn parse(s: &str) -> Result<Self, SkyError> {
        let normalized = s.trim().to_uppercase();

        match normalized.as_str() {
            "EQ_J2000" | "J2000" | "ICRS" | "FK5" => Ok(CoordSys::EqJ2000),
            "GALACTIC" | "GAL" => Ok(CoordSys::Galactic),
            "EC_J2000" | "ECL_J2000" | "ECLIPTIC" => Ok(CoordSys::EclJ2000),
            "PIXEL" | "IMAGE" => Ok(CoordSys::Pixel),
            "SCREEN_PIXEL" | "SCREEN" => Ok(CoordSys::ScreenPixel),
            _ => Err(SkyError::InvalidCoordSys(s.to_string())),
        }
    }

    /// Derive the sky system from a FITS `CTYPE1` value such as `RA---TAN`.
    pub fn from_ctype(ctype1: &str) -> Self {
        let upper = ctype1.to_uppercase();
        if upper.starts_with("GLON") {
            CoordSys::Galactic
        } else if upper.starts_with("ELON") {
            CoordSys::EclJ2000
        } else {
            CoordSys::EqJ2000
        }
    }

    /// True for systems that describe positions on the sky.
    pub fn is_celestial(&self) -> bool {
        matches!(self, CoordSys::EqJ2000 | CoordSys::Galactic | CoordSys::EclJ2000)
    }

    /// FITS `CTYPE` axis prefixes (longitude, latitude) for this system.
    pub fn ctype_prefixes(&self) -> (&'static str, &'static str) {
        match self {
            CoordSys::Galactic => ("GLON", "GLAT"),
            CoordSys::EclJ2000 => ("ELON", "ELAT"),
            _ => ("RA--", "DEC-"),
        }
    }
}

impl fmt::Display for CoordSys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoordSys::EqJ2000 => "EQ_J2000",
            CoordSys::Galactic => "GALACTIC",
            CoordSys::EclJ2000 => "EC_J2000",
            CoordSys::Pixel => "PIXEL",
            CoordSys::ScreenPixel => "SCREEN_PIXEL",
        };
        write!(f, "{}", name)
    }
}
