//! Point types for the world, image, screen and viewport coordinate spaces.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::coord_sys::CoordSys;

/// A position on the sky, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldPt {
    pub lon: f64,
    pub lat: f64,
    #[serde(default)]
    pub csys: CoordSys,
}

impl WorldPt {
    /// Create an equatorial J2000 point.
    pub fn new(lon: f64, lat: f64) -> Self {
        Self {
            lon,
            lat,
            csys: CoordSys::EqJ2000,
        }
    }

    pub fn with_csys(lon: f64, lat: f64, csys: CoordSys) -> Self {
        Self { lon, lat, csys }
    }

    /// Longitude normalized into `[0, 360)`.
    pub fn normalized_lon(&self) -> f64 {
        self.lon.rem_euclid(360.0)
    }
}

impl fmt::Display for WorldPt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6};{:.6};{}", self.lon, self.lat, self.csys)
    }
}

/// Image pixel space. Pixel `i` covers `[i, i+1)`, the first pixel
/// center sits at 0.5.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ImagePt {
    pub x: f64,
    pub y: f64,
}

impl ImagePt {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Screen space: the zoomed image, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPt {
    pub x: f64,
    pub y: f64,
}

impl ScreenPt {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Viewport space: screen space relative to the visible window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewPortPt {
    pub x: f64,
    pub y: f64,
}

impl ViewPortPt {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Integer pixel column, truncated toward zero.
    pub fn ix(&self) -> i64 {
        self.x.trunc() as i64
    }

    /// Integer pixel row, truncated toward zero.
    pub fn iy(&self) -> i64 {
        self.y.trunc() as i64
    }
}

/// A point tagged with the space it lives in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Pt {
    World(WorldPt),
    Image(ImagePt),
    Screen(ScreenPt),
    ViewPort(ViewPortPt),
}

impl Pt {
    pub fn is_world(&self) -> bool {
        matches!(self, Pt::World(_))
    }

    pub fn as_world(&self) -> Option<&WorldPt> {
        match self {
            Pt::World(wp) => Some(wp),
            _ => None,
        }
    }

    /// Shift the point by a screen-space offset. World points are
    /// returned unchanged since their offset depends on the projection.
    pub fn offset(&self, dx: f64, dy: f64) -> Pt {
        match *self {
            Pt::Screen(p) => Pt::Screen(ScreenPt::new(p.x + dx, p.y + dy)),
            Pt::ViewPort(p) => Pt::ViewPort(ViewPortPt::new(p.x + dx, p.y + dy)),
            Pt::Image(p) => Pt::Image(ImagePt::new(p.x + dx, p.y - dy)),
            Pt::World(_) => *self,
        }
    }
}

impl From<WorldPt> for Pt {
    fn from(p: WorldPt) -> Self {
        Pt::World(p)
    }
}

impl From<ImagePt> for Pt {
    fn from(p: ImagePt) -> Self {
        Pt::Image(p)
    }
}

impl From<ScreenPt> for Pt {
    fn from(p: ScreenPt) -> Self {
        Pt::Screen(p)
    }
}

impl From<ViewPortPt> for Pt {
    fn from(p: ViewPortPt) -> Self {
        Pt::ViewPort(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_lon() {
        assert!((WorldPt::new(-10.0, 0.0).normalized_lon() - 350.0).abs() < 1e-12);
        assert!((WorldPt::new(370.0, 0.0).normalized_lon() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_pt_serde_tagged() {
        let pt = Pt::World(WorldPt::new(10.5, -20.25));
        let json = serde_json::to_string(&pt).unwrap();
        assert!(json.contains("\"type\":\"world\""));
        let back: Pt = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pt);
    }

    #[test]
    fn test_world_pt_default_csys() {
        let p: WorldPt = serde_json::from_str(r#"{"lon": 1.0, "lat": 2.0}"#).unwrap();
        assert_eq!(p.csys, CoordSys::EqJ2000);
    }

    #[test]
    fn test_viewport_truncation() {
        let p = ViewPortPt::new(12.9, -0.5);
        assert_eq!(p.ix(), 12);
        assert_eq!(p.iy(), 0);
    }

    #[test]
    fn test_offset_screen() {
        let p = Pt::Screen(ScreenPt::new(1.0, 2.0)).offset(3.0, 4.0);
        assert_eq!(p, Pt::Screen(ScreenPt::new(4.0, 6.0)));
    }
}
