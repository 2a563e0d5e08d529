//! Overlay objects: the drawable primitives placed over an image.

use serde::{Deserialize, Serialize};
use sky_common::{Color, Pt};

/// Color used for selected objects on the select layer.
pub const SELECTED_COLOR: Color = Color::rgb(255, 165, 0);

/// Color used for the highlighted object.
pub const HIGHLIGHT_COLOR: Color = Color::rgb(0, 170, 255);

/// Marker drawn for a point object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawSymbol {
    #[default]
    X,
    Cross,
    Square,
    SquareX,
    Diamond,
    Dot,
    Circle,
    BoxCircle,
    Arrow,
    PointMarker,
    EmpCross,
}

impl DrawSymbol {
    /// Parse from string (case-insensitive), falling back to `X`.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "cross" => Self::Cross,
            "square" => Self::Square,
            "square_x" | "squarex" => Self::SquareX,
            "diamond" => Self::Diamond,
            "dot" => Self::Dot,
            "circle" => Self::Circle,
            "box_circle" | "boxcircle" => Self::BoxCircle,
            "arrow" => Self::Arrow,
            "point_marker" | "pointmarker" => Self::PointMarker,
            "emp_cross" | "empcross" => Self::EmpCross,
            _ => Self::X,
        }
    }

    /// Whether many markers of this symbol can be batched into one stroked
    /// path. `EmpCross` uses two colors so it cannot.
    pub fn path_optimizable(&self) -> bool {
        !matches!(self, Self::EmpCross)
    }
}

/// Unit of a shape dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeUnit {
    /// Screen pixels, independent of zoom.
    #[default]
    Pixel,
    /// Image pixels, scaled by zoom.
    ImagePixel,
    /// Arc seconds on the sky.
    Arcsec,
}

/// Geometry of an overlay object, anchored at the object's center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params", rename_all = "snake_case")]
pub enum Shape {
    Point {
        symbol: DrawSymbol,
        size: u32,
    },
    Line {
        to: Pt,
    },
    Circle {
        radius: f64,
        #[serde(default)]
        unit: SizeUnit,
    },
    Rectangle {
        width: f64,
        height: f64,
        #[serde(default)]
        unit: SizeUnit,
    },
    Ellipse {
        r1: f64,
        r2: f64,
        /// Position angle in degrees.
        angle: f64,
        #[serde(default)]
        unit: SizeUnit,
    },
    /// Closed polygon through the given vertices.
    Footprint(Vec<Pt>),
    Text {
        text: String,
    },
}

impl Shape {
    pub fn is_point(&self) -> bool {
        matches!(self, Shape::Point { .. })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Point { .. } => "point",
            Shape::Line { .. } => "line",
            Shape::Circle { .. } => "circle",
            Shape::Rectangle { .. } => "rectangle",
            Shape::Ellipse { .. } => "ellipse",
            Shape::Footprint(_) => "footprint",
            Shape::Text { .. } => "text",
        }
    }
}

/// Screen-space shadow drawn under an object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    pub dx: f64,
    pub dy: f64,
    pub color: Color,
}

/// A drawable primitive with its styling and selection state.
///
/// `represent_count` is the number of input objects this one stands in for
/// once decimation has merged neighbours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayObject {
    pub center: Pt,
    pub shape: Shape,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub highlighted: bool,
    #[serde(default = "default_represent_count")]
    pub represent_count: u32,
    #[serde(default = "default_line_width")]
    pub line_width: u32,
    /// Rotation in degrees, applied to rectangles and ellipses.
    #[serde(default)]
    pub rotation: f64,
    /// Screen-pixel translation applied after projection.
    #[serde(default)]
    pub translation: Option<(f64, f64)>,
    #[serde(default)]
    pub shadow: Option<Shadow>,
}

fn default_represent_count() -> u32 {
    1
}

fn default_line_width() -> u32 {
    1
}

impl OverlayObject {
    pub fn new(center: impl Into<Pt>, shape: Shape) -> Self {
        Self {
            center: center.into(),
            shape,
            color: None,
            selected: false,
            highlighted: false,
            represent_count: 1,
            line_width: 1,
            rotation: 0.0,
            translation: None,
            shadow: None,
        }
    }

    /// A point marker.
    pub fn point(center: impl Into<Pt>, symbol: DrawSymbol, size: u32) -> Self {
        Self::new(center, Shape::Point { symbol, size })
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_line_width(mut self, width: u32) -> Self {
        self.line_width = width;
        self
    }

    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn is_point(&self) -> bool {
        self.shape.is_point()
    }

    /// Only point markers may be duplicated into density-colored
    /// representatives.
    pub fn supports_duplicate(&self) -> bool {
        self.is_point()
    }

    /// Whether this object can be appended to a shared path instead of
    /// being stroked on its own.
    pub fn can_use_path_optimization(&self) -> bool {
        match &self.shape {
            Shape::Point { symbol, .. } => symbol.path_optimizable() && self.shadow.is_none(),
            _ => false,
        }
    }

    /// Color to draw with. With `use_state_color` the highlight and
    /// selection colors take precedence over the object's own color.
    pub fn display_color(&self, default: Color, use_state_color: bool) -> Color {
        if use_state_color {
            if self.highlighted {
                return HIGHLIGHT_COLOR;
            }
            if self.selected {
                return SELECTED_COLOR;
            }
        }
        self.color.unwrap_or(default)
    }
}

/// Line drawn between consecutive objects, for tracks and light curves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default = "default_line_width")]
    pub line_width: u32,
}

impl Default for Connector {
    fn default() -> Self {
        Self {
            color: None,
            line_width: 1,
        }
    }
}
