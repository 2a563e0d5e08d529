//! Renders a single overlay object onto a [`DrawSurface`].

use projection::CoordConverter;
use sky_common::{Color, Pt, ViewPortPt};

use crate::shape::{DrawSymbol, OverlayObject, Shape, SizeUnit};
use crate::surface::DrawSurface;

/// Segments used to approximate an ellipse.
const ELLIPSE_SEGMENTS: usize = 36;

/// Viewport position of a point, running the cheap rough-guess reject
/// first for world points.
pub fn viewport_point(cc: &CoordConverter, pt: &Pt) -> Option<ViewPortPt> {
    if let Pt::World(wp) = pt {
        if !cc.point_in_plot_rough_guess(wp) {
            return None;
        }
    }
    cc.to_viewport(pt)
}

/// Draw `obj` in `color`. With `only_add_to_path` the geometry is appended
/// to the surface's current path and nothing is stroked; the caller owns
/// `begin_path`/`draw_path`.
///
/// Returns false when the object could not be placed (a conversion
/// failed), in which case nothing was drawn.
pub fn draw_object<S: DrawSurface + ?Sized>(
    surface: &mut S,
    cc: &CoordConverter,
    obj: &OverlayObject,
    color: Color,
    only_add_to_path: bool,
) -> bool {
    let (tx, ty) = obj.translation.unwrap_or((0.0, 0.0));
    if !only_add_to_path {
        if let Some(shadow) = obj.shadow {
            render(surface, cc, obj, shadow.color, tx + shadow.dx, ty + shadow.dy, false);
        }
    }
    render(surface, cc, obj, color, tx, ty, only_add_to_path)
}

fn render<S: DrawSurface + ?Sized>(
    surface: &mut S,
    cc: &CoordConverter,
    obj: &OverlayObject,
    color: Color,
    dx: f64,
    dy: f64,
    only_add_to_path: bool,
) -> bool {
    let Some(center) = viewport_point(cc, &obj.center) else {
        return false;
    };
    let (x, y) = (center.x + dx, center.y + dy);
    let width = obj.line_width;

    match &obj.shape {
        Shape::Point { symbol, size } => {
            let s = *size as f64;
            if only_add_to_path {
                trace_symbol(surface, *symbol, x, y, s);
                return true;
            }
            match symbol {
                DrawSymbol::Dot => {
                    let half = (s / 2.0).max(1.0);
                    surface.fill_rect(x - half, y - half, 2.0 * half, 2.0 * half, color);
                }
                DrawSymbol::EmpCross => {
                    surface.begin_path(Color::WHITE, width + 2);
                    trace_symbol(surface, DrawSymbol::Cross, x, y, s + 1.0);
                    surface.draw_path();
                    surface.begin_path(color, width);
                    trace_symbol(surface, DrawSymbol::Cross, x, y, s);
                    surface.draw_path();
                }
                _ => {
                    surface.begin_path(color, width);
                    trace_symbol(surface, *symbol, x, y, s);
                    surface.draw_path();
                }
            }
        }
        Shape::Line { to } => {
            if let (Pt::World(a), Pt::World(b)) = (&obj.center, to) {
                if cc.coords_wrap(a, b) {
                    return false;
                }
            }
            let Some(end) = viewport_point(cc, to) else {
                return false;
            };
            surface.begin_path(color, width);
            surface.move_to(x, y);
            surface.line_to(end.x + dx, end.y + dy);
            surface.draw_path();
        }
        Shape::Circle { radius, unit } => {
            let r = screen_length(cc, *radius, *unit);
            surface.draw_circle(x, y, r, color, width);
        }
        Shape::Rectangle {
            width: w,
            height: h,
            unit,
        } => {
            let w = screen_length(cc, *w, *unit);
            let h = screen_length(cc, *h, *unit);
            if obj.rotation == 0.0 {
                surface.draw_rect(x - w / 2.0, y - h / 2.0, w, h, color, width);
            } else {
                let corners = [(-w, -h), (w, -h), (w, h), (-w, h)]
                    .map(|(cx, cy)| rotate_offset(cx / 2.0, cy / 2.0, obj.rotation));
                surface.begin_path(color, width);
                surface.move_to(x + corners[0].0, y + corners[0].1);
                for (cx, cy) in &corners[1..] {
                    surface.line_to(x + cx, y + cy);
                }
                surface.line_to(x + corners[0].0, y + corners[0].1);
                surface.draw_path();
            }
        }
        Shape::Ellipse { r1, r2, angle, unit } => {
            let a = screen_length(cc, *r1, *unit);
            let b = screen_length(cc, *r2, *unit);
            let angle = angle + obj.rotation;
            surface.begin_path(color, width);
            for i in 0..=ELLIPSE_SEGMENTS {
                let t = i as f64 * std::f64::consts::TAU / ELLIPSE_SEGMENTS as f64;
                let (ox, oy) = rotate_offset(a * t.cos(), b * t.sin(), angle);
                if i == 0 {
                    surface.move_to(x + ox, y + oy);
                } else {
                    surface.line_to(x + ox, y + oy);
                }
            }
            surface.draw_path();
        }
        Shape::Footprint(vertices) => {
            if vertices.len() < 2 {
                return false;
            }
            let mut placed = Vec::with_capacity(vertices.len());
            for v in vertices {
                match viewport_point(cc, v) {
                    Some(vp) => placed.push(vp),
                    None => return false,
                }
            }
            surface.begin_path(color, width);
            surface.move_to(placed[0].x + dx, placed[0].y + dy);
            let n = vertices.len();
            for k in 1..=n {
                let (prev, cur) = (k - 1, k % n);
                let wraps = match (&vertices[prev], &vertices[cur]) {
                    (Pt::World(a), Pt::World(b)) => cc.coords_wrap(a, b),
                    _ => false,
                };
                let p = placed[cur];
                if wraps {
                    surface.move_to(p.x + dx, p.y + dy);
                } else {
                    surface.line_to(p.x + dx, p.y + dy);
                }
            }
            surface.draw_path();
        }
        Shape::Text { text } => {
            surface.draw_text(x, y, text, color);
        }
    }
    true
}

/// Append a point symbol of half-size `s` centered on (`x`, `y`) to the
/// current path.
pub fn trace_symbol<S: DrawSurface + ?Sized>(
    surface: &mut S,
    symbol: DrawSymbol,
    x: f64,
    y: f64,
    s: f64,
) {
    match symbol {
        DrawSymbol::X => {
            surface.move_to(x - s, y - s);
            surface.line_to(x + s, y + s);
            surface.move_to(x - s, y + s);
            surface.line_to(x + s, y - s);
        }
        DrawSymbol::Cross | DrawSymbol::EmpCross => {
            surface.move_to(x - s, y);
            surface.line_to(x + s, y);
            surface.move_to(x, y - s);
            surface.line_to(x, y + s);
        }
        DrawSymbol::Square => surface.add_rect(x - s, y - s, 2.0 * s, 2.0 * s),
        DrawSymbol::SquareX => {
            surface.add_rect(x - s, y - s, 2.0 * s, 2.0 * s);
            trace_symbol(surface, DrawSymbol::X, x, y, s);
        }
        DrawSymbol::Diamond => {
            surface.move_to(x, y - s);
            surface.line_to(x + s, y);
            surface.line_to(x, y + s);
            surface.line_to(x - s, y);
            surface.line_to(x, y - s);
        }
        DrawSymbol::Dot => {
            let half = (s / 2.0).max(1.0);
            surface.add_rect(x - half, y - half, 2.0 * half, 2.0 * half);
        }
        DrawSymbol::Circle => surface.add_circle(x, y, s),
        DrawSymbol::BoxCircle => {
            surface.add_rect(x - s, y - s, 2.0 * s, 2.0 * s);
            surface.add_circle(x, y, s / 2.0);
        }
        DrawSymbol::Arrow => {
            surface.move_to(x - 2.0 * s, y + 2.0 * s);
            surface.line_to(x, y);
            surface.line_to(x - s, y);
            surface.move_to(x, y);
            surface.line_to(x, y + s);
        }
        DrawSymbol::PointMarker => {
            let gap = s / 2.0;
            surface.move_to(x - s, y);
            surface.line_to(x - gap, y);
            surface.move_to(x + gap, y);
            surface.line_to(x + s, y);
            surface.move_to(x, y - s);
            surface.line_to(x, y - gap);
            surface.move_to(x, y + gap);
            surface.line_to(x, y + s);
        }
    }
}

/// Convert a shape dimension to screen pixels.
pub fn screen_length(cc: &CoordConverter, value: f64, unit: SizeUnit) -> f64 {
    match unit {
        SizeUnit::Pixel => value,
        SizeUnit::ImagePixel => value * cc.zoom_factor(),
        SizeUnit::Arcsec => {
            value / 3600.0 / cc.projection().pixel_scale_deg() * cc.zoom_factor()
        }
    }
}

/// Rotate a screen offset counter-clockwise (as seen on screen) by
/// `angle_deg`. Screen y grows downward.
fn rotate_offset(ox: f64, oy: f64, angle_deg: f64) -> (f64, f64) {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    (ox * cos + oy * sin, -ox * sin + oy * cos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{RecordingSurface, SurfaceOp};

    #[test]
    fn test_trace_x_is_two_strokes() {
        let mut s = RecordingSurface::new(10, 10);
        trace_symbol(&mut s, DrawSymbol::X, 5.0, 5.0, 2.0);
        assert_eq!(
            s.ops(),
            &[
                SurfaceOp::MoveTo { x: 3.0, y: 3.0 },
                SurfaceOp::LineTo { x: 7.0, y: 7.0 },
                SurfaceOp::MoveTo { x: 3.0, y: 7.0 },
                SurfaceOp::LineTo { x: 7.0, y: 3.0 },
            ]
        );
    }

    #[test]
    fn test_rotate_offset_quarter_turn() {
        let (x, y) = rotate_offset(1.0, 0.0, 90.0);
        assert!(x.abs() < 1e-12);
        assert!((y + 1.0).abs() < 1e-12);
    }
}
