//! A [`DrawSurface`] backed by a tiny-skia pixmap.

use sky_common::Color;
use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};
use tracing::trace;

use crate::error::{DrawError, Result};
use crate::png::encode_png;
use crate::surface::DrawSurface;

/// Anti-aliased raster surface. Text is not rasterized.
pub struct PixmapSurface {
    pixmap: Pixmap,
    path: Option<PathBuilder>,
    path_color: Color,
    path_width: u32,
    skipped_text: usize,
}

impl PixmapSurface {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let pixmap = Pixmap::new(width as u32, height as u32).ok_or_else(|| {
            DrawError::surface(format!("cannot allocate {}x{} pixmap", width, height))
        })?;
        Ok(Self {
            pixmap,
            path: None,
            path_color: Color::RED,
            path_width: 1,
            skipped_text: 0,
        })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Straight-alpha color at (`x`, `y`), or None outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.pixmap.pixel(x, y).map(|p| {
            let c = p.demultiply();
            Color::new(c.red(), c.green(), c.blue(), c.alpha())
        })
    }

    /// Number of pixels with non-zero alpha.
    pub fn painted_pixels(&self) -> usize {
        self.pixmap.pixels().iter().filter(|p| p.alpha() > 0).count()
    }

    /// Text requests received and not rasterized.
    pub fn skipped_text(&self) -> usize {
        self.skipped_text
    }

    /// Straight-alpha RGBA bytes.
    pub fn to_rgba(&self) -> Vec<u8> {
        self.pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect()
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        encode_png(
            &self.to_rgba(),
            self.pixmap.width() as usize,
            self.pixmap.height() as usize,
        )
    }

    fn stroke_builder(&mut self, pb: PathBuilder, color: Color, width: u32) {
        if let Some(path) = pb.finish() {
            let paint = solid_paint(color);
            let stroke = Stroke {
                width: width.max(1) as f32,
                line_cap: LineCap::Round,
                line_join: LineJoin::Round,
                ..Stroke::default()
            };
            self.pixmap
                .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }
}

fn solid_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

impl DrawSurface for PixmapSurface {
    fn width(&self) -> usize {
        self.pixmap.width() as usize
    }

    fn height(&self) -> usize {
        self.pixmap.height() as usize
    }

    fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
        self.path = None;
    }

    fn begin_path(&mut self, color: Color, line_width: u32) {
        self.path = Some(PathBuilder::new());
        self.path_color = color;
        self.path_width = line_width;
    }

    fn move_to(&mut self, x: f64, y: f64) {
        if let Some(pb) = self.path.as_mut() {
            pb.move_to(x as f32, y as f32);
        }
    }

    fn line_to(&mut self, x: f64, y: f64) {
        if let Some(pb) = self.path.as_mut() {
            pb.line_to(x as f32, y as f32);
        }
    }

    fn add_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        if let (Some(pb), Some(rect)) = (
            self.path.as_mut(),
            Rect::from_xywh(x as f32, y as f32, w as f32, h as f32),
        ) {
            pb.push_rect(rect);
        }
    }

    fn add_circle(&mut self, x: f64, y: f64, r: f64) {
        if let Some(pb) = self.path.as_mut() {
            pb.push_circle(x as f32, y as f32, r as f32);
        }
    }

    fn draw_path(&mut self) {
        if let Some(pb) = self.path.take() {
            self.stroke_builder(pb, self.path_color, self.path_width);
        }
    }

    fn draw_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Color, line_width: u32) {
        if let Some(rect) = Rect::from_xywh(x as f32, y as f32, w as f32, h as f32) {
            let mut pb = PathBuilder::new();
            pb.push_rect(rect);
            self.stroke_builder(pb, color, line_width);
        }
    }

    fn draw_circle(&mut self, x: f64, y: f64, r: f64, color: Color, line_width: u32) {
        let mut pb = PathBuilder::new();
        pb.push_circle(x as f32, y as f32, r as f32);
        self.stroke_builder(pb, color, line_width);
    }

    fn draw_text(&mut self, x: f64, y: f64, text: &str, _color: Color) {
        trace!(x, y, text, "Text not rasterized");
        self.skipped_text += 1;
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Color) {
        if let Some(rect) = Rect::from_xywh(x as f32, y as f32, w as f32, h as f32) {
            self.pixmap
                .fill_rect(rect, &solid_paint(color), Transform::identity(), None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_rect_paints_pixels() {
        let mut s = PixmapSurface::new(20, 20).unwrap();
        s.fill_rect(5.0, 5.0, 4.0, 4.0, Color::RED);
        assert_eq!(s.pixel(6, 6), Some(Color::RED));
        assert_eq!(s.pixel(0, 0).map(|c| c.a), Some(0));
        assert_eq!(s.painted_pixels(), 16);
    }

    #[test]
    fn test_path_stroke_and_clear() {
        let mut s = PixmapSurface::new(20, 20).unwrap();
        s.begin_path(Color::WHITE, 2);
        s.move_to(2.0, 10.0);
        s.line_to(18.0, 10.0);
        s.draw_path();
        assert!(s.painted_pixels() > 10);
        s.clear();
        assert_eq!(s.painted_pixels(), 0);
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(PixmapSurface::new(0, 10).is_err());
    }

    #[test]
    fn test_png_output() {
        let mut s = PixmapSurface::new(8, 8).unwrap();
        s.draw_circle(4.0, 4.0, 2.0, Color::RED, 1);
        let png = s.encode_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
}
