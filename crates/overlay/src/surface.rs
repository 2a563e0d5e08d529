//! The 2-D drawing surface interface and an in-memory recorder.

use serde::{Deserialize, Serialize};
use sky_common::Color;

/// A canvas-like target for overlay drawing. Coordinates are viewport
/// pixels with the origin at the top left.
///
/// Path calls accumulate geometry between [`begin_path`](Self::begin_path)
/// and [`draw_path`](Self::draw_path); the other calls draw immediately.
pub trait DrawSurface {
    fn width(&self) -> usize;
    fn height(&self) -> usize;

    /// Erase everything drawn so far.
    fn clear(&mut self);

    fn begin_path(&mut self, color: Color, line_width: u32);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn add_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn add_circle(&mut self, x: f64, y: f64, r: f64);
    /// Stroke the current path.
    fn draw_path(&mut self);

    fn draw_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Color, line_width: u32);
    fn draw_circle(&mut self, x: f64, y: f64, r: f64, color: Color, line_width: u32);
    fn draw_text(&mut self, x: f64, y: f64, text: &str, color: Color);
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Color);

    /// Whether batched path drawing is cheap on this surface; chooses the
    /// larger chunk sizes.
    fn is_optimized(&self) -> bool {
        true
    }
}

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SurfaceOp {
    Clear,
    BeginPath { color: Color, line_width: u32 },
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    AddRect { x: f64, y: f64, w: f64, h: f64 },
    AddCircle { x: f64, y: f64, r: f64 },
    DrawPath,
    DrawRect { x: f64, y: f64, w: f64, h: f64, color: Color, line_width: u32 },
    DrawCircle { x: f64, y: f64, r: f64, color: Color, line_width: u32 },
    DrawText { x: f64, y: f64, text: String, color: Color },
    FillRect { x: f64, y: f64, w: f64, h: f64, color: Color },
}

/// A surface that records every call, used for tests and for exporting a
/// draw list.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    width: usize,
    height: usize,
    optimized: bool,
    ops: Vec<SurfaceOp>,
}

impl RecordingSurface {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            optimized: true,
            ops: Vec::new(),
        }
    }

    /// A recorder that reports itself as unoptimized, so drawers pick the
    /// smaller chunk sizes.
    pub fn unoptimized(width: usize, height: usize) -> Self {
        Self {
            optimized: false,
            ..Self::new(width, height)
        }
    }

    /// Calls recorded since the last clear.
    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Number of calls that put pixels on the surface.
    pub fn draw_calls(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| {
                matches!(
                    op,
                    SurfaceOp::DrawPath
                        | SurfaceOp::DrawRect { .. }
                        | SurfaceOp::DrawCircle { .. }
                        | SurfaceOp::DrawText { .. }
                        | SurfaceOp::FillRect { .. }
                )
            })
            .count()
    }

    /// Number of paths begun.
    pub fn path_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, SurfaceOp::BeginPath { .. }))
            .count()
    }

    pub fn is_blank(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn take_ops(&mut self) -> Vec<SurfaceOp> {
        std::mem::take(&mut self.ops)
    }
}

impl DrawSurface for RecordingSurface {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn clear(&mut self) {
        self.ops.clear();
    }

    fn begin_path(&mut self, color: Color, line_width: u32) {
        self.ops.push(SurfaceOp::BeginPath { color, line_width });
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.ops.push(SurfaceOp::MoveTo { x, y });
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ops.push(SurfaceOp::LineTo { x, y });
    }

    fn add_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.ops.push(SurfaceOp::AddRect { x, y, w, h });
    }

    fn add_circle(&mut self, x: f64, y: f64, r: f64) {
        self.ops.push(SurfaceOp::AddCircle { x, y, r });
    }

    fn draw_path(&mut self) {
        self.ops.push(SurfaceOp::DrawPath);
    }

    fn draw_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Color, line_width: u32) {
        self.ops.push(SurfaceOp::DrawRect {
            x,
            y,
            w,
            h,
            color,
            line_width,
        });
    }

    fn draw_circle(&mut self, x: f64, y: f64, r: f64, color: Color, line_width: u32) {
        self.ops.push(SurfaceOp::DrawCircle {
            x,
            y,
            r,
            color,
            line_width,
        });
    }

    fn draw_text(&mut self, x: f64, y: f64, text: &str, color: Color) {
        self.ops.push(SurfaceOp::DrawText {
            x,
            y,
            text: text.to_string(),
            color,
        });
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Color) {
        self.ops.push(SurfaceOp::FillRect { x, y, w, h, color });
    }

    fn is_optimized(&self) -> bool {
        self.optimized
    }
}
