//! The current pan/zoom state of a displayed image.

use serde::{Deserialize, Serialize};

use crate::point::ScreenPt;

/// The visible window, positioned in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewPort {
    /// Screen x of the viewport's top-left corner
    pub x: f64,
    /// Screen y of the viewport's top-left corner
    pub y: f64,
    pub width: usize,
    pub height: usize,
}

impl ViewPort {
    pub fn new(x: f64, y: f64, width: usize, height: usize) -> Self {
        Self { x, y, width, height }
    }

    pub fn dim(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}

/// Viewport, zoom and image size. Read-only to the drawing code; a change
/// triggers a full redraw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub viewport: ViewPort,
    pub zoom_factor: f64,
    /// Image width in pixels
    pub data_width: usize,
    /// Image height in pixels
    pub data_height: usize,
}

impl ViewState {
    pub fn new(viewport: ViewPort, zoom_factor: f64, data_width: usize, data_height: usize) -> Self {
        Self {
            viewport,
            zoom_factor,
            data_width,
            data_height,
        }
    }

    /// A view showing the whole image at `zoom_factor`, scrolled to the origin.
    pub fn fit(data_width: usize, data_height: usize, zoom_factor: f64) -> Self {
        let width = (data_width as f64 * zoom_factor).ceil() as usize;
        let height = (data_height as f64 * zoom_factor).ceil() as usize;
        Self::new(
            ViewPort::new(0.0, 0.0, width, height),
            zoom_factor,
            data_width,
            data_height,
        )
    }

    /// Screen position of viewport point (0,0).
    pub fn viewport_origin(&self) -> ScreenPt {
        ScreenPt::new(self.viewport.x, self.viewport.y)
    }

    /// Scroll so that the viewport's top-left corner sits at (`x`, `y`).
    pub fn scrolled_to(&self, x: f64, y: f64) -> Self {
        let mut next = *self;
        next.viewport.x = x;
        next.viewport.y = y;
        next
    }

    pub fn zoomed(&self, zoom_factor: f64) -> Self {
        let mut next = *self;
        next.zoom_factor = zoom_factor;
        next
    }

    pub fn screen_width(&self) -> f64 {
        self.data_width as f64 * self.zoom_factor
    }

    pub fn screen_height(&self) -> f64 {
        self.data_height as f64 * self.zoom_factor
    }
}
