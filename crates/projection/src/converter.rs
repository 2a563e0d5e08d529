//! Conversions between world, image, screen and viewport coordinates for
//! a displayed image.
//!
//! Image space puts pixel `i` on `[i, i+1)`; screen space is the zoomed
//! image with y flipped (origin top-left); viewport space is screen space
//! minus the viewport origin.

use std::sync::Arc;

use sky_common::{CoordSys, ImagePt, Pt, ScreenPt, ViewPortPt, ViewState, WorldPt};

use crate::celestial;
use crate::spherical::angular_distance;
use crate::wcs::Projection;

/// Image-to-world distance ratio above which a pair is considered to
/// straddle the longitude seam.
const WRAP_RATIO: f64 = 3.0;

/// Coarse equatorial bounds of the image used to discard far-away points
/// without running the full projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoughBounds {
    pub min_ra: f64,
    pub max_ra: f64,
    pub min_dec: f64,
    pub max_dec: f64,
    pub wraps_ra: bool,
    pub north_pole: bool,
    pub south_pole: bool,
}

impl RoughBounds {
    /// Bounds from the image corners, padded by half the viewport size.
    /// Returns None if a corner does not project.
    pub fn compute(projection: &Projection, view: &ViewState) -> Option<Self> {
        let (w, h) = (view.data_width as f64, view.data_height as f64);
        let mut min_ra = f64::MAX;
        let mut max_ra = f64::MIN;
        let mut min_dec = f64::MAX;
        let mut max_dec = f64::MIN;

        for (x, y) in [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)] {
            let wp = projection.pixel_to_world(x - 0.5, y - 0.5)?;
            let wp = celestial::convert(&wp, CoordSys::EqJ2000)?;
            min_ra = min_ra.min(wp.lon);
            max_ra = max_ra.max(wp.lon);
            min_dec = min_dec.min(wp.lat);
            max_dec = max_dec.max(wp.lat);
        }

        let scale = projection.pixel_scale_deg();
        let w_pad = (view.viewport.width / 2) as f64 * scale;
        let h_pad = (view.viewport.height / 2) as f64 * scale;
        min_ra -= w_pad;
        max_ra += w_pad;
        min_dec -= h_pad;
        max_dec += h_pad;

        let image_size = scale * w.max(h);
        Some(Self {
            min_ra,
            max_ra,
            min_dec,
            max_dec,
            wraps_ra: max_ra - min_ra > 90.0,
            north_pole: min_dec > 90.0 - 2.0 * image_size,
            south_pole: max_dec < -90.0 + 2.0 * image_size,
        })
    }

    /// False when the equatorial point is certainly outside the image.
    pub fn might_contain(&self, ra: f64, dec: f64) -> bool {
        if self.north_pole {
            dec > self.min_dec
        } else if self.south_pole {
            dec < self.max_dec
        } else if self.wraps_ra {
            dec > self.min_dec && dec < self.max_dec && (ra > self.max_ra || ra < self.min_ra)
        } else {
            ra > self.min_ra && dec > self.min_dec && ra < self.max_ra && dec < self.max_dec
        }
    }
}

/// Converts points for one image under one view state.
#[derive(Debug, Clone)]
pub struct CoordConverter {
    view: ViewState,
    projection: Arc<Projection>,
    rough: Option<RoughBounds>,
}

impl CoordConverter {
    pub fn new(view: ViewState, projection: Arc<Projection>) -> Self {
        let rough = if projection.is_wrapping() {
            None
        } else {
            RoughBounds::compute(&projection, &view)
        };
        Self {
            view,
            projection,
            rough,
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn projection(&self) -> &Arc<Projection> {
        &self.projection
    }

    pub fn zoom_factor(&self) -> f64 {
        self.view.zoom_factor
    }

    // ------------------------------------------------------------------
    // World <-> image
    // ------------------------------------------------------------------

    pub fn world_to_image(&self, wp: &WorldPt) -> Option<ImagePt> {
        let (x, y) = self.projection.world_to_pixel(wp)?;
        Some(ImagePt::new(x + 0.5, y + 0.5))
    }

    pub fn image_to_world(&self, ip: &ImagePt) -> Option<WorldPt> {
        self.projection.pixel_to_world(ip.x - 0.5, ip.y - 0.5)
    }

    // ------------------------------------------------------------------
    // Image <-> screen <-> viewport
    // ------------------------------------------------------------------

    pub fn image_to_screen(&self, ip: &ImagePt) -> ScreenPt {
        let zoom = self.view.zoom_factor;
        ScreenPt::new(
            (ip.x * zoom).floor(),
            ((self.view.data_height as f64 - ip.y) * zoom).floor(),
        )
    }

    pub fn screen_to_image(&self, sp: &ScreenPt) -> ImagePt {
        let zoom = self.view.zoom_factor;
        ImagePt::new(sp.x / zoom, self.view.data_height as f64 - sp.y / zoom)
    }

    pub fn screen_to_viewport(&self, sp: &ScreenPt) -> ViewPortPt {
        ViewPortPt::new(sp.x - self.view.viewport.x, sp.y - self.view.viewport.y)
    }

    pub fn viewport_to_screen(&self, vp: &ViewPortPt) -> ScreenPt {
        ScreenPt::new(vp.x + self.view.viewport.x, vp.y + self.view.viewport.y)
    }

    // ------------------------------------------------------------------
    // Tagged points
    // ------------------------------------------------------------------

    pub fn to_image(&self, pt: &Pt) -> Option<ImagePt> {
        match pt {
            Pt::World(wp) => self.world_to_image(wp),
            Pt::Image(ip) => Some(*ip),
            Pt::Screen(sp) => Some(self.screen_to_image(sp)),
            Pt::ViewPort(vp) => Some(self.screen_to_image(&self.viewport_to_screen(vp))),
        }
    }

    pub fn to_screen(&self, pt: &Pt) -> Option<ScreenPt> {
        match pt {
            Pt::Screen(sp) => Some(*sp),
            Pt::ViewPort(vp) => Some(self.viewport_to_screen(vp)),
            _ => self.to_image(pt).map(|ip| self.image_to_screen(&ip)),
        }
    }

    pub fn to_viewport(&self, pt: &Pt) -> Option<ViewPortPt> {
        match pt {
            Pt::ViewPort(vp) => Some(*vp),
            _ => self.to_screen(pt).map(|sp| self.screen_to_viewport(&sp)),
        }
    }

    pub fn to_world(&self, pt: &Pt) -> Option<WorldPt> {
        match pt {
            Pt::World(wp) => Some(*wp),
            _ => self.to_image(pt).and_then(|ip| self.image_to_world(&ip)),
        }
    }

    // ------------------------------------------------------------------
    // Containment and wrap tests
    // ------------------------------------------------------------------

    /// Cheap pre-filter before an exact projection. Returns false only when
    /// the point is certainly outside the image; always true for wrapping
    /// projections or when the image bounds are unknown.
    pub fn point_in_plot_rough_guess(&self, wp: &WorldPt) -> bool {
        let Some(rough) = &self.rough else {
            return true;
        };
        match celestial::convert(wp, CoordSys::EqJ2000) {
            Some(eq) => rough.might_contain(eq.lon, eq.lat),
            None => false,
        }
    }

    /// True when the point falls on the image data.
    pub fn point_in_data(&self, pt: &Pt) -> bool {
        if let Pt::World(wp) = pt {
            if !self.point_in_plot_rough_guess(wp) {
                return false;
            }
        }
        match self.to_image(pt) {
            Some(ip) => {
                ip.x >= 0.0
                    && ip.y >= 0.0
                    && ip.x <= self.view.data_width as f64
                    && ip.y <= self.view.data_height as f64
            }
            None => false,
        }
    }

    /// True when the point lands inside the viewport.
    pub fn point_in_viewport(&self, pt: &Pt) -> bool {
        if let Pt::World(wp) = pt {
            if !self.point_in_plot_rough_guess(wp) {
                return false;
            }
        }
        match self.to_viewport(pt) {
            Some(vp) => {
                vp.x >= 0.0
                    && vp.y >= 0.0
                    && vp.x <= self.view.viewport.width as f64
                    && vp.y <= self.view.viewport.height as f64
            }
            None => false,
        }
    }

    /// True when a segment between the two points crosses the longitude
    /// seam of a wrapping projection, so drawing it straight would produce
    /// a spurious line across the image.
    pub fn coords_wrap(&self, a: &WorldPt, b: &WorldPt) -> bool {
        if !self.projection.is_wrapping() {
            return false;
        }
        let Some(b_conv) = celestial::convert(b, a.csys) else {
            return false;
        };
        let world_dist = angular_distance(a.lon, a.lat, b_conv.lon, b_conv.lat);
        let expected_pixels = world_dist / self.projection.pixel_scale_deg();

        match (self.world_to_image(a), self.world_to_image(b)) {
            (Some(ia), Some(ib)) => {
                let image_dist = (ia.x - ib.x).hypot(ia.y - ib.y);
                image_dist / expected_pixels > WRAP_RATIO
            }
            _ => false,
        }
    }
}
