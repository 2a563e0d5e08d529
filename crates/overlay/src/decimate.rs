//! Decimation: reduce a dense set of overlay objects to one representative
//! per screen bucket.
//!
//! The viewport is divided into `fuzz_level`-pixel buckets. The first
//! object landing in a bucket becomes its representative and every later
//! one adds its weight to the representative's `represent_count`. Sparse
//! views (fewer than `literal_threshold` objects in the viewport) skip the
//! merge and return the objects themselves.

use std::sync::Arc;

use projection::CoordConverter;
use sky_common::Color;
use tracing::debug;

use crate::colormap::{band_index, simple_color_map};
use crate::config::DrawerConfig;
use crate::paint::viewport_point;
use crate::shape::OverlayObject;

const EMPTY: u32 = u32::MAX;

/// Inputs to one decimation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DecimateParams {
    /// Inputs at or below this size are returned unchanged.
    pub threshold: usize,
    pub fuzz_level: usize,
    pub literal_threshold: usize,
    /// Number of density color bands, or None for no color map.
    pub colormap_size: Option<usize>,
    /// Base color of the density map.
    pub color: Color,
}

impl DecimateParams {
    pub fn from_config(config: &DrawerConfig, use_colormap: bool) -> Self {
        Self {
            threshold: config.decimation_threshold,
            fuzz_level: config.fuzz_level.max(1),
            literal_threshold: config.literal_threshold,
            colormap_size: use_colormap.then_some(config.colormap_size),
            color: config.default_color,
        }
    }
}

/// Round `i` up to the next multiple of `fuzz`, keeping the result below
/// `max`.
pub fn next_pt(i: usize, fuzz: usize, max: usize) -> usize {
    let rem = i % fuzz;
    let ret = if rem == 0 { i } else { i + (fuzz - rem) };
    ret.min(max.saturating_sub(1))
}

/// Decimate `objects` against the current view.
///
/// Objects that fail to convert or fall outside the viewport are dropped.
/// The summed `represent_count` of the output equals the number of
/// in-viewport inputs when every input counts as one.
pub fn decimate(
    objects: &[OverlayObject],
    cc: &CoordConverter,
    params: &DecimateParams,
) -> Vec<OverlayObject> {
    if objects.len() <= params.threshold {
        return objects.to_vec();
    }

    let (width, height) = cc.view().viewport.dim();
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let fuzz = params.fuzz_level.max(1);
    let use_colormap = params.colormap_size.is_some() && objects[0].supports_duplicate();

    let mut grid = vec![EMPTY; width * height];
    let mut reps: Vec<OverlayObject> = Vec::new();
    let mut literal: Vec<OverlayObject> = Vec::with_capacity(params.literal_threshold);
    let mut in_viewport = 0usize;
    let mut max_entry = 0u32;

    for obj in objects {
        let Some(vp) = viewport_point(cc, &obj.center) else {
            continue;
        };
        if vp.x < 0.0 || vp.y < 0.0 {
            continue;
        }
        let (ix, iy) = (vp.ix() as usize, vp.iy() as usize);
        if ix >= width || iy >= height {
            continue;
        }

        let i = next_pt(ix, fuzz, width);
        let j = next_pt(iy, fuzz, height);
        let cell = i * height + j;
        let weight = obj.represent_count.max(1);

        let entry = match grid[cell] {
            EMPTY => {
                let mut rep = obj.clone();
                rep.represent_count = weight;
                grid[cell] = reps.len() as u32;
                reps.push(rep);
                weight
            }
            idx => {
                let rep = &mut reps[idx as usize];
                rep.represent_count += weight;
                rep.represent_count
            }
        };
        max_entry = max_entry.max(entry);

        if in_viewport < params.literal_threshold {
            literal.push(obj.clone());
        }
        in_viewport += 1;
    }

    let mut out = if in_viewport < params.literal_threshold {
        literal
    } else {
        // column-major bucket order
        let mut ordered = Vec::with_capacity(reps.len());
        let mut slots: Vec<Option<OverlayObject>> = reps.into_iter().map(Some).collect();
        for idx in grid.into_iter().filter(|&idx| idx != EMPTY) {
            if let Some(rep) = slots[idx as usize].take() {
                ordered.push(rep);
            }
        }
        ordered
    };

    if use_colormap {
        if let Some(size) = params.colormap_size {
            let palette = simple_color_map(params.color, (max_entry as usize).min(size));
            assign_density_colors(&mut out, &palette, max_entry);
        }
    }

    debug!(
        input = objects.len(),
        in_viewport,
        output = out.len(),
        max_entry,
        "Decimated overlay"
    );
    out
}

/// Color each representative by its density band.
pub fn assign_density_colors(objects: &mut [OverlayObject], palette: &[Color], max_entry: u32) {
    if palette.is_empty() {
        return;
    }
    for obj in objects {
        let idx = band_index(obj.represent_count, max_entry, palette.len());
        obj.color = Some(palette[idx]);
    }
}

#[derive(Debug, Clone, PartialEq)]
struct MemoKey {
    dim: (usize, usize),
    color: Color,
    origin: (f64, f64),
    zoom_factor: f64,
    data_dim: (usize, usize),
    /// Identity of the projection the result was computed against
    projection: usize,
}

/// Decimation with the result memoized on the view (viewport size, scroll
/// position, zoom, projection) and base color.
#[derive(Debug, Default)]
pub struct Decimator {
    key: Option<MemoKey>,
    last: Option<Arc<Vec<OverlayObject>>>,
}

impl Decimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decimate, or return the previous result when the view key has not
    /// changed since the last call.
    pub fn decimate(
        &mut self,
        objects: &Arc<Vec<OverlayObject>>,
        cc: &CoordConverter,
        params: &DecimateParams,
    ) -> Arc<Vec<OverlayObject>> {
        if objects.len() <= params.threshold {
            return Arc::clone(objects);
        }

        let origin = cc.view().viewport_origin();
        let key = MemoKey {
            dim: cc.view().viewport.dim(),
            color: params.color,
            origin: (origin.x, origin.y),
            zoom_factor: cc.zoom_factor(),
            data_dim: (cc.view().data_width, cc.view().data_height),
            projection: Arc::as_ptr(cc.projection()) as usize,
        };

        if self.key.as_ref() == Some(&key) {
            if let Some(last) = &self.last {
                debug!(count = last.len(), "Reusing decimated overlay");
                return Arc::clone(last);
            }
        }

        let out = Arc::new(decimate(objects, cc, params));
        self.key = Some(key);
        self.last = Some(Arc::clone(&out));
        out
    }

    /// Forget the memoized result; called when the data or view changes.
    pub fn invalidate(&mut self) {
        self.key = None;
        self.last = None;
    }

    pub fn has_cached(&self) -> bool {
        self.last.is_some()
    }
}
