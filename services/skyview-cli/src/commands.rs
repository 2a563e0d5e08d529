//! Subcommand implementations, kept free of argument parsing so tests can
//! call them directly.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use image_ops::{Geom, GeomConfig, Histogram, Interpolation};
use overlay::{decimate, DataType, DecimateParams, Drawer, DrawerConfig, Layer, OverlayObject, PixmapSurface};
use projection::{CoordConverter, Projection};
use serde::{Deserialize, Serialize};
use sky_common::{ImageHeader, SkyImage, ViewState};
use tracing::info;

const PERCENTILES: [f64; 9] = [0.0, 1.0, 5.0, 25.0, 50.0, 75.0, 95.0, 99.0, 100.0];
const SIGMAS: [f64; 5] = [-2.0, -1.0, 0.0, 1.0, 2.0];

// =============================================================================
// Image statistics
// =============================================================================

/// Summary of an image's display histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageStats {
    pub data_min: f64,
    pub data_max: f64,
    pub hist_min: f64,
    pub bin_size: f64,
    /// Counted pixels in regular bins
    pub binned: u64,
    /// Fraction of bins above 40% of the fullest bin
    pub large_bin_percent: f64,
    pub percentiles: BTreeMap<String, f64>,
    pub sigmas: BTreeMap<String, f64>,
}

/// Float and integer stretch tables of an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StretchTables {
    pub stretch: Vec<f64>,
    pub eq: Vec<i32>,
}

fn histogram_of(image: &SkyImage) -> Histogram {
    let header = &image.header;
    Histogram::with_blank(
        &image.pixels.data,
        header.datamin.unwrap_or(f64::NAN),
        header.datamax.unwrap_or(f64::NAN),
        header.blank,
    )
}

pub fn stats(image: &SkyImage) -> ImageStats {
    let hist = histogram_of(image);
    let percentiles = PERCENTILES
        .iter()
        .map(|&p| (format!("{}", p), hist.percentile(p, false)))
        .collect();
    let sigmas = SIGMAS
        .iter()
        .map(|&s| (format!("{}", s), hist.sigma(s, false)))
        .collect();

    ImageStats {
        data_min: hist.data_min(),
        data_max: hist.data_max(),
        hist_min: hist.hist_min(),
        bin_size: hist.bin_size(),
        binned: hist.total(),
        large_bin_percent: hist.large_bin_percent(),
        percentiles,
        sigmas,
    }
}

pub fn stretch_tables(image: &SkyImage) -> StretchTables {
    let hist = histogram_of(image);
    StretchTables {
        stretch: hist.stretch_table().to_vec(),
        eq: hist.eq_table().to_vec(),
    }
}

/// A resampler configured from `GEOM_*` variables, with command-line
/// values taking precedence.
pub fn geom_from_env(interpolation: Option<&str>, tie_skip: Option<usize>) -> Result<Geom> {
    let mut config = GeomConfig::from_env();
    if let Some(method) = interpolation {
        config.interpolation = Interpolation::from_str(method);
    }
    if let Some(skip) = tie_skip {
        config.tie_skip = skip;
    }
    Ok(Geom::new(config)?)
}

// =============================================================================
// Overlays
// =============================================================================

/// An overlay catalog together with the image it is drawn over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayDocument {
    pub header: ImageHeader,
    /// Display state; the whole image at the requested zoom when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<ViewState>,
    pub objects: Vec<OverlayObject>,
}

impl OverlayDocument {
    pub fn view_state(&self, zoom: f64) -> ViewState {
        self.view
            .unwrap_or_else(|| ViewState::fit(self.header.naxis1, self.header.naxis2, zoom))
    }

    pub fn converter(&self, zoom: f64) -> Result<CoordConverter> {
        if !(zoom > 0.0 && zoom.is_finite()) {
            bail!("zoom must be positive, got {}", zoom);
        }
        let projection = Projection::from_header(&self.header)?;
        Ok(CoordConverter::new(self.view_state(zoom), Arc::new(projection)))
    }
}

/// Reduce the document's objects to one representative per screen bucket.
pub fn decimate_overlay(
    doc: &OverlayDocument,
    config: &DrawerConfig,
    zoom: f64,
) -> Result<Vec<OverlayObject>> {
    config.validate().map_err(|e| anyhow!("invalid drawer config: {}", e))?;
    let cc = doc.converter(zoom)?;
    let params = DecimateParams::from_config(config, config.colormap);
    let out = decimate(&doc.objects, &cc, &params);

    info!(
        input = doc.objects.len(),
        output = out.len(),
        fuzz_level = params.fuzz_level,
        "Decimated catalog"
    );
    Ok(out)
}

/// Draw the document's objects onto a transparent viewport-sized raster
/// and return it as PNG bytes.
pub fn render_overlay(
    doc: &OverlayDocument,
    config: DrawerConfig,
    zoom: f64,
    data_type: DataType,
) -> Result<Vec<u8>> {
    config.validate().map_err(|e| anyhow!("invalid drawer config: {}", e))?;
    let cc = doc.converter(zoom)?;
    let (width, height) = cc.view().viewport.dim();

    let mut drawer = Drawer::new(
        config,
        PixmapSurface::new(width, height)?,
        PixmapSurface::new(width, height)?,
        PixmapSurface::new(width, height)?,
    );
    drawer.set_data_type(data_type);
    drawer.set_view(cc);
    drawer.set_data(doc.objects.clone());
    drawer.run_to_completion();

    if let Some(err) = drawer.last_error() {
        bail!("draw aborted: {}", err);
    }

    let primary = drawer.layer(Layer::Primary);
    let png = primary.encode_png()?;
    info!(
        objects = doc.objects.len(),
        width,
        height,
        painted = primary.painted_pixels(),
        bytes = png.len(),
        "Rendered overlay"
    );
    Ok(png)
}
