//! Geometric resampling of an image onto another pixel grid.
//!
//! The output grid comes from a reference header, or from the input
//! header with keyword overrides. Source positions are projected exactly
//! only at tie points every `tie_skip` output pixels; positions in
//! between are interpolated linearly, first along tie rows and then
//! between tie rows.

use projection::Projection;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sky_common::{ImageHeader, PixelArray, SkyImage};
use tracing::{debug, info};

use crate::config::GeomConfig;
use crate::error::{ImageOpsError, Result};

/// Keyword overrides for the output grid. Each field replaces the
/// derived value independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeomOverrides {
    /// `Some(0)` asks for NAXIS1/NAXIS2 to be derived from the input extent.
    pub naxis1: Option<usize>,
    pub naxis2: Option<usize>,
    pub crval1: Option<f64>,
    pub crval2: Option<f64>,
    pub cdelt1: Option<f64>,
    pub cdelt2: Option<f64>,
    pub cd: Option<[[f64; 2]; 2]>,
    pub crota2: Option<f64>,
    /// CTYPE2 is derived from this.
    pub ctype1: Option<String>,
}

impl GeomOverrides {
    /// True when any override changes the sky mapping of the grid.
    pub fn changes_wcs(&self) -> bool {
        self.crval1.is_some()
            || self.crval2.is_some()
            || self.cdelt1.is_some()
            || self.cdelt2.is_some()
            || self.cd.is_some()
            || self.crota2.is_some()
            || self.ctype1.is_some()
    }

    fn apply(&self, header: &mut ImageHeader) {
        if let Some(n) = self.naxis1 {
            header.naxis1 = n;
        }
        if let Some(n) = self.naxis2 {
            header.naxis2 = n;
        }
        if let Some(v) = self.crval1 {
            header.crval1 = v;
        }
        if let Some(v) = self.crval2 {
            header.crval2 = v;
        }

        if let Some(rot) = self.crota2 {
            let (c1, c2) = header.effective_cdelt();
            header.cdelt1 = c1;
            header.cdelt2 = c2;
            header.cd = None;
            header.crota2 = rot;
        }
        if let Some(c1) = self.cdelt1 {
            let (old, _) = header.effective_cdelt();
            if let Some(cd) = header.cd.as_mut() {
                if old != 0.0 {
                    cd[0][0] *= c1 / old;
                    cd[1][0] *= c1 / old;
                }
            }
            header.cdelt1 = c1;
        }
        if let Some(c2) = self.cdelt2 {
            let (_, old) = header.effective_cdelt();
            if let Some(cd) = header.cd.as_mut() {
                if old != 0.0 {
                    cd[0][1] *= c2 / old;
                    cd[1][1] *= c2 / old;
                }
            }
            header.cdelt2 = c2;
        }
        if let Some(cd) = self.cd {
            header.cd = Some(cd);
        }

        if let Some(ctype1) = &self.ctype1 {
            header.ctype2 = derive_ctype2(ctype1);
            header.ctype1 = ctype1.clone();
        }
    }
}

/// Latitude axis name matching a longitude `CTYPE1`.
pub fn derive_ctype2(ctype1: &str) -> String {
    let upper = ctype1.to_uppercase();
    let suffix = upper.get(4..).unwrap_or("");
    let axis = if upper.starts_with("GLON") {
        "GLAT"
    } else if upper.starts_with("ELON") {
        "ELAT"
    } else {
        "DEC-"
    };
    format!("{}{}", axis, suffix)
}

/// How NAXIS/CRPIX of the output are adjusted after overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GridFit {
    Keep,
    CrpixOnly,
    NaxisAndCrpix,
}

/// Resamples images onto a new grid.
#[derive(Debug, Clone)]
pub struct Geom {
    config: GeomConfig,
}

impl Geom {
    pub fn new(config: GeomConfig) -> Result<Self> {
        config.validate().map_err(ImageOpsError::Config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GeomConfig {
        &self.config
    }

    /// Resample `src` onto the grid of `reference`.
    pub fn resample_to(&self, src: &SkyImage, reference: &ImageHeader) -> Result<SkyImage> {
        self.resample(src, Some(reference), &GeomOverrides::default())
    }

    /// Resample `src` onto the grid of `reference` (or of its own header
    /// when `None`) with `overrides` applied.
    ///
    /// Only the first plane of a cube is resampled. The output is always
    /// BITPIX -32 with blank pixels set to the configured blank value.
    pub fn resample(
        &self,
        src: &SkyImage,
        reference: Option<&ImageHeader>,
        overrides: &GeomOverrides,
    ) -> Result<SkyImage> {
        let in_header = &src.header;
        let in_proj = Projection::from_header(in_header)?;

        let base = match reference {
            Some(r) => {
                Projection::from_header(r).map_err(|e| {
                    ImageOpsError::resampling(
                        format!("reference header cannot be projected: {}", e),
                        r.naxis1,
                        r.naxis2,
                    )
                })?;
                r.clone()
            }
            None => in_header.clone(),
        };
        let ref_dims = (base.naxis1, base.naxis2);

        let mut out = base;
        overrides.apply(&mut out);
        out.bitpix = -32;
        let blank = self.config.blank_value;
        out.blank = (!blank.is_nan()).then_some(blank as f64);
        out.naxis3 = 1;
        out.naxis4 = 1;
        out.datamin = None;
        out.datamax = None;

        match grid_fit(overrides)? {
            GridFit::NaxisAndCrpix => fit_naxis_and_crpix(&in_proj, in_header, &mut out)?,
            GridFit::CrpixOnly => fit_crpix(&in_proj, in_header, &mut out)?,
            GridFit::Keep => {}
        }

        let limit = self.config.max_scale_change;
        if out.naxis1 > limit * ref_dims.0
            || out.naxis2 > limit * ref_dims.1
            || out.naxis1 <= 2
            || out.naxis2 <= 2
        {
            return Err(ImageOpsError::resampling(
                "image is too different in scale to resample",
                out.naxis1,
                out.naxis2,
            ));
        }

        let out_proj = Projection::from_header(&out).map_err(|e| {
            ImageOpsError::resampling(
                format!("output header cannot be projected: {}", e),
                out.naxis1,
                out.naxis2,
            )
        })?;

        let (width, height) = (out.naxis1, out.naxis2);
        let tie_rows = tie_indices(height, self.config.tie_skip);
        let tie_cols = tie_indices(width, self.config.tie_skip);
        let lines: Vec<Vec<(f64, f64)>> = tie_rows
            .par_iter()
            .map(|&row| source_line(&in_proj, &out_proj, row, &tie_cols, width))
            .collect();

        let resolved = lines
            .iter()
            .flat_map(|line| tie_cols.iter().map(move |&c| line[c]))
            .filter(|(x, _)| !x.is_nan())
            .count();
        if resolved == 0 {
            return Err(ImageOpsError::resampling(
                "no tie points resolve onto the source image",
                width,
                height,
            ));
        }

        if src.pixels.planes() > 1 {
            debug!(planes = src.pixels.planes(), "Resampling first plane only");
        }
        let plane = src.pixels.plane(0);
        let (src_w, src_h) = (src.pixels.width(), src.pixels.height());
        let method = self.config.interpolation;
        let min_weight = self.config.min_weight;

        let mut data = vec![blank; width * height];
        data.par_chunks_mut(width)
            .enumerate()
            .for_each(|(row, out_row)| {
                let positions = row_positions(&tie_rows, &lines, row);
                for (px, (x, y)) in out_row.iter_mut().zip(positions) {
                    if let Some(v) = method.sample(plane, src_w, src_h, x, y, min_weight) {
                        *px = v;
                    }
                }
            });

        info!(
            naxis1 = width,
            naxis2 = height,
            interpolation = %method,
            tie_points = tie_rows.len() * tie_cols.len(),
            resolved,
            "Resampled image"
        );

        let pixels = PixelArray::new(vec![width, height], data)?;
        Ok(SkyImage::new(out, pixels)?)
    }
}

impl Default for Geom {
    fn default() -> Self {
        Self {
            config: GeomConfig::default(),
        }
    }
}

fn grid_fit(overrides: &GeomOverrides) -> Result<GridFit> {
    match (overrides.naxis1, overrides.naxis2) {
        (Some(0), _) => Ok(GridFit::NaxisAndCrpix),
        (Some(_), Some(_)) => Ok(GridFit::CrpixOnly),
        (Some(_), None) | (None, Some(_)) => Err(ImageOpsError::Config(
            "NAXIS1 and NAXIS2 must be overridden together".to_string(),
        )),
        (None, None) if overrides.changes_wcs() => Ok(GridFit::NaxisAndCrpix),
        (None, None) => Ok(GridFit::Keep),
    }
}

/// Projection for a header whose NAXIS values are not final yet.
fn provisional_projection(out: &ImageHeader) -> Result<Projection> {
    let mut header = out.clone();
    header.naxis1 = header.naxis1.max(1);
    header.naxis2 = header.naxis2.max(1);
    Projection::from_header(&header).map_err(|e| {
        ImageOpsError::resampling(
            format!("output header cannot be projected: {}", e),
            out.naxis1,
            out.naxis2,
        )
    })
}

/// Map a 1-based input pixel onto the 1-based output grid.
fn input_to_output(in_proj: &Projection, out_proj: &Projection, x: f64, y: f64) -> Option<(f64, f64)> {
    let wp = in_proj.pixel_to_world(x - 1.0, y - 1.0)?;
    let (px, py) = out_proj.world_to_pixel(&wp)?;
    Some((px + 1.0, py + 1.0))
}

/// Size the output to hold the whole input, sampling nine input points.
fn fit_naxis_and_crpix(in_proj: &Projection, in_header: &ImageHeader, out: &mut ImageHeader) -> Result<()> {
    let out_proj = provisional_projection(out)?;
    let (n1, n2) = (in_header.naxis1 as f64, in_header.naxis2 as f64);
    let xs = [1.0, (n1 + 1.0) / 2.0, n1];
    let ys = [1.0, (n2 + 1.0) / 2.0, n2];

    let mapped: Vec<(f64, f64)> = xs
        .iter()
        .flat_map(|&x| ys.iter().map(move |&y| (x, y)))
        .filter_map(|(x, y)| input_to_output(in_proj, &out_proj, x, y))
        .collect();
    if mapped.is_empty() {
        return Err(ImageOpsError::resampling(
            "unable to recompute NAXIS for the output area",
            out.naxis1,
            out.naxis2,
        ));
    }

    let min_x = mapped.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let max_x = mapped.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let min_y = mapped.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let max_y = mapped.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

    let lo_x = (min_x + 0.5).floor();
    let lo_y = (min_y + 0.5).floor();
    let hi_x = (max_x - 0.5).ceil();
    let hi_y = (max_y - 0.5).ceil();
    let naxis1 = hi_x - lo_x + 1.0;
    let naxis2 = hi_y - lo_y + 1.0;
    if naxis1 < 1.0 || naxis2 < 1.0 {
        return Err(ImageOpsError::resampling(
            "computed output area is empty",
            0,
            0,
        ));
    }

    out.naxis1 = naxis1 as usize;
    out.naxis2 = naxis2 as usize;
    out.crpix1 -= min_x - 1.0;
    out.crpix2 -= min_y - 1.0;
    debug!(
        naxis1 = out.naxis1,
        naxis2 = out.naxis2,
        crpix1 = out.crpix1,
        crpix2 = out.crpix2,
        "Derived output grid"
    );
    Ok(())
}

/// Keep the requested NAXIS but move CRPIX so the input center lands on
/// the output center.
fn fit_crpix(in_proj: &Projection, in_header: &ImageHeader, out: &mut ImageHeader) -> Result<()> {
    let out_proj = provisional_projection(out)?;
    let cx = (in_header.naxis1 as f64 + 1.0) / 2.0;
    let cy = (in_header.naxis2 as f64 + 1.0) / 2.0;
    let (ox, oy) = input_to_output(in_proj, &out_proj, cx, cy).ok_or_else(|| {
        ImageOpsError::resampling(
            "could not reproject the image center; coordinates probably too far away",
            out.naxis1,
            out.naxis2,
        )
    })?;
    out.crpix1 += (out.naxis1 as f64 + 1.0) / 2.0 - ox;
    out.crpix2 += (out.naxis2 as f64 + 1.0) / 2.0 - oy;
    Ok(())
}

/// Every `skip`-th index plus the last one.
pub fn tie_indices(len: usize, skip: usize) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }
    let mut idx: Vec<usize> = (0..len).step_by(skip.max(1)).collect();
    if idx.last() != Some(&(len - 1)) {
        idx.push(len - 1);
    }
    idx
}

/// Source positions (0-based) for one output row: exact at the tie
/// columns, linear in between. Unresolved positions are NaN.
fn source_line(
    in_proj: &Projection,
    out_proj: &Projection,
    row: usize,
    tie_cols: &[usize],
    width: usize,
) -> Vec<(f64, f64)> {
    let mut line = vec![(f64::NAN, f64::NAN); width];
    for &col in tie_cols {
        if let Some(p) = out_proj
            .pixel_to_world(col as f64, row as f64)
            .and_then(|wp| in_proj.world_to_pixel(&wp))
        {
            line[col] = p;
        }
    }
    for pair in tie_cols.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let (pa, pb) = (line[a], line[b]);
        if pa.0.is_nan() || pb.0.is_nan() {
            continue;
        }
        let span = (b - a) as f64;
        for (c, slot) in line.iter_mut().enumerate().take(b).skip(a + 1) {
            let t = (c - a) as f64 / span;
            *slot = lerp(pa, pb, t);
        }
    }
    line
}

/// Source positions for output `row`, interpolated between tie rows.
fn row_positions(tie_rows: &[usize], lines: &[Vec<(f64, f64)>], row: usize) -> Vec<(f64, f64)> {
    match tie_rows.binary_search(&row) {
        Ok(i) => lines[i].clone(),
        Err(i) => {
            // tie_rows starts at 0 and ends at the last row, so 0 < i < len
            let (r0, r1) = (tie_rows[i - 1], tie_rows[i]);
            let t = (row - r0) as f64 / (r1 - r0) as f64;
            lines[i - 1]
                .iter()
                .zip(&lines[i])
                .map(|(&a, &b)| {
                    if a.0.is_nan() || b.0.is_nan() {
                        (f64::NAN, f64::NAN)
                    } else {
                        lerp(a, b, t)
                    }
                })
                .collect()
        }
    }
}

fn lerp(a: (f64, f64), b: (f64, f64), t: f64) -> (f64, f64) {
    (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tie_indices() {
        assert_eq!(tie_indices(25, 10), vec![0, 10, 20, 24]);
        assert_eq!(tie_indices(21, 10), vec![0, 10, 20]);
        assert_eq!(tie_indices(1, 10), vec![0]);
        assert!(tie_indices(0, 10).is_empty());
    }

    #[test]
    fn test_derive_ctype2() {
        assert_eq!(derive_ctype2("RA---TAN"), "DEC--TAN");
        assert_eq!(derive_ctype2("GLON-CAR"), "GLAT-CAR");
        assert_eq!(derive_ctype2("elon-sin"), "ELAT-SIN");
    }

    #[test]
    fn test_grid_fit_rules() {
        let none = GeomOverrides::default();
        assert_eq!(grid_fit(&none).unwrap(), GridFit::Keep);

        let auto = GeomOverrides {
            naxis1: Some(0),
            ..Default::default()
        };
        assert_eq!(grid_fit(&auto).unwrap(), GridFit::NaxisAndCrpix);

        let explicit = GeomOverrides {
            naxis1: Some(100),
            naxis2: Some(80),
            crval1: Some(10.0),
            ..Default::default()
        };
        assert_eq!(grid_fit(&explicit).unwrap(), GridFit::CrpixOnly);

        let half = GeomOverrides {
            naxis2: Some(80),
            ..Default::default()
        };
        assert!(grid_fit(&half).is_err());

        let rotated = GeomOverrides {
            crota2: Some(30.0),
            ..Default::default()
        };
        assert_eq!(grid_fit(&rotated).unwrap(), GridFit::NaxisAndCrpix);
    }

    #[test]
    fn test_cdelt_override_scales_cd_matrix() {
        let mut header = ImageHeader::new_tan(100, 100, 10.0, 20.0, 0.001);
        header.cd = Some([[-0.001, 0.0], [0.0, 0.001]]);
        let overrides = GeomOverrides {
            cdelt1: Some(-0.002),
            ..Default::default()
        };
        overrides.apply(&mut header);
        let cd = header.cd.unwrap();
        assert!((cd[0][0] + 0.002).abs() < 1e-15);
        assert!((cd[1][1] - 0.001).abs() < 1e-15);
    }

    #[test]
    fn test_row_positions_interpolate() {
        let rows = vec![0, 10];
        let lines = vec![vec![(0.0, 0.0), (f64::NAN, f64::NAN)], vec![(10.0, 20.0), (1.0, 1.0)]];
        let mid = row_positions(&rows, &lines, 5);
        assert_eq!(mid[0], (5.0, 10.0));
        assert!(mid[1].0.is_nan());
    }
}
