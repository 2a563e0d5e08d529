//! Tests for tie-point resampling and image rotation.

use image_ops::{
    rotate_by_angle, rotate_to_north, Geom, GeomConfig, GeomOverrides, ImageOpsError, Interpolation,
};
use sky_common::{CoordSys, ImageHeader, SkyImage};
use test_utils::{
    assert_approx_eq, create_index_grid, create_ramp, create_sky_image, small_tan_header, sprinkle_nans,
};

// ============================================================================
// Helper functions
// ============================================================================

fn index_image(size: usize) -> SkyImage {
    SkyImage::new(small_tan_header(size), create_index_grid(size, size)).unwrap()
}

fn bilinear_geom() -> Geom {
    Geom::new(GeomConfig {
        interpolation: Interpolation::Bilinear,
        ..Default::default()
    })
    .unwrap()
}

fn same_or_both_nan(a: &[f32], b: &[f32]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(x, y)| x == y || (x.is_nan() && y.is_nan()))
}

// ============================================================================
// Identity and shifted grids
// ============================================================================

#[test]
fn test_identity_nearest_reproduces_input() {
    let image = create_sky_image(small_tan_header(60), 3);
    let out = Geom::default()
        .resample(&image, None, &GeomOverrides::default())
        .unwrap();

    assert_eq!(out.header.naxis1, 60);
    assert_eq!(out.header.naxis2, 60);
    assert_eq!(out.header.bitpix, -32);
    assert_eq!(out.pixels.data, image.pixels.data);
}

#[test]
fn test_identity_keeps_blank_pixels() {
    let mut image = create_sky_image(small_tan_header(40), 4);
    sprinkle_nans(&mut image.pixels, 7);
    let out = Geom::default().resample_to(&image, &image.header).unwrap();
    assert!(same_or_both_nan(&out.pixels.data, &image.pixels.data));
}

#[test]
fn test_numeric_blank_value_fills_blank_and_uncovered_pixels() {
    let mut image = index_image(50);
    image.pixels.data[7 * 50 + 20] = f32::NAN;
    let mut reference = image.header.clone();
    reference.crpix1 += 5.0;

    let geom = Geom::new(GeomConfig {
        blank_value: -999.0,
        ..Default::default()
    })
    .unwrap();
    let out = geom.resample_to(&image, &reference).unwrap();

    assert_eq!(out.header.blank, Some(-999.0));
    // blank source pixel (20, 7) lands on output column 25
    assert_eq!(out.pixels.get(25, 7), Some(-999.0));
    // off the source grid
    assert_eq!(out.pixels.get(2, 7), Some(-999.0));
    assert_eq!(out.pixels.get(10, 7), Some(5.0 * 1000.0 + 7.0));
    assert!(out.pixels.data.iter().all(|v| !v.is_nan()));
}

#[test]
fn test_nan_blank_value_leaves_header_blank_unset() {
    let image = index_image(30);
    let out = Geom::default().resample_to(&image, &image.header).unwrap();
    assert_eq!(out.header.blank, None);
}

#[test]
fn test_shifted_reference_pixel() {
    let image = index_image(50);
    let mut reference = image.header.clone();
    reference.crpix1 += 5.0;

    let out = Geom::default().resample_to(&image, &reference).unwrap();
    // output column x samples source column x - 5
    assert_eq!(out.pixels.get(10, 7), Some(5.0 * 1000.0 + 7.0));
    assert_eq!(out.pixels.get(49, 0), Some(44.0 * 1000.0));
    assert!(out.pixels.get(2, 7).unwrap().is_nan());
}

#[test]
fn test_bilinear_on_linear_ramp() {
    let header = small_tan_header(40);
    let image = SkyImage::new(header.clone(), create_ramp(40, 40)).unwrap();
    let mut reference = header;
    reference.crpix1 += 0.5;

    let out = bilinear_geom().resample_to(&image, &reference).unwrap();
    for &(x, y) in &[(5usize, 5usize), (20, 13), (38, 30)] {
        let v = out.pixels.get(x, y).unwrap();
        assert_approx_eq!(v, x as f64 - 0.5 + y as f64, 1e-3);
    }
}

#[test]
fn test_coarser_reference_grid() {
    let image = create_sky_image(small_tan_header(60), 5);
    let mut reference = small_tan_header(30);
    reference.cdelt1 *= 2.0;
    reference.cdelt2 *= 2.0;

    let out = Geom::default().resample_to(&image, &reference).unwrap();
    assert_eq!((out.header.naxis1, out.header.naxis2), (30, 30));
    assert!(out.pixels.data.iter().all(|v| v.is_finite()));
}

// ============================================================================
// Overrides
// ============================================================================

#[test]
fn test_crval_override_derives_grid() {
    let image = create_sky_image(small_tan_header(60), 6);
    let overrides = GeomOverrides {
        crval1: Some(image.header.crval1 + 10.0 / 3600.0),
        ..Default::default()
    };
    let out = Geom::default().resample(&image, None, &overrides).unwrap();

    assert_eq!(out.header.crval1, overrides.crval1.unwrap());
    assert!((out.header.naxis1 as i64 - 60).abs() <= 1);
    assert!((out.header.naxis2 as i64 - 60).abs() <= 1);
}

#[test]
fn test_explicit_naxis_recenters() {
    let image = create_sky_image(small_tan_header(60), 7);
    let overrides = GeomOverrides {
        naxis1: Some(30),
        naxis2: Some(20),
        ..Default::default()
    };
    let out = Geom::default().resample(&image, None, &overrides).unwrap();

    assert_eq!((out.header.naxis1, out.header.naxis2), (30, 20));
    // input center (30.5, 30.5) lands on output center (15.5, 10.5)
    assert_approx_eq!(out.header.crpix1, image.header.crpix1 - 15.0, 1e-6);
    assert_approx_eq!(out.header.crpix2, image.header.crpix2 - 20.0, 1e-6);
}

#[test]
fn test_ctype_override_switches_frame() {
    let image = create_sky_image(small_tan_header(40), 8);
    let overrides = GeomOverrides {
        ctype1: Some("GLON-TAN".to_string()),
        crval1: Some(104.85),
        crval2: Some(68.56),
        ..Default::default()
    };
    let out = Geom::default().resample(&image, None, &overrides).unwrap();
    assert_eq!(out.header.ctype2, "GLAT-TAN");
    assert!(out.header.naxis1 > 2 && out.header.naxis2 > 2);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_single_naxis_override_rejected() {
    let image = index_image(20);
    let overrides = GeomOverrides {
        naxis2: Some(10),
        ..Default::default()
    };
    let err = Geom::default().resample(&image, None, &overrides).unwrap_err();
    assert!(matches!(err, ImageOpsError::Config(_)));
}

#[test]
fn test_far_reference_has_no_tie_points() {
    let image = index_image(40);
    let mut reference = image.header.clone();
    reference.crval1 = (reference.crval1 + 180.0) % 360.0;
    reference.crval2 = -reference.crval2;

    let err = Geom::default().resample_to(&image, &reference).unwrap_err();
    assert!(matches!(err, ImageOpsError::ResamplingDomain { .. }), "{}", err);
}

#[test]
fn test_degenerate_output_rejected() {
    let image = index_image(40);
    let tiny = ImageHeader::new_tan(2, 2, image.header.crval1, image.header.crval2, 0.001);
    let err = Geom::default().resample_to(&image, &tiny).unwrap_err();
    assert!(matches!(err, ImageOpsError::ResamplingDomain { .. }));

    let huge = GeomOverrides {
        naxis1: Some(2000),
        naxis2: Some(2000),
        ..Default::default()
    };
    let err = Geom::default().resample(&image, None, &huge).unwrap_err();
    assert!(err.to_string().contains("too different in scale"));
}

#[test]
fn test_invalid_config_rejected() {
    let config = GeomConfig {
        tie_skip: 0,
        ..Default::default()
    };
    assert!(Geom::new(config).is_err());
}

// ============================================================================
// Rotation
// ============================================================================

#[test]
fn test_rotate_to_north_clears_rotation() {
    let mut header = small_tan_header(50);
    header.crota2 = 30.0;
    let image = create_sky_image(header, 9);

    let out = rotate_to_north(&Geom::default(), &image, CoordSys::EqJ2000).unwrap();
    assert_eq!(out.header.crota2, 0.0);
    assert_eq!(out.header.ctype1, "RA---TAN");
    // a 30 degree turn grows the bounding box
    assert!(out.header.naxis1 > 50 && out.header.naxis2 > 50);
}

#[test]
fn test_rotate_quarter_turn_swaps_axes() {
    let mut header = small_tan_header(40);
    header.naxis1 = 60;
    header.crpix1 = 30.5;
    let image = create_sky_image(header, 10);

    let out = rotate_by_angle(&Geom::default(), &image, 90.0).unwrap();
    assert_approx_eq!(out.header.crota2.rem_euclid(360.0), 90.0, 1e-6);
    assert!((out.header.naxis1 as i64 - 40).abs() <= 1, "naxis1 {}", out.header.naxis1);
    assert!((out.header.naxis2 as i64 - 60).abs() <= 1, "naxis2 {}", out.header.naxis2);
}

#[test]
fn test_rotate_to_galactic_north() {
    let image = create_sky_image(small_tan_header(40), 11);
    let out = rotate_to_north(&Geom::default(), &image, CoordSys::Galactic).unwrap();
    assert_eq!(out.header.ctype1, "GLON-TAN");
    assert_eq!(out.header.ctype2, "GLAT-TAN");
}
