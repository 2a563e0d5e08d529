//! Tests for the display histogram and stretch tables.

use image_ops::{Histogram, HIST_SIZE};
use test_utils::{create_star_field, sprinkle_nans};

// ============================================================================
// Helper functions
// ============================================================================

fn star_field_histogram() -> Histogram {
    let pixels = create_star_field(300, 200, 60, 42);
    Histogram::new(&pixels.data, f64::NAN, f64::NAN)
}

// ============================================================================
// Percentiles
// ============================================================================

#[test]
fn test_percentiles_are_monotonic() {
    let h = star_field_histogram();
    let mut last = f64::NEG_INFINITY;
    for p in [0.0, 0.5, 1.0, 5.0, 16.0, 25.0, 50.0, 75.0, 84.0, 95.0, 99.0, 99.5, 100.0] {
        let v = h.percentile(p, false);
        assert!(v >= last, "percentile {} = {} dropped below {}", p, v, last);
        last = v;
    }
}

#[test]
fn test_percentiles_within_data_range() {
    let h = star_field_histogram();
    for p in [1.0, 50.0, 99.0] {
        let v = h.percentile(p, true);
        assert!(v >= h.data_min() && v <= h.data_max() + h.bin_size());
    }
}

#[test]
fn test_sigma_brackets_median() {
    let h = star_field_histogram();
    let median = h.percentile(50.0, false);
    assert_eq!(h.sigma(0.0, false), median);
    assert!(h.sigma(-2.0, false) <= median);
    assert!(h.sigma(2.0, false) >= median);
}

#[test]
fn test_bins_from_queries_are_clamped() {
    let h = star_field_histogram();
    assert!(h.bin_from_percentile(100.0, true) < HIST_SIZE);
    assert!(h.bin_from_sigma(50.0, true) < HIST_SIZE);
    assert_eq!(h.bin_from_sigma(-50.0, false), 0);
}

// ============================================================================
// Blank and degenerate input
// ============================================================================

#[test]
fn test_nan_pixels_dropped() {
    let mut pixels = create_star_field(100, 100, 20, 7);
    sprinkle_nans(&mut pixels, 3);
    let good: Vec<f32> = pixels.data.iter().copied().filter(|v| v.is_finite()).collect();
    let max = good.iter().copied().fold(f32::MIN, f32::max);

    let h = Histogram::new(&pixels.data, f64::NAN, f64::NAN);
    // tails trimmed by a rebuild are not binned, so at most every good pixel
    assert!(h.total() + h.counts()[HIST_SIZE] <= good.len() as u64);
    assert!(h.total() > 0);
    assert_eq!(h.data_max(), max as f64);
}

#[test]
fn test_constant_image() {
    let data = vec![5.0f32; 400];
    let h = Histogram::new(&data, f64::NAN, f64::NAN);
    assert_eq!(h.data_min(), 5.0);
    assert_eq!(h.data_max(), 5.0);
    assert_eq!(h.percentile(50.0, false), 5.0);
}

#[test]
fn test_all_nan_degrades_to_declared_range() {
    let data = vec![f32::NAN; 100];
    let h = Histogram::new(&data, -3.0, 8.0);
    assert_eq!(h.total(), 0);
    assert_eq!(h.percentile(0.0, false), -3.0);
    assert_eq!(h.percentile(100.0, false), 8.0);
}

#[test]
fn test_large_bin_percent() {
    let constant = Histogram::new(&vec![5.0f32; 400], f64::NAN, f64::NAN);
    assert_eq!(constant.large_bin_percent(), 1.0 / (HIST_SIZE + 1) as f64);

    let empty = Histogram::new(&vec![f32::NAN; 100], -3.0, 8.0);
    assert_eq!(empty.large_bin_percent(), 0.0);

    // a flat background piles into few bins against the full range
    let stars = star_field_histogram().large_bin_percent();
    assert!(stars > 0.0 && stars < 0.5, "{}", stars);
}

#[test]
fn test_parallel_and_serial_agree() {
    // the same values binned above and below the parallel threshold
    let small: Vec<f64> = (0..9_000).map(|i| ((i * 37) % 1000) as f64).collect();
    let mut large = small.clone();
    large.extend(small.iter().copied());
    large.extend(small.iter().copied());

    let a = Histogram::new(&small, f64::NAN, f64::NAN);
    let b = Histogram::new(&large, f64::NAN, f64::NAN);
    assert_eq!(a.bin_size(), b.bin_size());
    for (ca, cb) in a.counts().iter().zip(b.counts()) {
        assert_eq!(ca * 3, *cb);
    }
}

// ============================================================================
// Stretch tables
// ============================================================================

#[test]
fn test_stretch_table_boundaries() {
    let h = star_field_histogram();
    let tbl = h.stretch_table();
    assert_eq!(tbl[0], h.hist_min());
    assert_eq!(tbl[255], f64::MAX);
    assert!(tbl.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_stretch_table_starts_at_zero_for_zero_based_data() {
    let data: Vec<f32> = (0..20_000).map(|i| (i % 5000) as f32).collect();
    let h = Histogram::new(&data, f64::NAN, f64::NAN);
    let tbl = h.stretch_table();
    assert_eq!(tbl[0], 0.0);
    assert_eq!(tbl[255], f64::MAX);
    // uniform data gives evenly spaced thresholds
    assert!((tbl[128] - 2500.0).abs() < 50.0, "tbl[128] = {}", tbl[128]);
}

#[test]
fn test_eq_table_tracks_stretch_table() {
    let h = star_field_histogram();
    let float_tbl = h.stretch_table();
    let int_tbl = h.eq_table();
    assert_eq!(int_tbl[255], i32::MAX);
    for i in 0..255 {
        assert_eq!(int_tbl[i], float_tbl[i] as i32);
    }
}
