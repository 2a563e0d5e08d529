//! Fixtures shared by the skyview crates' tests and benchmarks.
//!
//! - [`fixtures`]: reference headers (M51, SIP, all-sky CAR, polar) and views
//! - [`generators`]: deterministic pixel arrays, star fields and catalogs
//! - `assert_approx_eq!` / `assert_world_approx_eq!` for float comparisons

pub mod fixtures;
pub mod generators;

pub use fixtures::*;
pub use generators::*;
pub use sky_common;

/// Assert `|left - right| <= epsilon`, converting all three to `f64`.
///
/// ```ignore
/// assert_approx_eq!(out.header.crpix1, 15.5, 1e-6);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (l, r, eps) = ($left as f64, $right as f64, $epsilon as f64);
        if !((l - r).abs() <= eps) {
            panic!(
                "values not within {:e}: {} vs {} (off by {:e})",
                eps,
                l,
                r,
                (l - r).abs()
            );
        }
    }};
}

/// Approximate equality of two sky positions, comparing longitude modulo
/// 360 so that 359.9999999 and 0.0 are treated as neighbors.
///
/// ```ignore
/// assert_world_approx_eq!(wp_a, wp_b, 1e-10);
/// ```
#[macro_export]
macro_rules! assert_world_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: $crate::sky_common::WorldPt = $left;
        let right: $crate::sky_common::WorldPt = $right;
        let mut dlon = (left.lon - right.lon).rem_euclid(360.0);
        if dlon > 180.0 {
            dlon = 360.0 - dlon;
        }
        if dlon > $epsilon || (left.lat - right.lat).abs() > $epsilon {
            panic!(
                "assertion failed: world points differ\n  left: `{}`,\n right: `{}`",
                left, right
            );
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use sky_common::WorldPt;

    #[test]
    fn test_approx_within_epsilon() {
        assert_approx_eq!(2.0005, 2.0, 1e-3);
        assert_approx_eq!(-0.25f32, -0.2500001f32, 1e-5);
    }

    #[test]
    #[should_panic(expected = "values not within")]
    fn test_approx_outside_epsilon() {
        assert_approx_eq!(3.2, 3.0, 0.01);
    }

    #[test]
    #[should_panic(expected = "values not within")]
    fn test_approx_rejects_nan() {
        assert_approx_eq!(f64::NAN, 0.0, 1.0);
    }

    #[test]
    fn test_world_approx_wraps_longitude() {
        assert_world_approx_eq!(WorldPt::new(359.99999999999, 1.0), WorldPt::new(0.0, 1.0), 1e-9);
    }

    #[test]
    #[should_panic(expected = "world points differ")]
    fn test_world_approx_fails() {
        assert_world_approx_eq!(WorldPt::new(10.0, 1.0), WorldPt::new(10.1, 1.0), 1e-3);
    }
}
