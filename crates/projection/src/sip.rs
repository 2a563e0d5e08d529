//! SIP (Simple Imaging Polynomial) distortion.
//!
//! Distortion is applied to pixel offsets from CRPIX before the CD matrix:
//! `u' = u + A(u, v)`, `v' = v + B(u, v)`.

use sky_common::SipCoefficients;

const MAX_ITERATIONS: usize = 50;
const TOLERANCE: f64 = 1e-10;

/// Forward and inverse SIP polynomials.
#[derive(Debug, Clone)]
pub struct SipDistortion {
    coeffs: SipCoefficients,
}

impl SipDistortion {
    pub fn new(coeffs: SipCoefficients) -> Self {
        Self { coeffs }
    }

    /// Apply the forward distortion to pixel offsets.
    pub fn distort(&self, u: f64, v: f64) -> (f64, f64) {
        (
            u + eval_poly(&self.coeffs.a, u, v),
            v + eval_poly(&self.coeffs.b, u, v),
        )
    }

    /// Remove the distortion. Uses AP/BP when present, otherwise solves
    /// `distort(u, v) = (up, vp)` by fixed-point iteration.
    pub fn undistort(&self, up: f64, vp: f64) -> Option<(f64, f64)> {
        if self.coeffs.has_inverse() {
            return Some((
                up + eval_poly(&self.coeffs.ap, up, vp),
                vp + eval_poly(&self.coeffs.bp, up, vp),
            ));
        }

        let (mut u, mut v) = (up, vp);
        for _ in 0..MAX_ITERATIONS {
            let nu = up - eval_poly(&self.coeffs.a, u, v);
            let nv = vp - eval_poly(&self.coeffs.b, u, v);
            if !(nu.is_finite() && nv.is_finite()) {
                return None;
            }
            let done = (nu - u).abs() < TOLERANCE && (nv - v).abs() < TOLERANCE;
            u = nu;
            v = nv;
            if done {
                return Some((u, v));
            }
        }
        None
    }
}

/// Evaluate `sum coeff[p][q] * u^p * v^q`.
fn eval_poly(coeff: &[Vec<f64>], u: f64, v: f64) -> f64 {
    let mut sum = 0.0;
    let mut up = 1.0;
    for row in coeff {
        let mut vq = 1.0;
        for &c in row {
            if c != 0.0 {
                sum += c * up * vq;
            }
            vq *= v;
        }
        up *= u;
    }
    sum
}
