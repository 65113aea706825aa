//! Butterworth band-pass design as a cascade of second-order sections.
//!
//! The analog low-pass prototype of order `N = ceil(order / 2)` has its poles
//! equally spaced on the left half of the unit circle. Both cutoffs are
//! pre-warped for the sample rate, the prototype is moved to the band with
//! the low-pass to band-pass transform (centre `sqrt(wl * wh)`, width
//! `wh - wl`) and mapped to the z-plane with the bilinear transform. Each
//! prototype pole (taken from the upper half-plane, conjugates implied) turns
//! into one or two biquads, so the cascade has exactly `N` sections.
//!
//! Every section shares the zeros `z = +1, -1`, i.e. the numerator
//! `1 - z^-2`, and is scaled to unit magnitude at the digital band centre.

use super::sos::{Cascade, SecondOrderSection};
use crate::error::{FilterError, Result};

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

// Tolerance used to tell a real prototype pole from a complex one.
const REAL_POLE_EPS: f64 = 1e-12;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct FilterSpec {
    pub order: usize,
    pub low_cutoff_hz: f64,
    pub high_cutoff_hz: f64,
    pub sample_rate_hz: f64,
}

impl FilterSpec {
    pub fn new(order: usize, low_cutoff_hz: f64, high_cutoff_hz: f64, sample_rate_hz: f64) -> Self {
        FilterSpec {
            order,
            low_cutoff_hz,
            high_cutoff_hz,
            sample_rate_hz,
        }
    }

    pub fn nyquist_hz(&self) -> f64 {
        self.sample_rate_hz / 2.0
    }

    /// Number of biquads the design produces.
    pub fn num_sections(&self) -> usize {
        self.order.div_ceil(2)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(FilterError::InvalidSpecification(msg));

        if self.order == 0 {
            return invalid("order must be at least 1".to_string());
        }
        let values = [self.low_cutoff_hz, self.high_cutoff_hz, self.sample_rate_hz];
        if values.iter().any(|v| !v.is_finite()) {
            return invalid(format!("non-finite value in {:?}", self));
        }
        if self.sample_rate_hz <= 0.0 {
            return invalid(format!("sample rate {} Hz must be positive", self.sample_rate_hz));
        }
        if self.low_cutoff_hz <= 0.0 {
            return invalid(format!("low cutoff {} Hz must be positive", self.low_cutoff_hz));
        }
        if self.high_cutoff_hz <= self.low_cutoff_hz {
            return invalid(format!(
                "high cutoff {} Hz must be above low cutoff {} Hz",
                self.high_cutoff_hz, self.low_cutoff_hz
            ));
        }
        if self.high_cutoff_hz >= self.nyquist_hz() {
            return invalid(format!(
                "high cutoff {} Hz must be below Nyquist ({} Hz)",
                self.high_cutoff_hz,
                self.nyquist_hz()
            ));
        }
        Ok(())
    }
}

/// Design a band-pass Butterworth cascade.
///
/// # Arguments
///
/// * `spec` - order, band edges and sample rate
///
/// # Returns
///
/// * `Result<Cascade>` - `ceil(order / 2)` normalized sections, or
///   `InvalidSpecification` when the band does not fit `(0, Nyquist)`
pub fn design(spec: &FilterSpec) -> Result<Cascade> {
    spec.validate()?;

    let fs = spec.sample_rate_hz;
    let fs2 = 2.0 * fs;
    let n = spec.num_sections();

    // Pre-warped analog band edges (rad/s)
    let wl = prewarp(spec.low_cutoff_hz, fs);
    let wh = prewarp(spec.high_cutoff_hz, fs);
    let bandwidth = wh - wl;
    let w0_sq = wl * wh;

    let mut sections = Vec::with_capacity(n);
    for k in 0..n {
        let p = prototype_pole(k, n);
        if p.im < -REAL_POLE_EPS {
            // conjugate of an already handled pole
            continue;
        }

        // Low-pass to band-pass: s^2 - p*bw*s + w0^2 = 0
        let half = p * (bandwidth / 2.0);
        let disc = (half * half - w0_sq).sqrt();
        let q1 = bilinear(half + disc, fs2);
        let q2 = bilinear(half - disc, fs2);

        if p.im.abs() <= REAL_POLE_EPS {
            // q1 and q2 are either a conjugate pair or both real
            sections.push(section_from_poles(q1, q2));
        } else {
            sections.push(section_from_poles(q1, q1.conj()));
            sections.push(section_from_poles(q2, q2.conj()));
        }
    }

    // Unit gain at the digital image of the analog centre frequency
    let omega_centre = 2.0 * (w0_sq.sqrt() / fs2).atan();
    for section in sections.iter_mut() {
        let gain = section.response(omega_centre).norm();
        section.scale_numerator(1.0 / gain);
    }

    let cascade = Cascade::new(sections);
    if !cascade.is_stable() {
        return Err(FilterError::InvalidSpecification(format!(
            "design for {:?} is not stable",
            spec
        )));
    }
    Ok(cascade)
}

fn prewarp(freq_hz: f64, fs: f64) -> f64 {
    2.0 * fs * (PI * freq_hz / fs).tan()
}

// k-th pole of the unit-cutoff Butterworth prototype of order n
fn prototype_pole(k: usize, n: usize) -> Complex64 {
    let theta = PI * (2 * k + n + 1) as f64 / (2 * n) as f64;
    Complex64::from_polar(1.0, theta)
}

fn bilinear(s: Complex64, fs2: f64) -> Complex64 {
    (fs2 + s) / (fs2 - s)
}

fn section_from_poles(p1: Complex64, p2: Complex64) -> SecondOrderSection {
    // (1 - p1 z^-1)(1 - p2 z^-1); imaginary parts cancel for conjugate or real pairs
    let a1 = -(p1 + p2).re;
    let a2 = (p1 * p2).re;
    SecondOrderSection::new([1.0, 0.0, -1.0], [1.0, a1, a2])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(order: usize, low: f64, high: f64, fs: f64) -> FilterSpec {
        FilterSpec::new(order, low, high, fs)
    }

    #[test]
    fn section_count_is_half_the_order() {
        for order in 1..=10 {
            let cascade = design(&spec(order, 500.0, 2000.0, 30000.0)).unwrap();
            assert_eq!(cascade.len(), (order + 1) / 2, "order {order}");
        }
    }

    #[test]
    fn unit_gain_at_band_centre() {
        let s = spec(4, 500.0, 2000.0, 30000.0);
        let cascade = design(&s).unwrap();
        let fs2 = 2.0 * s.sample_rate_hz;
        let w0 = (prewarp(500.0, 30000.0) * prewarp(2000.0, 30000.0)).sqrt();
        let f_centre = (w0 / fs2).atan() * s.sample_rate_hz / PI;
        let gain = cascade.frequency_response(f_centre, s.sample_rate_hz);
        assert!((gain - 1.0).abs() < 1e-9, "gain {gain}");
    }

    #[test]
    fn band_edges_sit_at_half_power() {
        // Butterworth: |H| = 1/sqrt(2) at both cutoffs, for any order
        for order in [2, 4, 6] {
            let cascade = design(&spec(order, 500.0, 2000.0, 30000.0)).unwrap();
            for edge in [500.0, 2000.0] {
                let gain = cascade.frequency_response(edge, 30000.0);
                assert!(
                    (gain - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-6,
                    "order {order} edge {edge}: {gain}"
                );
            }
        }
    }

    #[test]
    fn wide_band_with_real_poles_is_stable() {
        let cascade = design(&spec(5, 10.0, 4000.0, 30000.0)).unwrap();
        assert_eq!(cascade.len(), 3);
        assert!(cascade.is_stable());
    }

    #[test]
    fn rejects_zero_order_and_non_finite() {
        assert!(design(&spec(0, 500.0, 2000.0, 30000.0)).is_err());
        assert!(design(&spec(2, f64::NAN, 2000.0, 30000.0)).is_err());
        assert!(design(&spec(2, 500.0, f64::INFINITY, 30000.0)).is_err());
        assert!(design(&spec(2, 500.0, 2000.0, 0.0)).is_err());
        assert!(design(&spec(2, 0.0, 2000.0, 30000.0)).is_err());
    }
}
