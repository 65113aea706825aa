use num_complex::Complex64;
use std::f64::consts::PI;

// SECOND-ORDER SECTION --------------------------------------------------------

/// One biquad stage, `H(z) = (b0 + b1 z^-1 + b2 z^-2) / (a0 + a1 z^-1 + a2 z^-2)`.
///
/// Coefficients are normalized on construction so that `a0 == 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecondOrderSection {
    pub b: [f64; 3],
    pub a: [f64; 3],
}

impl SecondOrderSection {
    pub fn new(b: [f64; 3], a: [f64; 3]) -> Self {
        let a0 = a[0];
        SecondOrderSection {
            b: [b[0] / a0, b[1] / a0, b[2] / a0],
            a: [1.0, a[1] / a0, a[2] / a0],
        }
    }

    /// Coefficients in `(b0, b1, b2, a0, a1, a2)` order.
    pub fn coefficients(&self) -> [f64; 6] {
        [self.b[0], self.b[1], self.b[2], self.a[0], self.a[1], self.a[2]]
    }

    /// Direct form II transposed. `state` holds the two delay registers.
    #[inline]
    pub fn step(&self, input: f64, state: &mut [f64; 2]) -> f64 {
        let output = self.b[0] * input + state[0];
        state[0] = self.b[1] * input - self.a[1] * output + state[1];
        state[1] = self.b[2] * input - self.a[2] * output;
        output
    }

    /// Complex response at normalized angular frequency `omega` (rad/sample).
    pub fn response(&self, omega: f64) -> Complex64 {
        let z1 = Complex64::from_polar(1.0, -omega);
        let z2 = z1 * z1;
        let num = self.b[0] + z1 * self.b[1] + z2 * self.b[2];
        let den = self.a[0] + z1 * self.a[1] + z2 * self.a[2];
        num / den
    }

    /// Roots of `z^2 + a1 z + a2`.
    pub fn poles(&self) -> [Complex64; 2] {
        let a1 = Complex64::new(self.a[1], 0.0);
        let disc = (a1 * a1 - 4.0 * self.a[2]).sqrt();
        [(-a1 + disc) / 2.0, (-a1 - disc) / 2.0]
    }

    pub(crate) fn scale_numerator(&mut self, gain: f64) {
        for b in self.b.iter_mut() {
            *b *= gain;
        }
    }
}

// CASCADE ---------------------------------------------------------------------

/// Ordered chain of second-order sections, each feeding the next.
#[derive(Debug, Clone, PartialEq)]
pub struct Cascade {
    sections: Vec<SecondOrderSection>,
}

impl Cascade {
    pub fn new(sections: Vec<SecondOrderSection>) -> Self {
        Cascade { sections }
    }

    pub fn sections(&self) -> &[SecondOrderSection] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Run one sample through every section. `states` must hold one delay
    /// pair per section.
    #[inline]
    pub fn filter_sample(&self, input: f64, states: &mut [[f64; 2]]) -> f64 {
        self.sections
            .iter()
            .zip(states.iter_mut())
            .fold(input, |x, (section, state)| section.step(x, state))
    }

    /// Magnitude response at `freq_hz` for a stream sampled at `sample_rate_hz`.
    pub fn frequency_response(&self, freq_hz: f64, sample_rate_hz: f64) -> f64 {
        let omega = 2.0 * PI * freq_hz / sample_rate_hz;
        self.sections
            .iter()
            .map(|s| s.response(omega))
            .fold(Complex64::new(1.0, 0.0), |acc, h| acc * h)
            .norm()
    }

    pub fn poles(&self) -> Vec<Complex64> {
        self.sections.iter().flat_map(|s| s.poles()).collect()
    }

    /// True when every pole lies strictly inside the unit circle.
    pub fn is_stable(&self) -> bool {
        self.poles().iter().all(|p| p.norm() < 1.0)
    }
}
