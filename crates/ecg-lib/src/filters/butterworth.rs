//! Maximally-flat band-pass design expressed as second-order sections.

use num_traits::{One, Zero};
use realfft::num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Bilinear transform constant (`2 * fs` with the design done at `fs = 2`).
const BILINEAR_K: f64 = 4.0;

/// One second-order section, `a[0]` normalised to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Biquad {
    pub b: [f64; 3],
    pub a: [f64; 3],
}

impl Biquad {
    fn from_poles(p1: Complex64, p2: Complex64) -> Self {
        Self {
            b: [1.0, 0.0, -1.0],
            a: [1.0, -(p1 + p2).re, (p1 * p2).re],
        }
    }

    /// Gain at z = 1.
    pub fn dc_gain(&self) -> f64 {
        self.b.iter().sum::<f64>() / self.a.iter().sum::<f64>()
    }

    /// Transposed direct-form II state reached after an endless unit step.
    pub fn step_state(&self) -> [f64; 2] {
        let g = self.dc_gain();
        let z1 = self.b[2] - self.a[2] * g;
        let z0 = self.b[1] + z1 - self.a[1] * g;
        [z0, z1]
    }

    /// Complex response at normalised angular frequency `omega` (rad/sample).
    pub fn response(&self, omega: f64) -> Complex64 {
        let z1 = Complex64::new(0.0, -omega).exp();
        let z2 = z1 * z1;
        let num = self.b[0] + z1 * self.b[1] + z2 * self.b[2];
        let den = self.a[0] + z1 * self.a[1] + z2 * self.a[2];
        num / den
    }
}

/// Magnitude of a cascade at `omega` (rad/sample).
pub fn magnitude_response(sections: &[Biquad], omega: f64) -> f64 {
    sections
        .iter()
        .fold(Complex64::one(), |acc, s| acc * s.response(omega))
        .norm()
}

/// Band-pass of prototype order `order` between `low` and `high`, both given
/// as fractions of Nyquist and already validated to satisfy `0 < low < high < 1`.
///
/// The result has `order` sections; the overall gain sits in the first one.
pub fn design_bandpass(low: f64, high: f64, order: usize) -> Vec<Biquad> {
    let n = order as f64;
    let warped_low = BILINEAR_K * (PI * low / 2.0).tan();
    let warped_high = BILINEAR_K * (PI * high / 2.0).tan();
    let bw = warped_high - warped_low;
    let w0_sq = warped_low * warped_high;

    let mut sections = Vec::with_capacity(order);
    let mut analog_den = Complex64::one();
    let mut push_pair = |sections: &mut Vec<Biquad>, p1: Complex64, p2: Complex64| {
        analog_den *= (BILINEAR_K - p1) * (BILINEAR_K - p2);
        sections.push(Biquad::from_poles(bilinear(p1), bilinear(p2)));
    };

    // Prototype poles -exp(j*pi*m/2n) for m = -n+1, -n+3, ..., n-1; the
    // upper half-plane ones stand in for their conjugates.
    for k in 0..order / 2 {
        let m = -n + 1.0 + 2.0 * k as f64;
        let proto = -Complex64::new(0.0, PI * m / (2.0 * n)).exp();
        let (hi, lo) = lowpass_to_bandpass(proto, bw, w0_sq);
        push_pair(&mut sections, hi, hi.conj());
        push_pair(&mut sections, lo, lo.conj());
    }
    if order % 2 == 1 {
        let (hi, lo) = lowpass_to_bandpass(Complex64::new(-1.0, 0.0), bw, w0_sq);
        push_pair(&mut sections, hi, lo);
    }

    // n analog zeros at the origin contribute K^n to the digital gain.
    let gain = bw.powi(order as i32) * (BILINEAR_K.powi(order as i32) / analog_den).re;
    if let Some(first) = sections.first_mut() {
        for coeff in first.b.iter_mut() {
            *coeff *= gain;
        }
    }
    log::debug!(
        "designed order-{} band-pass [{:.5}, {:.5}] x nyquist, {} sections, gain {:.3e}",
        order,
        low,
        high,
        sections.len(),
        gain
    );
    sections
}

fn lowpass_to_bandpass(proto: Complex64, bw: f64, w0_sq: f64) -> (Complex64, Complex64) {
    let scaled = proto * (bw / 2.0);
    let root = (scaled * scaled - w0_sq).sqrt();
    (scaled + root, scaled - root)
}

fn bilinear(p: Complex64) -> Complex64 {
    let k = Complex64::new(BILINEAR_K, 0.0);
    let den = k - p;
    if den.is_zero() {
        return Complex64::zero();
    }
    (k + p) / den
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digital(freq_hz: f64, fs: f64) -> f64 {
        2.0 * PI * freq_hz / fs
    }

    #[test]
    fn one_section_per_prototype_order() {
        for order in 1..=5 {
            let sections = design_bandpass(0.1, 0.4, order);
            assert_eq!(sections.len(), order);
            for s in &sections {
                assert_eq!(s.a[0], 1.0);
            }
        }
    }

    #[test]
    fn poles_are_inside_unit_circle() {
        let sections = design_bandpass(0.5 / 250.0, 50.0 / 250.0, 4);
        for s in sections {
            // For a real quadratic z^2 + a1 z + a2 both roots are inside the
            // unit circle iff |a2| < 1 and |a1| < 1 + a2.
            assert!(s.a[2].abs() < 1.0, "{:?}", s);
            assert!(s.a[1].abs() < 1.0 + s.a[2], "{:?}", s);
        }
    }

    #[test]
    fn half_power_at_cutoffs_and_unity_at_centre() {
        let fs = 500.0;
        let (low, high) = (0.5, 50.0);
        for order in [1, 2, 3] {
            let sections = design_bandpass(low / (fs / 2.0), high / (fs / 2.0), order);
            let at_low = magnitude_response(&sections, digital(low, fs));
            let at_high = magnitude_response(&sections, digital(high, fs));
            assert!((at_low - 0.5f64.sqrt()).abs() < 1e-6, "order {order}: {at_low}");
            assert!((at_high - 0.5f64.sqrt()).abs() < 1e-6, "order {order}: {at_high}");

            let wl = BILINEAR_K * (PI * low / fs).tan();
            let wh = BILINEAR_K * (PI * high / fs).tan();
            let centre = 2.0 * ((wl * wh).sqrt() / BILINEAR_K).atan();
            let at_centre = magnitude_response(&sections, centre);
            assert!((at_centre - 1.0).abs() < 1e-6, "order {order}: {at_centre}");
        }
    }

    #[test]
    fn blocks_dc_and_nyquist() {
        let sections = design_bandpass(0.05, 0.3, 2);
        assert!(magnitude_response(&sections, 0.0) < 1e-12);
        assert!(magnitude_response(&sections, PI) < 1e-12);
        let state = sections[0].step_state();
        // Zero DC gain means the step state is just the numerator tail.
        assert!((state[0] - (sections[0].b[1] + sections[0].b[2])).abs() < 1e-12);
        assert!((state[1] - sections[0].b[2]).abs() < 1e-12);
    }
}
