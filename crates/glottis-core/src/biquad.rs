//! Biquad (bi-quadratic) filter section.
//!
//! A second-order IIR filter in Direct Form I, plus the RBJ Audio EQ
//! Cookbook band-pass design used for formant resonances.
//!
//! Formant gain is applied to the feed-forward coefficients only
//! ([`Biquad::set_coefficients_with_gain`]); the feedback pair that
//! determines pole placement is never scaled, so a stable design stays
//! stable at any gain.

use core::f32::consts::PI;
use libm::{cosf, sinf};

use crate::math::flush_denormal;

/// Second-order IIR filter coefficients and running state.
///
/// Implements the Direct Form I structure:
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
///                - a1*y[n-1] - a2*y[n-2]
/// ```
#[derive(Debug, Clone)]
pub struct Biquad {
    /// Feedforward coefficients
    b0: f32,
    b1: f32,
    b2: f32,

    /// Feedback coefficients (normalized by a0)
    a1: f32,
    a2: f32,

    /// Input history: x[n-1], x[n-2]
    x1: f32,
    x2: f32,

    /// Output history: y[n-1], y[n-2]
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Creates a biquad with passthrough coefficients (`y[n] = x[n]`).
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Sets the biquad coefficients, normalizing by `a0`.
    ///
    /// Filter history is preserved so coefficient updates mid-stream do
    /// not click.
    pub fn set_coefficients(&mut self, b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) {
        self.set_coefficients_with_gain(b0, b1, b2, a0, a1, a2, 1.0);
    }

    /// Sets the coefficients and scales only the numerator by `gain`.
    ///
    /// `a1`/`a2` are normalized but never multiplied by `gain`.
    #[allow(clippy::too_many_arguments)]
    pub fn set_coefficients_with_gain(
        &mut self,
        b0: f32,
        b1: f32,
        b2: f32,
        a0: f32,
        a1: f32,
        a2: f32,
        gain: f32,
    ) {
        let a0_inv = 1.0 / a0;
        self.b0 = b0 * a0_inv * gain;
        self.b1 = b1 * a0_inv * gain;
        self.b2 = b2 * a0_inv * gain;
        self.a1 = a1 * a0_inv;
        self.a2 = a2 * a0_inv;
    }

    /// Returns the normalized `(b0, b1, b2, a1, a2)` coefficients.
    pub fn coefficients(&self) -> (f32, f32, f32, f32, f32) {
        (self.b0, self.b1, self.b2, self.a1, self.a2)
    }

    /// Processes a single sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = flush_denormal(output);

        output
    }

    /// Clears the filter history without touching the coefficients.
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

/// Band-pass coefficients from the RBJ cookbook (constant 0 dB peak gain).
///
/// # Arguments
///
/// * `frequency` - Center frequency in Hz
/// * `q` - Q factor (bandwidth = frequency / Q)
/// * `sample_rate` - Sample rate in Hz
///
/// # Returns
///
/// (b0, b1, b2, a0, a1, a2) coefficients
pub fn bandpass_coefficients(
    frequency: f32,
    q: f32,
    sample_rate: f32,
) -> (f32, f32, f32, f32, f32, f32) {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let sin_omega = sinf(omega);
    let alpha = sin_omega / (2.0 * q);

    let b0 = alpha;
    let b1 = 0.0;
    let b2 = -alpha;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha;

    (b0, b1, b2, a0, a1, a2)
}

#[cfg(test)]
mod tests {
    use super::*;

    // |H(e^jw)| from the normalized coefficients.
    fn magnitude_at(biquad: &Biquad, frequency: f32, sample_rate: f32) -> f32 {
        let (b0, b1, b2, a1, a2) = biquad.coefficients();
        let w = 2.0 * PI * frequency / sample_rate;
        let (c1, s1) = (cosf(w), sinf(w));
        let (c2, s2) = (cosf(2.0 * w), sinf(2.0 * w));

        let num_re = b0 + b1 * c1 + b2 * c2;
        let num_im = -(b1 * s1 + b2 * s2);
        let den_re = 1.0 + a1 * c1 + a2 * c2;
        let den_im = -(a1 * s1 + a2 * s2);
        ((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im)).sqrt()
    }

    #[test]
    fn test_biquad_passthrough() {
        let mut biquad = Biquad::new();
        for i in 0..10 {
            let input = i as f32 * 0.1;
            assert!((biquad.process(input) - input).abs() < 1e-4);
        }
    }

    #[test]
    fn test_biquad_clear() {
        let mut biquad = Biquad::new();
        let (b0, b1, b2, a0, a1, a2) = bandpass_coefficients(500.0, 2.0, 48000.0);
        biquad.set_coefficients(b0, b1, b2, a0, a1, a2);
        for _ in 0..10 {
            biquad.process(1.0);
        }

        biquad.clear();

        assert_eq!(biquad.x1, 0.0);
        assert_eq!(biquad.x2, 0.0);
        assert_eq!(biquad.y1, 0.0);
        assert_eq!(biquad.y2, 0.0);
    }

    #[test]
    fn test_bandpass_unity_peak() {
        let mut biquad = Biquad::new();
        let (b0, b1, b2, a0, a1, a2) = bandpass_coefficients(1000.0, 4.0, 48000.0);
        biquad.set_coefficients(b0, b1, b2, a0, a1, a2);

        let peak = magnitude_at(&biquad, 1000.0, 48000.0);
        assert!((peak - 1.0).abs() < 0.01, "peak gain {peak}");
        assert!(magnitude_at(&biquad, 100.0, 48000.0) < 0.2);
        assert!(magnitude_at(&biquad, 8000.0, 48000.0) < 0.2);
    }

    #[test]
    fn test_gain_scales_numerator_only() {
        let (b0, b1, b2, a0, a1, a2) = bandpass_coefficients(700.0, 5.0, 48000.0);

        let mut unity = Biquad::new();
        unity.set_coefficients(b0, b1, b2, a0, a1, a2);
        let mut boosted = Biquad::new();
        boosted.set_coefficients_with_gain(b0, b1, b2, a0, a1, a2, 2.0);

        let (ub0, ub1, ub2, ua1, ua2) = unity.coefficients();
        let (gb0, gb1, gb2, ga1, ga2) = boosted.coefficients();
        assert!((gb0 - 2.0 * ub0).abs() < 1e-7);
        assert!((gb1 - 2.0 * ub1).abs() < 1e-7);
        assert!((gb2 - 2.0 * ub2).abs() < 1e-7);
        assert_eq!(ga1, ua1);
        assert_eq!(ga2, ua2);
        assert!(ga2.abs() < 1.0 && ga1.abs() < 1.0 + ga2);
    }

    #[test]
    fn test_bandpass_rejects_dc() {
        let mut biquad = Biquad::new();
        let (b0, b1, b2, a0, a1, a2) = bandpass_coefficients(800.0, 2.0, 48000.0);
        biquad.set_coefficients(b0, b1, b2, a0, a1, a2);

        let mut output = 1.0;
        for _ in 0..4000 {
            output = biquad.process(1.0);
        }
        assert!(output.abs() < 1e-3, "DC leaked through: {output}");
    }
}
