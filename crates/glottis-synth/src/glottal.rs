//! Glottal pulse oscillator after the Liljencrants–Fant (LF) flow model.
//!
//! One period of glottal airflow is split into three regions by two
//! breakpoints on the normalized phase:
//!
//! ```text
//!  1 |      .-.
//!    |    .'   '.
//!    |  .'       '.
//!    |.'           '.____________
//!  0 +-------+-------+-----------> phase
//!    0       tp      te          1
//!     opening  closing   closed
//! ```
//!
//! - opening (`phase < tp`): quarter-sine rise, `sin(π/2 · phase/tp)`
//! - closing (`tp ≤ phase < te`): `exp(-asymmetry·t) · cos(π/2 · t)`,
//!   `t = (phase - tp)/(te - tp)`, continuous at `tp` and zero at `te`
//! - closed (`phase ≥ te`): exactly zero
//!
//! `te` equals the open quotient; `tp = te · (0.6 - 0.1 · asymmetry)`, so a
//! higher asymmetry peaks earlier and closes more abruptly.

use core::f32::consts::FRAC_PI_2;
use libm::{cosf, expf, sinf};

use crate::oscillator::NoiseSource;

/// Open quotient range.
pub const OPEN_QUOTIENT_RANGE: (f32, f32) = (0.3, 0.7);
/// Asymmetry range.
pub const ASYMMETRY_RANGE: (f32, f32) = (0.1, 2.0);
/// Breathiness range.
pub const BREATHINESS_RANGE: (f32, f32) = (0.0, 1.0);
/// Tenseness range.
pub const TENSENESS_RANGE: (f32, f32) = (0.0, 1.0);

/// Default open quotient.
pub const DEFAULT_OPEN_QUOTIENT: f32 = 0.6;
/// Default asymmetry.
pub const DEFAULT_ASYMMETRY: f32 = 0.7;
/// Default breathiness.
pub const DEFAULT_BREATHINESS: f32 = 0.1;
/// Default tenseness.
pub const DEFAULT_TENSENESS: f32 = 0.8;

/// The four glottal shape controls as one value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlottalShape {
    /// Open quotient.
    pub open_quotient: f32,
    /// Asymmetry.
    pub asymmetry: f32,
    /// Breathiness.
    pub breathiness: f32,
    /// Tenseness.
    pub tenseness: f32,
}

impl Default for GlottalShape {
    fn default() -> Self {
        Self {
            open_quotient: DEFAULT_OPEN_QUOTIENT,
            asymmetry: DEFAULT_ASYMMETRY,
            breathiness: DEFAULT_BREATHINESS,
            tenseness: DEFAULT_TENSENESS,
        }
    }
}

/// LF-model glottal pulse generator.
///
/// All shape setters clamp silently to the ranges above.
///
/// # Example
///
/// ```rust
/// use glottis_synth::GlottalOscillator;
///
/// let mut glottis = GlottalOscillator::new();
/// glottis.prepare(48000.0);
/// glottis.set_frequency(110.0);
/// glottis.set_open_quotient(0.5);
///
/// let sample = glottis.next_sample();
/// assert!(sample.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct GlottalOscillator {
    phase: f32,
    phase_inc: f32,
    sample_rate: f32,
    frequency: f32,

    open_quotient: f32,
    asymmetry: f32,
    breathiness: f32,
    tenseness: f32,

    /// Start of the closed region
    te: f32,
    /// Flow peak
    tp: f32,

    noise: NoiseSource,
}

impl Default for GlottalOscillator {
    fn default() -> Self {
        Self::new()
    }
}

impl GlottalOscillator {
    /// Create an unprepared oscillator with default shape at 220 Hz.
    pub fn new() -> Self {
        let mut osc = Self {
            phase: 0.0,
            phase_inc: 0.0,
            sample_rate: 0.0,
            frequency: 220.0,
            open_quotient: DEFAULT_OPEN_QUOTIENT,
            asymmetry: DEFAULT_ASYMMETRY,
            breathiness: DEFAULT_BREATHINESS,
            tenseness: DEFAULT_TENSENESS,
            te: 0.0,
            tp: 0.0,
            noise: NoiseSource::new(0x9E3779B9),
        };
        osc.update_breakpoints();
        osc
    }

    /// Set the sample rate and reset phase.
    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.update_increment();
        self.reset();
    }

    /// Whether a usable sample rate has been set.
    pub fn is_prepared(&self) -> bool {
        self.sample_rate > 0.0
    }

    /// Set the fundamental in Hz.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.frequency = freq_hz.max(0.0);
        self.update_increment();
    }

    /// Fundamental in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Fraction of the period the glottis is open.
    pub fn set_open_quotient(&mut self, value: f32) {
        self.open_quotient = value.clamp(OPEN_QUOTIENT_RANGE.0, OPEN_QUOTIENT_RANGE.1);
        self.update_breakpoints();
    }

    /// Skew of the pulse toward an early peak and abrupt closure.
    pub fn set_asymmetry(&mut self, value: f32) {
        self.asymmetry = value.clamp(ASYMMETRY_RANGE.0, ASYMMETRY_RANGE.1);
        self.update_breakpoints();
    }

    /// Noise share during the open phase.
    pub fn set_breathiness(&mut self, value: f32) {
        self.breathiness = value.clamp(BREATHINESS_RANGE.0, BREATHINESS_RANGE.1);
    }

    /// Vocal-fold tension; scales output between 50% and 100%.
    pub fn set_tenseness(&mut self, value: f32) {
        self.tenseness = value.clamp(TENSENESS_RANGE.0, TENSENESS_RANGE.1);
    }

    /// Apply all four shape controls, clamping each.
    pub fn set_shape(&mut self, shape: GlottalShape) {
        let (oq_min, oq_max) = OPEN_QUOTIENT_RANGE;
        self.open_quotient = shape.open_quotient.clamp(oq_min, oq_max);
        self.asymmetry = shape.asymmetry.clamp(ASYMMETRY_RANGE.0, ASYMMETRY_RANGE.1);
        self.update_breakpoints();
        self.set_breathiness(shape.breathiness);
        self.set_tenseness(shape.tenseness);
    }

    /// Current (clamped) shape controls.
    pub fn shape(&self) -> GlottalShape {
        GlottalShape {
            open_quotient: self.open_quotient,
            asymmetry: self.asymmetry,
            breathiness: self.breathiness,
            tenseness: self.tenseness,
        }
    }

    /// Clamped open quotient.
    pub fn open_quotient(&self) -> f32 {
        self.open_quotient
    }

    /// Clamped asymmetry.
    pub fn asymmetry(&self) -> f32 {
        self.asymmetry
    }

    /// Clamped breathiness.
    pub fn breathiness(&self) -> f32 {
        self.breathiness
    }

    /// Clamped tenseness.
    pub fn tenseness(&self) -> f32 {
        self.tenseness
    }

    /// Phase at which the closed region begins (`te`).
    pub fn closure_point(&self) -> f32 {
        self.te
    }

    /// Phase of peak flow (`tp`).
    pub fn peak_point(&self) -> f32 {
        self.tp
    }

    /// Phase of the sample the next call will produce.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Reset phase to the start of the opening region.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Set phase directly, wrapped into [0, 1).
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = phase - libm::floorf(phase);
    }

    /// Noise-free pulse shape at `phase`.
    #[inline]
    pub fn pulse_at(&self, phase: f32) -> f32 {
        if phase < self.tp {
            sinf(FRAC_PI_2 * phase / self.tp)
        } else if phase < self.te {
            let t = (phase - self.tp) / (self.te - self.tp);
            expf(-self.asymmetry * t) * cosf(FRAC_PI_2 * t)
        } else {
            0.0
        }
    }

    /// Generate one sample and advance the phase.
    ///
    /// Returns silence when unprepared.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if !self.is_prepared() {
            return 0.0;
        }

        let phase = self.phase;
        let output = if phase < self.te {
            let pulse = self.pulse_at(phase);
            let noise = self.noise.next_sample();
            let mixed = pulse * (1.0 - self.breathiness) + noise * self.breathiness;
            mixed * (0.5 + 0.5 * self.tenseness)
        } else {
            0.0
        };

        self.phase += self.phase_inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        output
    }

    fn update_breakpoints(&mut self) {
        self.te = self.open_quotient;
        self.tp = self.te * (0.6 - 0.1 * self.asymmetry);
    }

    fn update_increment(&mut self) {
        self.phase_inc = if self.sample_rate > 0.0 {
            (self.frequency / self.sample_rate).min(0.5)
        } else {
            0.0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prepared(freq: f32) -> GlottalOscillator {
        let mut osc = GlottalOscillator::new();
        osc.prepare(48000.0);
        osc.set_frequency(freq);
        osc
    }

    #[test]
    fn closed_region_is_exactly_zero() {
        let mut osc = prepared(100.0);
        osc.set_breathiness(1.0);
        for _ in 0..4800 {
            let in_closed = osc.phase() >= osc.closure_point();
            let s = osc.next_sample();
            if in_closed {
                assert_eq!(s, 0.0);
            }
        }
    }

    #[test]
    fn breakpoints_ordered_across_range() {
        let mut osc = GlottalOscillator::new();
        for oq in [0.0, 0.3, 0.5, 0.7, 1.0] {
            for asym in [0.0, 0.1, 1.0, 2.0, 5.0] {
                osc.set_open_quotient(oq);
                osc.set_asymmetry(asym);
                assert!(0.0 < osc.peak_point());
                assert!(osc.peak_point() < osc.closure_point());
                assert!(osc.closure_point() <= 0.7);
            }
        }
    }

    #[test]
    fn pulse_continuous_at_peak_and_closure() {
        let osc = GlottalOscillator::new();
        let tp = osc.peak_point();
        let te = osc.closure_point();
        assert!((osc.pulse_at(tp - 1e-5) - osc.pulse_at(tp)).abs() < 1e-3);
        assert!(osc.pulse_at(te - 1e-5).abs() < 1e-3);
        assert_eq!(osc.pulse_at(te), 0.0);
    }

    #[test]
    fn setters_clamp_to_documented_ranges() {
        let mut osc = GlottalOscillator::new();
        osc.set_open_quotient(0.95);
        osc.set_asymmetry(-3.0);
        osc.set_breathiness(4.0);
        osc.set_tenseness(-1.0);
        assert_eq!(osc.open_quotient(), 0.7);
        assert_eq!(osc.asymmetry(), 0.1);
        assert_eq!(osc.breathiness(), 1.0);
        assert_eq!(osc.tenseness(), 0.0);
    }

    #[test]
    fn tenseness_floor_keeps_signal_audible() {
        let mut slack = prepared(200.0);
        slack.set_breathiness(0.0);
        slack.set_tenseness(0.0);
        let mut tense = prepared(200.0);
        tense.set_breathiness(0.0);
        tense.set_tenseness(1.0);

        let peak = |osc: &mut GlottalOscillator| {
            (0..2400).map(|_| osc.next_sample()).fold(0.0f32, f32::max)
        };
        let p_slack = peak(&mut slack);
        let p_tense = peak(&mut tense);
        assert!((p_slack / p_tense - 0.5).abs() < 0.01, "{p_slack} vs {p_tense}");
    }

    #[test]
    fn set_shape_matches_individual_setters() {
        let mut a = GlottalOscillator::new();
        a.set_shape(GlottalShape {
            open_quotient: 0.9,
            asymmetry: 1.5,
            breathiness: 0.3,
            tenseness: 0.2,
        });
        let mut b = GlottalOscillator::new();
        b.set_open_quotient(0.9);
        b.set_asymmetry(1.5);
        b.set_breathiness(0.3);
        b.set_tenseness(0.2);
        assert_eq!(a.shape(), b.shape());
        assert_eq!(a.peak_point(), b.peak_point());
    }

    #[test]
    fn unprepared_is_silent() {
        let mut osc = GlottalOscillator::new();
        osc.set_frequency(220.0);
        assert_eq!(osc.next_sample(), 0.0);
    }

    #[test]
    fn period_matches_frequency() {
        let mut osc = prepared(250.0);
        let mut wraps = 0;
        let mut prev = osc.phase();
        for _ in 0..48000 {
            osc.next_sample();
            if osc.phase() < prev {
                wraps += 1;
            }
            prev = osc.phase();
        }
        assert!((wraps - 250i32).abs() <= 1);
    }
}
