//! Parallel formant filter bank.
//!
//! Three band-pass resonators per channel, fed the same input and summed,
//! shape the glottal source into a vowel. Filter state lives in one flat
//! array indexed by `channel * FORMANTS_PER_CHANNEL + formant`, allocated
//! at prepare time.
//!
//! ## Frequency pipeline
//!
//! For each formant, whenever a control changes:
//!
//! 1. pitch tracking: `f *= (fundamental / 220)^0.25`
//! 2. shift: `f *= shift`
//! 3. spread: `f *= 1 + (spread - 1) * i / 2` for formant `i > 0`
//! 4. harmonic alignment (optional): `f = max(round(f / f0), 1) * f0`
//! 5. clamp to `[0.5, 2.5] ×` the table frequency
//!
//! ## Coefficient synthesis
//!
//! | Quantity | Clamp |
//! |----------|-------|
//! | frequency | 50 Hz ..= 0.4 × sample rate |
//! | bandwidth | 20 Hz ..= 0.5 × frequency |
//! | Q | 0.7 ..= 8.0 |
//! | gain (numerator only) | 0.1 ..= 2.0 |
//!
//! The summed output is scaled by `0.7 × resonance_gain` and soft-limited
//! to ±0.95.

#[cfg(not(feature = "std"))]
use alloc::vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use glottis_core::{AudioBuffer, Biquad, SmoothedParam, bandpass_coefficients, soft_limit};
use libm::{powf, roundf};

/// Resonators per channel.
pub const FORMANTS_PER_CHANNEL: usize = 3;

/// Fundamental at which the table frequencies apply unmodified.
pub const REFERENCE_FUNDAMENTAL: f32 = 220.0;
/// Exponent of the pitch-tracking ratio.
pub const PITCH_TRACKING_EXPONENT: f32 = 0.25;

/// Filter Q limits.
pub const Q_RANGE: (f32, f32) = (0.7, 8.0);
/// Per-formant linear gain limits.
pub const FORMANT_GAIN_RANGE: (f32, f32) = (0.1, 2.0);
/// Lowest synthesized center frequency in Hz.
pub const MIN_FORMANT_FREQUENCY: f32 = 50.0;
/// Highest synthesized center frequency as a fraction of the sample rate.
pub const MAX_FORMANT_FREQUENCY_RATIO: f32 = 0.4;
/// Narrowest bandwidth in Hz.
pub const MIN_BANDWIDTH: f32 = 20.0;

/// Global shift limits.
pub const SHIFT_RANGE: (f32, f32) = (0.5, 2.0);
/// Spread limits.
pub const SPREAD_RANGE: (f32, f32) = (0.5, 2.0);
/// Bandwidth scale limits.
pub const BANDWIDTH_SCALE_RANGE: (f32, f32) = (0.5, 3.0);
/// Resonance gain limits.
pub const RESONANCE_GAIN_RANGE: (f32, f32) = (0.1, 2.0);

/// Output scalar applied before the resonance gain.
pub const OUTPUT_SCALE: f32 = 0.7;
/// Soft-limit ceiling of the bank output.
pub const OUTPUT_CEILING: f32 = 0.95;
/// Blocks quieter than this are left untouched.
pub const SILENCE_THRESHOLD: f32 = 1e-6;

/// Fundamentals outside this open interval are ignored.
pub const FUNDAMENTAL_RANGE: (f32, f32) = (50.0, 2000.0);
const FUNDAMENTAL_CHANGE_THRESHOLD: f32 = 1.0;
const SHAPE_CHANGE_THRESHOLD: f32 = 0.01;
const OUTPUT_SMOOTHING_MS: f32 = 10.0;

/// Vowel selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Vowel {
    /// Open "ah".
    A,
    /// Mid front "eh".
    #[default]
    E,
    /// Close front "ee".
    I,
    /// Mid back "oh".
    O,
    /// Close back "oo".
    U,
}

impl Vowel {
    /// All vowels in table order.
    pub const ALL: [Vowel; 5] = [Vowel::A, Vowel::E, Vowel::I, Vowel::O, Vowel::U];

    /// Table index.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Inverse of [`index`](Self::index); out-of-range values give the default.
    pub fn from_index(index: u8) -> Self {
        Self::ALL.get(index as usize).copied().unwrap_or_default()
    }

    /// Single-letter lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Vowel::A => "a",
            Vowel::E => "e",
            Vowel::I => "i",
            Vowel::O => "o",
            Vowel::U => "u",
        }
    }

    /// Parse a single-letter name, case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.name().eq_ignore_ascii_case(name))
    }

    /// Formant profile for this vowel.
    pub fn profile(self) -> &'static FormantProfile {
        &FORMANT_TABLE[self as usize]
    }
}

/// One resonance: center frequency and bandwidth in Hz, linear gain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Formant {
    /// Center frequency (Hz).
    pub frequency: f32,
    /// -3 dB bandwidth (Hz).
    pub bandwidth: f32,
    /// Linear peak gain.
    pub gain: f32,
}

/// Three formants describing a vowel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FormantProfile {
    /// F1, F2, F3.
    pub formants: [Formant; FORMANTS_PER_CHANNEL],
}

const fn profile(f: [f32; 3], bw: [f32; 3], g: [f32; 3]) -> FormantProfile {
    FormantProfile {
        formants: [
            Formant { frequency: f[0], bandwidth: bw[0], gain: g[0] },
            Formant { frequency: f[1], bandwidth: bw[1], gain: g[1] },
            Formant { frequency: f[2], bandwidth: bw[2], gain: g[2] },
        ],
    }
}

/// Vowel formant table, indexed by [`Vowel::index`].
pub const FORMANT_TABLE: [FormantProfile; 5] = [
    profile([730.0, 1090.0, 2440.0], [80.0, 90.0, 120.0], [1.5, 1.0, 0.5]),
    profile([530.0, 1840.0, 2480.0], [80.0, 90.0, 120.0], [1.5, 1.2, 0.6]),
    profile([270.0, 2290.0, 3010.0], [40.0, 90.0, 120.0], [1.2, 1.5, 0.8]),
    profile([570.0, 840.0, 2410.0], [80.0, 80.0, 120.0], [1.5, 0.8, 0.5]),
    profile([440.0, 1020.0, 2240.0], [80.0, 80.0, 120.0], [1.2, 0.6, 0.4]),
];

/// Run-time controls of the bank.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FormantShape {
    /// Selected vowel.
    pub vowel: Vowel,
    /// Global frequency multiplier.
    pub shift: f32,
    /// Spacing multiplier for F2/F3.
    pub spread: f32,
    /// Bandwidth multiplier.
    pub bandwidth_scale: f32,
    /// Output level multiplier.
    pub resonance_gain: f32,
    /// Snap formants to harmonics of the fundamental.
    pub harmonic_alignment: bool,
}

impl Default for FormantShape {
    fn default() -> Self {
        Self {
            vowel: Vowel::E,
            shift: 1.0,
            spread: 1.0,
            bandwidth_scale: 1.0,
            resonance_gain: 1.0,
            harmonic_alignment: false,
        }
    }
}

/// Synthesized parameters of one resonator.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FormantDesign {
    /// Center frequency after all clamps (Hz).
    pub frequency: f32,
    /// Clamped Q.
    pub q: f32,
    /// Clamped numerator gain.
    pub gain: f32,
}

/// Runs the frequency pipeline for formant `index` of a vowel.
pub fn adjusted_frequency(base: f32, index: usize, fundamental: f32, shape: &FormantShape) -> f32 {
    let mut freq = base * powf(fundamental / REFERENCE_FUNDAMENTAL, PITCH_TRACKING_EXPONENT);
    freq *= shape.shift;
    if index > 0 {
        freq *= 1.0 + (shape.spread - 1.0) * index as f32 / 2.0;
    }
    if shape.harmonic_alignment && fundamental > 0.0 {
        freq = roundf(freq / fundamental).max(1.0) * fundamental;
    }
    freq.clamp(0.5 * base, 2.5 * base)
}

/// Clamps frequency, bandwidth, Q, and gain into their stable ranges.
pub fn design_formant(
    frequency: f32,
    bandwidth: f32,
    gain: f32,
    sample_rate: f32,
) -> FormantDesign {
    let max_freq = (MAX_FORMANT_FREQUENCY_RATIO * sample_rate).max(MIN_FORMANT_FREQUENCY);
    let frequency = frequency.clamp(MIN_FORMANT_FREQUENCY, max_freq);
    let bandwidth = bandwidth.clamp(MIN_BANDWIDTH, 0.5 * frequency);
    let q = (frequency / bandwidth).clamp(Q_RANGE.0, Q_RANGE.1);
    let gain = gain.clamp(FORMANT_GAIN_RANGE.0, FORMANT_GAIN_RANGE.1);
    FormantDesign { frequency, q, gain }
}

/// Per-channel parallel band-pass bank with vowel controls.
///
/// # Example
///
/// ```rust
/// use glottis_core::AudioBuffer;
/// use glottis_synth::{FormantFilterBank, Vowel};
///
/// let mut bank = FormantFilterBank::new();
/// bank.prepare(48000.0, 256, 2);
/// bank.set_vowel(Vowel::A);
/// bank.set_fundamental_frequency(110.0);
///
/// let mut block = AudioBuffer::new(2, 256);
/// block.channel_mut(0)[0] = 1.0;
/// bank.process(&mut block);
/// assert!(block.peak() < 0.95);
/// ```
#[derive(Debug, Clone)]
pub struct FormantFilterBank {
    filters: Vec<Biquad>,
    sample_rate: f32,
    max_block_size: usize,
    num_channels: usize,
    prepared: bool,

    shape: FormantShape,
    fundamental: f32,
    designs: [FormantDesign; FORMANTS_PER_CHANNEL],
    output_gain: SmoothedParam,
}

impl Default for FormantFilterBank {
    fn default() -> Self {
        Self::new()
    }
}

impl FormantFilterBank {
    /// Create an unprepared bank with default shape.
    pub fn new() -> Self {
        let shape = FormantShape::default();
        Self {
            filters: Vec::new(),
            sample_rate: 0.0,
            max_block_size: 0,
            num_channels: 0,
            prepared: false,
            shape,
            fundamental: REFERENCE_FUNDAMENTAL,
            designs: [FormantDesign::default(); FORMANTS_PER_CHANNEL],
            output_gain: SmoothedParam::new(OUTPUT_SCALE * shape.resonance_gain),
        }
    }

    /// Allocate filter state for `num_channels` and compute coefficients.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize, num_channels: usize) {
        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        self.num_channels = num_channels;
        self.filters = vec![Biquad::new(); num_channels * FORMANTS_PER_CHANNEL];
        self.output_gain = SmoothedParam::with_config(
            OUTPUT_SCALE * self.shape.resonance_gain,
            sample_rate,
            OUTPUT_SMOOTHING_MS,
        );
        self.prepared = sample_rate > 0.0;
        self.update_coefficients();
    }

    /// Whether [`prepare`](Self::prepare) has run.
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Configured channel count.
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Clear every filter's history; coefficients are kept.
    pub fn reset(&mut self) {
        for filter in &mut self.filters {
            filter.clear();
        }
        self.output_gain.snap_to_target();
    }

    /// Current controls.
    pub fn shape(&self) -> FormantShape {
        self.shape
    }

    /// Fundamental the formants currently track.
    pub fn fundamental_frequency(&self) -> f32 {
        self.fundamental
    }

    /// Designs currently loaded into the filters.
    pub fn designs(&self) -> &[FormantDesign; FORMANTS_PER_CHANNEL] {
        &self.designs
    }

    /// Select a vowel.
    pub fn set_vowel(&mut self, vowel: Vowel) {
        if vowel != self.shape.vowel {
            self.shape.vowel = vowel;
            self.update_coefficients();
        }
    }

    /// Track a new fundamental. Ignored outside (50, 2000) Hz or for
    /// changes of 1 Hz or less.
    pub fn set_fundamental_frequency(&mut self, hz: f32) {
        if hz > FUNDAMENTAL_RANGE.0
            && hz < FUNDAMENTAL_RANGE.1
            && (hz - self.fundamental).abs() > FUNDAMENTAL_CHANGE_THRESHOLD
        {
            self.fundamental = hz;
            self.update_coefficients();
        }
    }

    /// Global formant multiplier.
    pub fn set_formant_shift(&mut self, shift: f32) {
        let shift = shift.clamp(SHIFT_RANGE.0, SHIFT_RANGE.1);
        if exceeds_threshold(self.shape.shift, shift) {
            self.shape.shift = shift;
            self.update_coefficients();
        }
    }

    /// F2/F3 spacing multiplier.
    pub fn set_formant_spread(&mut self, spread: f32) {
        let spread = spread.clamp(SPREAD_RANGE.0, SPREAD_RANGE.1);
        if exceeds_threshold(self.shape.spread, spread) {
            self.shape.spread = spread;
            self.update_coefficients();
        }
    }

    /// Bandwidth multiplier.
    pub fn set_bandwidth_scale(&mut self, scale: f32) {
        let scale = scale.clamp(BANDWIDTH_SCALE_RANGE.0, BANDWIDTH_SCALE_RANGE.1);
        if exceeds_threshold(self.shape.bandwidth_scale, scale) {
            self.shape.bandwidth_scale = scale;
            self.update_coefficients();
        }
    }

    /// Output level multiplier, smoothed over ~10 ms.
    pub fn set_resonance_gain(&mut self, gain: f32) {
        let gain = gain.clamp(RESONANCE_GAIN_RANGE.0, RESONANCE_GAIN_RANGE.1);
        if exceeds_threshold(self.shape.resonance_gain, gain) {
            self.shape.resonance_gain = gain;
            self.output_gain.set_target(OUTPUT_SCALE * gain);
        }
    }

    /// Snap formant centers to harmonics of the fundamental.
    pub fn set_harmonic_alignment(&mut self, enabled: bool) {
        if enabled != self.shape.harmonic_alignment {
            self.shape.harmonic_alignment = enabled;
            self.update_coefficients();
        }
    }

    /// Apply every control in `shape` through the individual setters.
    pub fn set_shape(&mut self, shape: FormantShape) {
        self.set_vowel(shape.vowel);
        self.set_formant_shift(shape.shift);
        self.set_formant_spread(shape.spread);
        self.set_bandwidth_scale(shape.bandwidth_scale);
        self.set_resonance_gain(shape.resonance_gain);
        self.set_harmonic_alignment(shape.harmonic_alignment);
    }

    /// Filter `buffer` in place.
    ///
    /// Leaves the buffer untouched when unprepared or when its peak is
    /// below [`SILENCE_THRESHOLD`]. A channel-count change re-runs
    /// [`prepare`](Self::prepare) first.
    pub fn process(&mut self, buffer: &mut AudioBuffer) {
        if !self.prepared {
            return;
        }
        if buffer.num_channels() != self.num_channels {
            let max_block = self.max_block_size.max(buffer.capacity());
            self.prepare(self.sample_rate, max_block, buffer.num_channels());
        }
        if buffer.peak() < SILENCE_THRESHOLD {
            return;
        }

        let entry_gain = self.output_gain.clone();
        for ch in 0..buffer.num_channels() {
            self.output_gain = entry_gain.clone();
            let base = ch * FORMANTS_PER_CHANNEL;
            let bank = &mut self.filters[base..base + FORMANTS_PER_CHANNEL];
            for sample in buffer.channel_mut(ch) {
                let input = *sample;
                let sum: f32 = bank.iter_mut().map(|f| f.process(input)).sum();
                *sample = soft_limit(sum * self.output_gain.advance(), OUTPUT_CEILING);
            }
        }
    }

    fn update_coefficients(&mut self) {
        let profile = self.shape.vowel.profile();
        for (i, formant) in profile.formants.iter().enumerate() {
            let freq = adjusted_frequency(formant.frequency, i, self.fundamental, &self.shape);
            let bandwidth = formant.bandwidth * self.shape.bandwidth_scale;
            self.designs[i] = design_formant(freq, bandwidth, formant.gain, self.sample_rate);
        }

        if !self.prepared {
            return;
        }
        for ch in 0..self.num_channels {
            for (i, design) in self.designs.iter().enumerate() {
                let (b0, b1, b2, a0, a1, a2) =
                    bandpass_coefficients(design.frequency, design.q, self.sample_rate);
                self.filters[ch * FORMANTS_PER_CHANNEL + i]
                    .set_coefficients_with_gain(b0, b1, b2, a0, a1, a2, design.gain);
            }
        }
    }
}

fn exceeds_threshold(current: f32, new: f32) -> bool {
    (current - new).abs() > SHAPE_CHANGE_THRESHOLD
}
