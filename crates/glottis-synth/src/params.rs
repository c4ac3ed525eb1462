//! Lock-free control surface shared between a control context and the
//! render path.
//!
//! Each parameter is one `AtomicU32` holding `f32` bits. Writers store with
//! `Release`, the render path loads with `Acquire` once per block and works
//! from a [`ParamSnapshot`]. Only whole words are ever published, so a
//! reader sees either the previous or the new value of a field, never a
//! torn one. Fields are independent: a snapshot taken while a writer is
//! halfway through several updates can mix old and new fields.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::envelope::{AdsrParameters, MAX_STAGE_SECONDS};
use crate::formant::{
    BANDWIDTH_SCALE_RANGE, FormantShape, RESONANCE_GAIN_RANGE, SHIFT_RANGE, SPREAD_RANGE, Vowel,
};
use crate::glottal::{
    ASYMMETRY_RANGE, BREATHINESS_RANGE, DEFAULT_ASYMMETRY, DEFAULT_BREATHINESS,
    DEFAULT_OPEN_QUOTIENT, DEFAULT_TENSENESS, GlottalShape, OPEN_QUOTIENT_RANGE, TENSENESS_RANGE,
};
use crate::osc_engine::WaveType;

/// Every host-facing parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ParamId {
    /// Attack time in seconds.
    Attack,
    /// Decay time in seconds.
    Decay,
    /// Sustain level.
    Sustain,
    /// Release time in seconds.
    Release,
    /// Oscillator waveform, stored as [`WaveType::index`].
    Wave,
    /// Glottal open quotient.
    OpenQuotient,
    /// Glottal asymmetry.
    Asymmetry,
    /// Breath noise mix.
    Breathiness,
    /// Vocal-fold tension.
    Tenseness,
    /// Vowel, stored as [`Vowel::index`].
    Vowel,
    /// Global formant shift.
    FormantShift,
    /// F2/F3 spread.
    FormantSpread,
    /// Bandwidth multiplier.
    BandwidthScale,
    /// Output resonance gain.
    ResonanceGain,
    /// Harmonic alignment toggle, 0 or 1.
    HarmonicAlignment,
}

/// Number of entries in [`ParamId`].
pub const PARAM_COUNT: usize = 15;

impl ParamId {
    /// All parameters in storage order.
    pub const ALL: [ParamId; PARAM_COUNT] = [
        ParamId::Attack,
        ParamId::Decay,
        ParamId::Sustain,
        ParamId::Release,
        ParamId::Wave,
        ParamId::OpenQuotient,
        ParamId::Asymmetry,
        ParamId::Breathiness,
        ParamId::Tenseness,
        ParamId::Vowel,
        ParamId::FormantShift,
        ParamId::FormantSpread,
        ParamId::BandwidthScale,
        ParamId::ResonanceGain,
        ParamId::HarmonicAlignment,
    ];

    /// Storage index.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable snake_case name.
    pub fn name(self) -> &'static str {
        match self {
            ParamId::Attack => "attack",
            ParamId::Decay => "decay",
            ParamId::Sustain => "sustain",
            ParamId::Release => "release",
            ParamId::Wave => "wave",
            ParamId::OpenQuotient => "open_quotient",
            ParamId::Asymmetry => "asymmetry",
            ParamId::Breathiness => "breathiness",
            ParamId::Tenseness => "tenseness",
            ParamId::Vowel => "vowel",
            ParamId::FormantShift => "formant_shift",
            ParamId::FormantSpread => "formant_spread",
            ParamId::BandwidthScale => "bandwidth_scale",
            ParamId::ResonanceGain => "resonance_gain",
            ParamId::HarmonicAlignment => "harmonic_alignment",
        }
    }

    /// Look up by [`name`](Self::name).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }

    /// Inclusive `(min, max)` bounds.
    pub fn range(self) -> (f32, f32) {
        match self {
            ParamId::Attack | ParamId::Decay | ParamId::Release => (0.0, MAX_STAGE_SECONDS),
            ParamId::Sustain => (0.0, 1.0),
            ParamId::Wave => (0.0, 1.0),
            ParamId::OpenQuotient => OPEN_QUOTIENT_RANGE,
            ParamId::Asymmetry => ASYMMETRY_RANGE,
            ParamId::Breathiness => BREATHINESS_RANGE,
            ParamId::Tenseness => TENSENESS_RANGE,
            ParamId::Vowel => (0.0, (Vowel::ALL.len() - 1) as f32),
            ParamId::FormantShift => SHIFT_RANGE,
            ParamId::FormantSpread => SPREAD_RANGE,
            ParamId::BandwidthScale => BANDWIDTH_SCALE_RANGE,
            ParamId::ResonanceGain => RESONANCE_GAIN_RANGE,
            ParamId::HarmonicAlignment => (0.0, 1.0),
        }
    }

    /// Value a fresh [`SharedParams`] starts with.
    pub fn default_value(self) -> f32 {
        let env = AdsrParameters::default();
        match self {
            ParamId::Attack => env.attack,
            ParamId::Decay => env.decay,
            ParamId::Sustain => env.sustain,
            ParamId::Release => env.release,
            ParamId::Wave => f32::from(WaveType::default().index()),
            ParamId::OpenQuotient => DEFAULT_OPEN_QUOTIENT,
            ParamId::Asymmetry => DEFAULT_ASYMMETRY,
            ParamId::Breathiness => DEFAULT_BREATHINESS,
            ParamId::Tenseness => DEFAULT_TENSENESS,
            ParamId::Vowel => f32::from(Vowel::default().index()),
            ParamId::FormantShift
            | ParamId::FormantSpread
            | ParamId::BandwidthScale
            | ParamId::ResonanceGain => 1.0,
            ParamId::HarmonicAlignment => 0.0,
        }
    }

    /// Whether the value is an enum index or a toggle.
    pub fn is_discrete(self) -> bool {
        matches!(self, ParamId::Wave | ParamId::Vowel | ParamId::HarmonicAlignment)
    }
}

/// Plain copy of every parameter, read once per render block.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ParamSnapshot {
    /// Oscillator waveform.
    pub wave: WaveType,
    /// Glottal shape controls.
    pub glottal: GlottalShape,
    /// Amplitude envelope.
    pub envelope: AdsrParameters,
    /// Formant bank controls.
    pub formant: FormantShape,
}

/// Atomic parameter store.
///
/// Wrap in an `Arc` to share it; every method takes `&self`.
///
/// # Example
///
/// ```rust
/// use glottis_synth::{ParamId, SharedParams, Vowel};
///
/// let params = SharedParams::new();
/// params.set(ParamId::Vowel, f32::from(Vowel::O.index()));
/// params.set(ParamId::OpenQuotient, 5.0); // clamped
///
/// let snap = params.snapshot();
/// assert_eq!(snap.formant.vowel, Vowel::O);
/// assert_eq!(snap.glottal.open_quotient, 0.7);
/// ```
#[derive(Debug)]
pub struct SharedParams {
    values: [AtomicU32; PARAM_COUNT],
}

impl Default for SharedParams {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedParams {
    /// Store holding every default.
    pub fn new() -> Self {
        Self {
            values: core::array::from_fn(|i| {
                AtomicU32::new(ParamId::ALL[i].default_value().to_bits())
            }),
        }
    }

    /// Current value.
    pub fn get(&self, id: ParamId) -> f32 {
        f32::from_bits(self.values[id.index()].load(Ordering::Acquire))
    }

    /// Clamp to the parameter's range and publish. Discrete parameters are
    /// rounded; NaN is ignored.
    pub fn set(&self, id: ParamId, value: f32) {
        if value.is_nan() {
            return;
        }
        let (min, max) = id.range();
        let mut value = value.clamp(min, max);
        if id.is_discrete() {
            value = libm::roundf(value);
        }
        self.values[id.index()].store(value.to_bits(), Ordering::Release);
    }

    /// Publish every field of `snapshot`.
    pub fn store(&self, snapshot: &ParamSnapshot) {
        let env = snapshot.envelope;
        let glottal = snapshot.glottal;
        let formant = snapshot.formant;
        self.set(ParamId::Attack, env.attack);
        self.set(ParamId::Decay, env.decay);
        self.set(ParamId::Sustain, env.sustain);
        self.set(ParamId::Release, env.release);
        self.set(ParamId::Wave, f32::from(snapshot.wave.index()));
        self.set(ParamId::OpenQuotient, glottal.open_quotient);
        self.set(ParamId::Asymmetry, glottal.asymmetry);
        self.set(ParamId::Breathiness, glottal.breathiness);
        self.set(ParamId::Tenseness, glottal.tenseness);
        self.set(ParamId::Vowel, f32::from(formant.vowel.index()));
        self.set(ParamId::FormantShift, formant.shift);
        self.set(ParamId::FormantSpread, formant.spread);
        self.set(ParamId::BandwidthScale, formant.bandwidth_scale);
        self.set(ParamId::ResonanceGain, formant.resonance_gain);
        self.set(ParamId::HarmonicAlignment, if formant.harmonic_alignment { 1.0 } else { 0.0 });
    }

    /// Read every parameter.
    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            wave: WaveType::from_index(self.get(ParamId::Wave) as u8),
            glottal: GlottalShape {
                open_quotient: self.get(ParamId::OpenQuotient),
                asymmetry: self.get(ParamId::Asymmetry),
                breathiness: self.get(ParamId::Breathiness),
                tenseness: self.get(ParamId::Tenseness),
            },
            envelope: AdsrParameters {
                attack: self.get(ParamId::Attack),
                decay: self.get(ParamId::Decay),
                sustain: self.get(ParamId::Sustain),
                release: self.get(ParamId::Release),
            },
            formant: FormantShape {
                vowel: Vowel::from_index(self.get(ParamId::Vowel) as u8),
                shift: self.get(ParamId::FormantShift),
                spread: self.get(ParamId::FormantSpread),
                bandwidth_scale: self.get(ParamId::BandwidthScale),
                resonance_gain: self.get(ParamId::ResonanceGain),
                harmonic_alignment: self.get(ParamId::HarmonicAlignment) >= 0.5,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_snapshot_matches_component_defaults() {
        let snap = SharedParams::new().snapshot();
        assert_eq!(snap, ParamSnapshot::default());
    }

    #[test]
    fn param_table_is_consistent() {
        for (i, id) in ParamId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
            assert_eq!(ParamId::from_name(id.name()), Some(*id));
            let (min, max) = id.range();
            let d = id.default_value();
            assert!(min <= d && d <= max, "{} default {d} outside [{min}, {max}]", id.name());
        }
    }

    #[test]
    fn set_clamps_and_rounds() {
        let params = SharedParams::new();
        params.set(ParamId::Release, 99.0);
        assert_eq!(params.get(ParamId::Release), MAX_STAGE_SECONDS);
        params.set(ParamId::Vowel, 2.6);
        assert_eq!(params.get(ParamId::Vowel), 3.0);
        params.set(ParamId::Vowel, 40.0);
        assert_eq!(params.snapshot().formant.vowel, Vowel::U);
        params.set(ParamId::Sustain, f32::NAN);
        assert_eq!(params.get(ParamId::Sustain), 1.0);
    }

    #[test]
    fn store_then_snapshot() {
        let params = SharedParams::new();
        let mut snap = ParamSnapshot::default();
        snap.wave = WaveType::Sawtooth;
        snap.envelope.attack = 0.02;
        snap.formant.vowel = Vowel::I;
        snap.formant.harmonic_alignment = true;
        params.store(&snap);
        assert_eq!(params.snapshot(), snap);
    }
}
