//! Glottis Synth - vocal synthesis building blocks
//!
//! Turns note events into a sung vowel by chaining a glottal source, a
//! parallel formant filter bank, and an amplitude envelope.
//!
//! # Sources
//!
//! - [`GlottalOscillator`] - LF-model glottal pulse with breath noise
//! - [`SawOscillator`] - PolyBLEP sawtooth, the alternative source
//! - [`OscillatorEngine`] / [`WaveType`] - selects one and fills blocks
//!
//! # Shaping
//!
//! - [`FormantFilterBank`] - three parallel band-passes per channel, five vowels
//! - [`EnvelopeGenerator`] / [`AdsrParameters`] - linear ADSR
//!
//! # Voices
//!
//! - [`Voice`] - capability trait the pool drives
//! - [`VocalVoice`] - oscillator, gain, formants, envelope
//! - [`VocalSynth`] - fixed pool with oldest-note stealing and pitch wheel
//! - [`NoteTuning`] - note-to-frequency seam, [`EqualTemperament`] by default
//!
//! # Control
//!
//! - [`SharedParams`] - atomic parameter store read as a [`ParamSnapshot`]
//!
//! # Example
//!
//! ```rust
//! use glottis_core::AudioBuffer;
//! use glottis_synth::{EqualTemperament, ParamId, SharedParams, VocalSynth, Vowel};
//!
//! let params = SharedParams::new();
//! params.set(ParamId::Vowel, f32::from(Vowel::A.index()));
//!
//! let mut synth: VocalSynth<8> = VocalSynth::new();
//! synth.prepare(48000.0, 256, 2);
//! synth.apply_params(&params.snapshot());
//! synth.note_on(57, 100, &EqualTemperament);
//!
//! let mut out = AudioBuffer::new(2, 256);
//! synth.render(&mut out, 0, 256);
//! ```
//!
//! # no_std Support
//!
//! ```toml
//! [dependencies]
//! glottis-synth = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod envelope;
pub mod formant;
pub mod glottal;
pub mod osc_engine;
pub mod oscillator;
pub mod params;
pub mod synth;
pub mod tuning;
pub mod voice;

pub use envelope::{AdsrParameters, EnvelopeGenerator, EnvelopeState};
pub use formant::{
    FORMANT_TABLE, Formant, FormantDesign, FormantFilterBank, FormantProfile, FormantShape, Vowel,
};
pub use glottal::{GlottalOscillator, GlottalShape};
pub use osc_engine::{OscillatorEngine, WaveType};
pub use oscillator::{NoiseSource, SawOscillator};
pub use params::{PARAM_COUNT, ParamId, ParamSnapshot, SharedParams};
pub use synth::{CC_ALL_NOTES_OFF, PITCH_BEND_RANGE_SEMITONES, VocalSynth};
pub use tuning::{EqualTemperament, NoteTuning};
pub use voice::{VOICE_GAIN, VocalVoice, Voice, VoiceState, pitch_wheel_ratio};
