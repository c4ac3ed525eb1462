//! Glottis Engine - the block render loop
//!
//! [`VocalEngine`] ties the pieces together for a host or an offline
//! renderer: it reads a [`SharedParams`](glottis_synth::SharedParams)
//! snapshot and the current [`SharedTuning`](glottis_tuning::SharedTuning)
//! at the top of every block, splits the block at MIDI event offsets, and
//! drives a fixed pool of vocal voices.
//!
//! Two [`RetuneMode`]s decide how microtonal pitches reach the voices:
//! directly as frequencies, or as substituted notes under pitch bend (the
//! stream is also exposed as MIDI out for external gear).

pub mod engine;

pub use engine::{MAX_VOICES, MIDI_OUT_CAPACITY, RetuneMode, VocalEngine};
