//! One note's render chain.
//!
//! ```text
//! OscillatorEngine -> gain (0.3) -> FormantFilterBank -> Envelope -> += output
//! ```
//!
//! All buffers are allocated in `prepare`; starting, stopping, and
//! rendering notes never allocate.

use glottis_core::AudioBuffer;
use libm::powf;

use crate::envelope::EnvelopeGenerator;
use crate::formant::FormantFilterBank;
use crate::osc_engine::OscillatorEngine;
use crate::params::ParamSnapshot;

/// Gain between the oscillator and the formant bank at full velocity.
pub const VOICE_GAIN: f32 = 0.3;

/// Capability interface for anything the voice pool can drive.
pub trait Voice {
    /// Whether this voice is able to render `note` at all.
    fn can_play(&self, note: u8) -> bool;

    /// Begin a note at `frequency` Hz.
    fn start(&mut self, note: u8, velocity: u8, frequency: f32);

    /// End the current note. With `allow_tail_off` the release stage
    /// runs; otherwise the voice goes silent immediately.
    fn stop(&mut self, allow_tail_off: bool);

    /// Add `count` frames of output into `output` starting at `start`.
    fn render(&mut self, output: &mut AudioBuffer, start: usize, count: usize);

    /// Whether the voice still produces sound.
    fn is_active(&self) -> bool;
}

/// Lifecycle of a [`VocalVoice`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VoiceState {
    /// Available for a new note.
    #[default]
    Idle,
    /// Note held.
    Active,
    /// Note released, envelope still ringing.
    Releasing,
}

/// Glottal source, formant bank, and envelope for a single note.
///
/// # Example
///
/// ```rust
/// use glottis_core::AudioBuffer;
/// use glottis_synth::{VocalVoice, Voice};
///
/// let mut voice = VocalVoice::new();
/// voice.prepare(48000.0, 256, 2);
/// voice.start(57, 100, 220.0);
///
/// let mut out = AudioBuffer::new(2, 256);
/// voice.render(&mut out, 0, 256);
/// assert!(voice.is_active());
/// ```
#[derive(Debug, Clone)]
pub struct VocalVoice {
    oscillator: OscillatorEngine,
    formants: FormantFilterBank,
    envelope: EnvelopeGenerator,
    scratch: AudioBuffer,

    state: VoiceState,
    note: u8,
    velocity: u8,
    age: u64,
    /// Frequency from the tuning source
    base_frequency: f32,
    /// Pitch-wheel multiplier
    bend_ratio: f32,
    prepared: bool,
}

impl Default for VocalVoice {
    fn default() -> Self {
        Self::new()
    }
}

impl VocalVoice {
    /// Create an unprepared idle voice.
    pub fn new() -> Self {
        Self {
            oscillator: OscillatorEngine::new(),
            formants: FormantFilterBank::new(),
            envelope: EnvelopeGenerator::new(),
            scratch: AudioBuffer::default(),
            state: VoiceState::Idle,
            note: 0,
            velocity: 0,
            age: 0,
            base_frequency: 220.0,
            bend_ratio: 1.0,
            prepared: false,
        }
    }

    /// Size the scratch buffer and prepare every stage.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize, num_channels: usize) {
        self.oscillator.prepare(sample_rate);
        self.formants.prepare(sample_rate, max_block_size, num_channels);
        self.envelope.prepare(sample_rate);
        self.scratch.resize(num_channels, max_block_size);
        self.state = VoiceState::Idle;
        self.prepared = sample_rate > 0.0 && max_block_size > 0;
    }

    /// Whether [`prepare`](Self::prepare) has run.
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Push a parameter snapshot into every stage.
    pub fn apply_params(&mut self, params: &ParamSnapshot) {
        self.oscillator.set_wave_type(params.wave);
        self.oscillator.glottal_mut().set_shape(params.glottal);
        self.envelope.set_parameters(params.envelope);
        self.formants.set_shape(params.formant);
    }

    /// Multiply the note's frequency, e.g. from the pitch wheel.
    pub fn set_bend_ratio(&mut self, ratio: f32) {
        self.bend_ratio = ratio;
        self.update_frequency();
    }

    /// Lifecycle state.
    pub fn state(&self) -> VoiceState {
        self.state
    }

    /// Note being played (or last played).
    pub fn note(&self) -> u8 {
        self.note
    }

    /// Velocity of the current note. Scales the source level linearly,
    /// 127 being full level.
    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    /// Allocation age; higher is newer.
    pub fn age(&self) -> u64 {
        self.age
    }

    /// Set the allocation age.
    pub fn set_age(&mut self, age: u64) {
        self.age = age;
    }

    /// Sounding frequency including bend.
    pub fn frequency(&self) -> f32 {
        self.oscillator.frequency()
    }

    /// Formant bank, for inspection.
    pub fn formants(&self) -> &FormantFilterBank {
        &self.formants
    }

    /// Envelope, for inspection.
    pub fn envelope(&self) -> &EnvelopeGenerator {
        &self.envelope
    }

    /// Silence the voice and clear all filter and phase state.
    pub fn reset(&mut self) {
        self.state = VoiceState::Idle;
        self.envelope.reset();
        self.oscillator.reset();
        self.formants.reset();
    }

    fn update_frequency(&mut self) {
        let freq = self.base_frequency * self.bend_ratio;
        self.oscillator.set_frequency(freq);
        self.formants.set_fundamental_frequency(freq);
    }
}

impl Voice for VocalVoice {
    fn can_play(&self, note: u8) -> bool {
        note <= 127
    }

    fn start(&mut self, note: u8, velocity: u8, frequency: f32) {
        self.note = note;
        self.velocity = velocity;
        self.base_frequency = frequency;
        self.update_frequency();
        self.envelope.note_on();
        self.state = VoiceState::Active;
    }

    fn stop(&mut self, allow_tail_off: bool) {
        if self.state == VoiceState::Idle {
            return;
        }
        if allow_tail_off {
            self.envelope.note_off();
            self.state = if self.envelope.is_active() {
                VoiceState::Releasing
            } else {
                VoiceState::Idle
            };
        } else {
            self.envelope.reset();
            self.state = VoiceState::Idle;
        }
    }

    fn render(&mut self, output: &mut AudioBuffer, start: usize, count: usize) {
        if self.state == VoiceState::Idle || !self.prepared || start >= output.len() {
            return;
        }
        let count = count.min(self.scratch.capacity()).min(output.len() - start);
        if count == 0 {
            return;
        }

        self.scratch.set_len(count);
        self.oscillator.fill_block(&mut self.scratch);
        let velocity_scale = f32::from(self.velocity) / 127.0;
        self.scratch.apply_gain(VOICE_GAIN * velocity_scale);
        self.formants.process(&mut self.scratch);
        self.envelope.apply_to_buffer(&mut self.scratch, 0, count);
        output.add_from(&self.scratch, start, count);

        if !self.envelope.is_active() {
            self.state = VoiceState::Idle;
        }
    }

    fn is_active(&self) -> bool {
        self.state != VoiceState::Idle
    }
}

/// Pitch-wheel value (14-bit, center 8192) to a frequency multiplier for a
/// symmetric range of `semitones`.
pub fn pitch_wheel_ratio(value: u16, semitones: f32) -> f32 {
    let normalized = (f32::from(value.min(16383)) - 8192.0) / 8192.0;
    powf(2.0, normalized * semitones / 12.0)
}
