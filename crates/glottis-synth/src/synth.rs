//! Fixed-size pool of vocal voices.

use glottis_core::AudioBuffer;

use crate::params::ParamSnapshot;
use crate::tuning::NoteTuning;
use crate::voice::{VocalVoice, Voice, VoiceState, pitch_wheel_ratio};

/// Pitch-wheel range in semitones, each direction.
pub const PITCH_BEND_RANGE_SEMITONES: f32 = 2.0;

/// Controller number that releases every held note.
pub const CC_ALL_NOTES_OFF: u8 = 123;

/// Polyphonic vocal synth with `N` voices.
///
/// A new note takes the first idle voice; when none is idle the oldest
/// note is stolen.
///
/// # Example
///
/// ```rust
/// use glottis_core::AudioBuffer;
/// use glottis_synth::{EqualTemperament, VocalSynth};
///
/// let mut synth: VocalSynth<4> = VocalSynth::new();
/// synth.prepare(48000.0, 512, 2);
/// synth.note_on(60, 100, &EqualTemperament);
/// synth.note_on(64, 100, &EqualTemperament);
///
/// let mut out = AudioBuffer::new(2, 512);
/// synth.render(&mut out, 0, 512);
/// assert_eq!(synth.active_voice_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct VocalSynth<const N: usize> {
    voices: [VocalVoice; N],
    age_counter: u64,
    bend_ratio: f32,
    prepared: bool,
}

impl<const N: usize> Default for VocalSynth<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> VocalSynth<N> {
    /// Create an unprepared pool.
    pub fn new() -> Self {
        Self {
            voices: core::array::from_fn(|_| VocalVoice::new()),
            age_counter: 0,
            bend_ratio: 1.0,
            prepared: false,
        }
    }

    /// Prepare every voice. Allocates.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize, num_channels: usize) {
        for voice in &mut self.voices {
            voice.prepare(sample_rate, max_block_size, num_channels);
        }
        self.prepared = sample_rate > 0.0 && max_block_size > 0;
    }

    /// Whether [`prepare`](Self::prepare) has run.
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Push a parameter snapshot into every voice.
    pub fn apply_params(&mut self, params: &ParamSnapshot) {
        for voice in &mut self.voices {
            voice.apply_params(params);
        }
    }

    /// Number of voices.
    pub fn voice_count(&self) -> usize {
        N
    }

    /// Voices not idle.
    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    /// Read access to the pool.
    pub fn voices(&self) -> &[VocalVoice; N] {
        &self.voices
    }

    /// Start `note` at the frequency `tuning` gives it.
    ///
    /// Returns `false` without sounding when the note is unmapped. A
    /// velocity of zero is a note-off.
    pub fn note_on(&mut self, note: u8, velocity: u8, tuning: &impl NoteTuning) -> bool {
        if velocity == 0 {
            self.note_off(note);
            return false;
        }
        match tuning.frequency(note) {
            Some(freq) if freq > 0.0 && freq.is_finite() => {
                self.note_on_frequency(note, velocity, freq);
                true
            }
            _ => false,
        }
    }

    /// Start `note` at an explicit frequency.
    pub fn note_on_frequency(&mut self, note: u8, velocity: u8, frequency: f32) {
        if N == 0 {
            return;
        }
        let idx = self.allocate_voice();
        self.age_counter += 1;
        let voice = &mut self.voices[idx];
        if voice.is_active() {
            voice.stop(false);
        }
        voice.set_age(self.age_counter);
        voice.set_bend_ratio(self.bend_ratio);
        voice.start(note, velocity, frequency);
    }

    /// Release every held voice playing `note`.
    pub fn note_off(&mut self, note: u8) {
        for voice in &mut self.voices {
            if voice.state() == VoiceState::Active && voice.note() == note {
                voice.stop(true);
            }
        }
    }

    /// Release every held voice.
    pub fn all_notes_off(&mut self) {
        for voice in &mut self.voices {
            if voice.state() == VoiceState::Active {
                voice.stop(true);
            }
        }
    }

    /// Silence every voice immediately.
    pub fn kill_all(&mut self) {
        for voice in &mut self.voices {
            voice.stop(false);
        }
    }

    /// Apply a 14-bit pitch-wheel value to every voice.
    pub fn set_pitch_wheel(&mut self, value: u16) {
        self.bend_ratio = pitch_wheel_ratio(value, PITCH_BEND_RANGE_SEMITONES);
        for voice in &mut self.voices {
            voice.set_bend_ratio(self.bend_ratio);
        }
    }

    /// Current pitch-wheel multiplier.
    pub fn bend_ratio(&self) -> f32 {
        self.bend_ratio
    }

    /// Handle a control change. Only all-notes-off is acted on.
    pub fn control_change(&mut self, controller: u8, _value: u8) {
        if controller == CC_ALL_NOTES_OFF {
            self.all_notes_off();
        }
    }

    /// Add `count` frames from every sounding voice into `output` at `start`.
    pub fn render(&mut self, output: &mut AudioBuffer, start: usize, count: usize) {
        for voice in &mut self.voices {
            voice.render(output, start, count);
        }
    }

    /// Silence everything and clear filter and phase state.
    pub fn reset(&mut self) {
        for voice in &mut self.voices {
            voice.reset();
        }
        self.age_counter = 0;
        self.bend_ratio = 1.0;
    }

    fn allocate_voice(&self) -> usize {
        if let Some(idx) = self.voices.iter().position(|v| !v.is_active()) {
            return idx;
        }
        self.voices
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| v.age())
            .map_or(0, |(i, _)| i)
    }
}
