//! Block render loop: parameters, tuning, MIDI, voices.

use std::sync::Arc;

use glottis_core::AudioBuffer;
use glottis_synth::{EqualTemperament, NoteTuning, ParamSnapshot, SharedParams, VocalSynth};
use glottis_tuning::{MidiEvent, MidiMessage, PitchMapper, Retuner, SharedTuning};

/// Voices in the engine's pool.
pub const MAX_VOICES: usize = 8;

/// Initial capacity of the MIDI-out buffer; it only grows past this when
/// a block carries more events.
pub const MIDI_OUT_CAPACITY: usize = 1024;

/// How mapped frequencies reach the voices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RetuneMode {
    /// Each voice starts at the mapper's frequency.
    #[default]
    Direct,
    /// Notes go through the pitch-bend retuner first and voices play the
    /// substituted 12-TET note under the channel bend.
    PitchBend,
}

impl RetuneMode {
    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            RetuneMode::Direct => "direct",
            RetuneMode::PitchBend => "pitch-bend",
        }
    }

    /// Parse a name as produced by [`name`](Self::name).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "direct" => Some(RetuneMode::Direct),
            "pitch-bend" | "pitchbend" | "bend" => Some(RetuneMode::PitchBend),
            _ => None,
        }
    }
}

/// Polyphonic vocal engine.
///
/// Owned by the render thread. Control threads talk to it only through
/// the [`SharedParams`] and [`SharedTuning`] handles it was built with.
///
/// Each [`process`](Self::process) call:
///
/// 1. snapshots the parameters and pushes them into every voice
/// 2. picks up the current tuning (wait-free); the mapper it replaces is
///    handed back to [`SharedTuning`] so its memory is freed elsewhere
/// 3. in [`RetuneMode::PitchBend`], rewrites the incoming MIDI
/// 4. renders voices between event offsets so notes start sample-accurately
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use glottis_core::AudioBuffer;
/// use glottis_engine::VocalEngine;
/// use glottis_synth::SharedParams;
/// use glottis_tuning::{MidiEvent, SharedTuning};
///
/// let params = Arc::new(SharedParams::new());
/// let mut engine = VocalEngine::new(params, Arc::new(SharedTuning::default()));
/// engine.prepare(48000.0, 256, 2);
///
/// let mut out = AudioBuffer::new(2, 256);
/// engine.process(&mut out, &[MidiEvent::note_on(64, 0, 60, 100)]);
/// assert_eq!(engine.active_voice_count(), 1);
/// assert!(out.channel(0)[..64].iter().all(|&s| s == 0.0));
/// ```
#[derive(Debug)]
pub struct VocalEngine {
    synth: VocalSynth<MAX_VOICES>,
    params: Arc<SharedParams>,
    tuning: Arc<SharedTuning>,
    /// Mapper used for the current block.
    mapper: Arc<PitchMapper>,
    mode: RetuneMode,
    retuner: Retuner,
    midi_out: Vec<MidiEvent>,
    last_params: Option<ParamSnapshot>,
    sample_rate: f32,
    max_block_size: usize,
    num_channels: usize,
    prepared: bool,
}

impl VocalEngine {
    /// Engine reading from `params` and `tuning`. Call
    /// [`prepare`](Self::prepare) before processing.
    pub fn new(params: Arc<SharedParams>, tuning: Arc<SharedTuning>) -> Self {
        let mapper = tuning.load_full();
        Self {
            synth: VocalSynth::new(),
            params,
            tuning,
            mapper,
            mode: RetuneMode::default(),
            retuner: Retuner::new(),
            midi_out: Vec::new(),
            last_params: None,
            sample_rate: 0.0,
            max_block_size: 0,
            num_channels: 0,
            prepared: false,
        }
    }

    /// Allocate every buffer. Not real-time safe.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize, num_channels: usize) {
        tracing::info!(
            sample_rate,
            max_block_size,
            num_channels,
            voices = MAX_VOICES,
            "preparing engine"
        );
        self.synth.prepare(sample_rate, max_block_size, num_channels);
        self.midi_out = Vec::with_capacity(MIDI_OUT_CAPACITY);
        self.retuner.reset();
        self.last_params = None;
        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        self.num_channels = num_channels;
        self.prepared = self.synth.is_prepared() && num_channels > 0;
    }

    /// Whether [`prepare`](Self::prepare) succeeded.
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Sample rate given to `prepare`.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Largest block `process` handles in one call.
    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    /// Channel count given to `prepare`.
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Parameter store this engine reads.
    pub fn params(&self) -> &Arc<SharedParams> {
        &self.params
    }

    /// Tuning handle this engine reads.
    pub fn tuning(&self) -> &Arc<SharedTuning> {
        &self.tuning
    }

    /// Current retune mode.
    pub fn retune_mode(&self) -> RetuneMode {
        self.mode
    }

    /// Switch retune mode. Held notes are released, since their note-offs
    /// would otherwise arrive under the other mode.
    pub fn set_retune_mode(&mut self, mode: RetuneMode) {
        if mode == self.mode {
            return;
        }
        tracing::debug!(from = self.mode.name(), to = mode.name(), "retune mode changed");
        self.synth.all_notes_off();
        self.retuner.reset();
        self.mode = mode;
    }

    /// MIDI produced by the last `process` call: the retuned stream in
    /// pitch-bend mode, a copy of the input otherwise.
    pub fn midi_out(&self) -> &[MidiEvent] {
        &self.midi_out
    }

    /// Voices still sounding.
    pub fn active_voice_count(&self) -> usize {
        self.synth.active_voice_count()
    }

    /// The voice pool.
    pub fn synth(&self) -> &VocalSynth<MAX_VOICES> {
        &self.synth
    }

    /// Release every held note.
    pub fn all_notes_off(&mut self) {
        self.synth.all_notes_off();
    }

    /// Silence all voices and clear filter and oscillator state. Buffers
    /// are kept.
    pub fn reset(&mut self) {
        self.synth.reset();
        self.retuner.reset();
        self.midi_out.clear();
    }

    /// Render one block into `output`, overwriting it.
    ///
    /// `events` should be sorted by offset; an event earlier than one
    /// already handled takes effect at the current position. Offsets past
    /// the block end are handled at the end. Frames beyond the prepared
    /// block size are left silent.
    pub fn process(&mut self, output: &mut AudioBuffer, events: &[MidiEvent]) {
        debug_assert!(self.prepared, "VocalEngine::process called before prepare");
        output.clear();
        self.midi_out.clear();
        if !self.prepared {
            return;
        }
        if output.num_channels() != self.num_channels {
            // Host changed layout without re-preparing.
            self.prepare(self.sample_rate, self.max_block_size, output.num_channels());
        }

        let snapshot = self.params.snapshot();
        if self.last_params != Some(snapshot) {
            self.synth.apply_params(&snapshot);
            self.last_params = Some(snapshot);
        }

        let frames = output.len().min(self.max_block_size);
        self.tuning.refresh(&mut self.mapper);

        match self.mode {
            RetuneMode::Direct => {
                self.midi_out.extend_from_slice(events);
                render_events(&mut self.synth, &*self.mapper, output, events, frames);
            }
            RetuneMode::PitchBend => {
                self.retuner.process(&self.mapper, events, &mut self.midi_out);
                render_events(&mut self.synth, &EqualTemperament, output, &self.midi_out, frames);
            }
        }
    }
}

fn render_events<const N: usize>(
    synth: &mut VocalSynth<N>,
    tuning: &impl NoteTuning,
    output: &mut AudioBuffer,
    events: &[MidiEvent],
    frames: usize,
) {
    let mut position = 0;
    for event in events {
        let at = event.offset.min(frames);
        if at > position {
            synth.render(output, position, at - position);
            position = at;
        }
        handle_message(synth, tuning, event.message);
    }
    if frames > position {
        synth.render(output, position, frames - position);
    }
}

fn handle_message<const N: usize>(
    synth: &mut VocalSynth<N>,
    tuning: &impl NoteTuning,
    message: MidiMessage,
) {
    match message {
        MidiMessage::NoteOn { note, velocity, .. } => {
            synth.note_on(note, velocity, tuning);
        }
        MidiMessage::NoteOff { note, .. } => synth.note_off(note),
        MidiMessage::PitchBend { value, .. } => synth.set_pitch_wheel(value),
        MidiMessage::ControlChange { controller, value, .. } => {
            synth.control_change(controller, value);
        }
        MidiMessage::Other { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glottis_tuning::{ParseMode, Scale};

    const SR: f32 = 48000.0;
    const BLOCK: usize = 128;

    fn engine() -> VocalEngine {
        let tuning = Arc::new(SharedTuning::default());
        let mut engine = VocalEngine::new(Arc::new(SharedParams::new()), tuning);
        engine.prepare(SR, BLOCK, 1);
        engine
    }

    fn fifth_tuning() -> Arc<SharedTuning> {
        let scale = Scale::parse("Fifth\n2\n3/2\n2/1\n", ParseMode::Strict).unwrap();
        Arc::new(SharedTuning::new(PitchMapper::new().with_scale(scale)))
    }

    #[test]
    fn mode_names_roundtrip() {
        for mode in [RetuneMode::Direct, RetuneMode::PitchBend] {
            assert_eq!(RetuneMode::from_name(mode.name()), Some(mode));
        }
        assert_eq!(RetuneMode::from_name("nope"), None);
    }

    #[test]
    fn note_starts_at_its_offset() {
        let mut engine = engine();
        let mut out = AudioBuffer::new(1, BLOCK);
        engine.process(&mut out, &[MidiEvent::note_on(40, 0, 69, 127)]);
        assert!(out.channel(0)[..40].iter().all(|&s| s == 0.0));
        assert!(out.channel(0)[40..].iter().any(|&s| s != 0.0));
    }

    #[test]
    fn output_is_overwritten_each_block() {
        let mut engine = engine();
        let mut out = AudioBuffer::new(1, BLOCK);
        out.channel_mut(0).fill(0.5);
        engine.process(&mut out, &[]);
        assert_eq!(out.peak(), 0.0);
    }

    #[test]
    fn direct_mode_uses_mapper_frequency() {
        let mut engine = VocalEngine::new(Arc::new(SharedParams::new()), fifth_tuning());
        engine.prepare(SR, BLOCK, 1);
        let mut out = AudioBuffer::new(1, BLOCK);
        engine.process(&mut out, &[MidiEvent::note_on(0, 0, 61, 100)]);

        let c4 = 440.0 * 2f32.powf(-9.0 / 12.0);
        let voice = engine.synth().voices().iter().find(|v| v.note() == 61).unwrap();
        assert!((voice.frequency() - c4 * 1.5).abs() < 0.01);
        assert_eq!(engine.midi_out().len(), 1);
    }

    #[test]
    fn pitch_bend_mode_plays_substitute_under_bend() {
        let mut engine = VocalEngine::new(Arc::new(SharedParams::new()), fifth_tuning());
        engine.prepare(SR, BLOCK, 1);
        engine.set_retune_mode(RetuneMode::PitchBend);
        let mut out = AudioBuffer::new(1, BLOCK);
        engine.process(&mut out, &[MidiEvent::note_on(0, 0, 61, 100)]);

        assert_eq!(engine.midi_out().len(), 2);
        let voice = engine.synth().voices().iter().find(|v| v.note() == 67).unwrap();
        let c4 = 440.0 * 2f32.powf(-9.0 / 12.0);
        // Quantized bend lands within a cent of the target.
        assert!((voice.frequency() / (c4 * 1.5) - 1.0).abs() < 0.001);
    }

    #[test]
    fn parameter_changes_reach_voices() {
        let mut engine = engine();
        engine.params().set(glottis_synth::ParamId::Vowel, 4.0);
        let mut out = AudioBuffer::new(1, BLOCK);
        engine.process(&mut out, &[MidiEvent::note_on(0, 0, 60, 100)]);
        let voice = &engine.synth().voices()[0];
        assert_eq!(voice.formants().shape().vowel, glottis_synth::Vowel::U);
    }

    #[test]
    fn channel_change_reprepares() {
        let mut engine = engine();
        let mut out = AudioBuffer::new(2, BLOCK);
        engine.process(&mut out, &[MidiEvent::note_on(0, 0, 60, 100)]);
        assert_eq!(engine.num_channels(), 2);
        assert!(out.channel(1).iter().any(|&s| s != 0.0));
    }

    #[test]
    fn replaced_mapper_outlives_the_render_call() {
        let tuning = fifth_tuning();
        let mut engine = VocalEngine::new(Arc::new(SharedParams::new()), Arc::clone(&tuning));
        engine.prepare(SR, BLOCK, 1);
        let mut out = AudioBuffer::new(1, BLOCK);
        engine.process(&mut out, &[]);

        let fifth = Arc::downgrade(&tuning.load_full());
        tuning.clear();
        // The engine still holds the fifth mapper, so clearing freed nothing.
        assert!(fifth.upgrade().is_some());

        engine.process(&mut out, &[MidiEvent::note_on(0, 0, 61, 100)]);
        assert!(fifth.upgrade().is_some(), "render thread dropped the last reference");
        let voice = engine.synth().voices().iter().find(|v| v.note() == 61).unwrap();
        assert!((voice.frequency() - 277.18).abs() < 0.01);

        assert_eq!(tuning.collect_retired(), 1);
        assert!(fifth.upgrade().is_none());
    }
}
