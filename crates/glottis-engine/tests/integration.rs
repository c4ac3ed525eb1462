//! Integration tests for glottis-engine.
//!
//! Whole-block rendering under both retune modes, live tuning swaps, and
//! the precondition that `process` needs `prepare`.

use std::sync::Arc;
use std::time::Duration;

use glottis_core::AudioBuffer;
use glottis_engine::{RetuneMode, VocalEngine};
use glottis_synth::{ParamId, SharedParams};
use glottis_tuning::{
    MidiEvent, MidiMessage, ParseMode, PitchMapper, Scale, ScaleLoader, SharedTuning,
};

const SR: f32 = 48000.0;
const BLOCK: usize = 256;

fn engine_with(tuning: Arc<SharedTuning>) -> VocalEngine {
    let mut engine = VocalEngine::new(Arc::new(SharedParams::new()), tuning);
    engine.prepare(SR, BLOCK, 2);
    engine
}

fn render_blocks(engine: &mut VocalEngine, first: &[MidiEvent], blocks: usize) -> Vec<f32> {
    let mut out = AudioBuffer::new(2, BLOCK);
    let mut collected = Vec::with_capacity(blocks * BLOCK);
    for i in 0..blocks {
        let events = if i == 0 { first } else { &[] };
        engine.process(&mut out, events);
        collected.extend_from_slice(out.channel(0));
    }
    collected
}

// ---------------------------------------------------------------------------
// 1. Rendering
// ---------------------------------------------------------------------------

#[test]
fn chord_renders_bounded_audio() {
    let mut engine = engine_with(Arc::new(SharedTuning::default()));
    let chord = [
        MidiEvent::note_on(0, 0, 60, 100),
        MidiEvent::note_on(0, 0, 64, 100),
        MidiEvent::note_on(0, 0, 67, 100),
    ];
    let samples = render_blocks(&mut engine, &chord, 40);
    assert_eq!(engine.active_voice_count(), 3);
    assert!(samples.iter().all(|s| s.is_finite()));
    let peak = samples.iter().fold(0.0f32, |a, s| a.max(s.abs()));
    assert!(peak > 0.01, "peak {peak}");
    assert!(peak < 3.0, "peak {peak}");
}

#[test]
fn released_notes_fall_silent() {
    let mut engine = engine_with(Arc::new(SharedTuning::default()));
    engine.params().set(ParamId::Release, 0.01);
    let _ = render_blocks(&mut engine, &[MidiEvent::note_on(0, 0, 57, 100)], 4);

    let mut out = AudioBuffer::new(2, BLOCK);
    engine.process(&mut out, &[MidiEvent::note_off(0, 0, 57)]);
    for _ in 0..20 {
        engine.process(&mut out, &[]);
    }
    assert_eq!(engine.active_voice_count(), 0);
    assert_eq!(out.peak(), 0.0);
}

#[test]
fn all_notes_off_controller_releases() {
    let mut engine = engine_with(Arc::new(SharedTuning::default()));
    let notes = [MidiEvent::note_on(0, 0, 60, 100), MidiEvent::note_on(0, 0, 62, 100)];
    let _ = render_blocks(&mut engine, &notes, 2);
    let mut out = AudioBuffer::new(2, BLOCK);
    engine.process(
        &mut out,
        &[MidiEvent::new(0, MidiMessage::ControlChange { channel: 0, controller: 123, value: 0 })],
    );
    assert!(engine.synth().voices().iter().all(|v| v.state() != glottis_synth::VoiceState::Active));
}

// ---------------------------------------------------------------------------
// 2. Tuning
// ---------------------------------------------------------------------------

#[test]
fn tuning_swap_applies_to_next_note() {
    let tuning = Arc::new(SharedTuning::default());
    let mut engine = engine_with(Arc::clone(&tuning));
    let mut out = AudioBuffer::new(2, BLOCK);

    engine.process(&mut out, &[MidiEvent::note_on(0, 0, 61, 100)]);
    let before = engine.synth().voices()[0].frequency();

    let fifths = Scale::parse("Fifth\n2\n3/2\n2/1\n", ParseMode::Strict).unwrap();
    tuning.store(PitchMapper::new().with_scale(fifths));
    engine.process(&mut out, &[MidiEvent::note_on(0, 0, 61, 100)]);
    let after = engine.synth().voices()[1].frequency();

    assert!((before - 277.18).abs() < 0.05, "{before}");
    assert!((after - 392.44).abs() < 0.05, "{after}");
}

#[test]
fn background_load_reaches_engine() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("pelog.scl");
    std::fs::write(&path, "Pelog\n7\n120.0\n270.0\n540.0\n670.0\n785.0\n950.0\n2/1\n").unwrap();

    let tuning = Arc::new(SharedTuning::default());
    let loader = ScaleLoader::new(Arc::clone(&tuning));
    let mut engine = engine_with(Arc::clone(&tuning));

    loader.request(&path, ParseMode::Strict);
    assert!(loader.wait(Duration::from_secs(5)).unwrap().is_success());

    let mut out = AudioBuffer::new(2, BLOCK);
    engine.process(&mut out, &[MidiEvent::note_on(0, 0, 62, 100)]);
    let c4 = 440.0 * 2f32.powf(-9.0 / 12.0);
    let expected = c4 * 2f32.powf(270.0 / 1200.0);
    assert!((engine.synth().voices()[0].frequency() - expected).abs() < 0.01);
}

#[test]
fn pitch_bend_mode_exposes_retuned_midi() {
    let fifths = Scale::parse("Fifth\n2\n3/2\n2/1\n", ParseMode::Strict).unwrap();
    let tuning = SharedTuning::new(PitchMapper::new().with_scale(fifths));
    let mut engine = engine_with(Arc::new(tuning));
    engine.set_retune_mode(RetuneMode::PitchBend);

    let mut out = AudioBuffer::new(2, BLOCK);
    let events = [MidiEvent::note_on(17, 0, 61, 100), MidiEvent::note_off(200, 0, 61)];
    engine.process(&mut out, &events);

    let midi = engine.midi_out();
    assert_eq!(midi.len(), 4);
    assert!(matches!(midi[0].message, MidiMessage::PitchBend { .. }));
    assert_eq!(midi[1].message, MidiMessage::NoteOn { channel: 0, note: 67, velocity: 100 });
    assert_eq!(midi[1].offset, 17);
    assert_eq!(midi[3].message, MidiMessage::NoteOff { channel: 0, note: 67, velocity: 0 });
}

// ---------------------------------------------------------------------------
// 3. Contract
// ---------------------------------------------------------------------------

#[test]
#[cfg(debug_assertions)]
#[should_panic]
fn process_before_prepare_asserts_in_debug() {
    let mut engine =
        VocalEngine::new(Arc::new(SharedParams::new()), Arc::new(SharedTuning::default()));
    let mut out = AudioBuffer::new(2, BLOCK);
    engine.process(&mut out, &[MidiEvent::note_on(0, 0, 60, 100)]);
}

#[test]
#[cfg(not(debug_assertions))]
fn process_before_prepare_is_silent_in_release() {
    let mut engine =
        VocalEngine::new(Arc::new(SharedParams::new()), Arc::new(SharedTuning::default()));
    let mut out = AudioBuffer::new(2, BLOCK);
    out.channel_mut(0).fill(1.0);
    engine.process(&mut out, &[MidiEvent::note_on(0, 0, 60, 100)]);
    assert_eq!(out.peak(), 0.0);
}
