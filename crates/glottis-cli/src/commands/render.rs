//! Offline rendering of notes through the vocal engine.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, ValueEnum};
use glottis_core::AudioBuffer;
use glottis_engine::{RetuneMode, VocalEngine};
use glottis_io::{WavSink, WavSpec};
use glottis_synth::{ParamId, SharedParams, Vowel, WaveType};
use glottis_tuning::{MidiEvent, ScaleLoader, SharedTuning};

use super::common::{load_preset, parse_mode, wait_for_load};

/// Vowels for CLI
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CliVowel {
    A,
    E,
    I,
    O,
    U,
}

impl From<CliVowel> for Vowel {
    fn from(v: CliVowel) -> Self {
        match v {
            CliVowel::A => Vowel::A,
            CliVowel::E => Vowel::E,
            CliVowel::I => Vowel::I,
            CliVowel::O => Vowel::O,
            CliVowel::U => Vowel::U,
        }
    }
}

/// Source waveforms for CLI
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CliWave {
    Glottal,
    Sawtooth,
}

impl From<CliWave> for WaveType {
    fn from(w: CliWave) -> Self {
        match w {
            CliWave::Glottal => WaveType::Glottal,
            CliWave::Sawtooth => WaveType::Sawtooth,
        }
    }
}

/// Tuning paths for CLI
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum CliRetuneMode {
    /// Voices play the mapped frequency exactly
    #[default]
    Direct,
    /// MIDI is rewritten to nearest note plus channel bend
    PitchBend,
}

impl From<CliRetuneMode> for RetuneMode {
    fn from(m: CliRetuneMode) -> Self {
        match m {
            CliRetuneMode::Direct => RetuneMode::Direct,
            CliRetuneMode::PitchBend => RetuneMode::PitchBend,
        }
    }
}

#[derive(Args)]
pub struct RenderArgs {
    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// MIDI notes (comma-separated, e.g., "60,64,67")
    #[arg(
        long,
        required = true,
        value_delimiter = ',',
        value_parser = clap::value_parser!(u8).range(0..=127)
    )]
    notes: Vec<u8>,

    /// Start all notes together instead of one after another
    #[arg(long)]
    chord: bool,

    /// Voice preset name or path
    #[arg(short, long)]
    preset: Option<String>,

    /// Vowel (overrides the preset)
    #[arg(long, value_enum)]
    vowel: Option<CliVowel>,

    /// Source waveform (overrides the preset)
    #[arg(long, value_enum)]
    wave: Option<CliWave>,

    /// Scala scale file (overrides the preset's tuning)
    #[arg(long)]
    scale: Option<PathBuf>,

    /// Scala keyboard mapping file
    #[arg(long)]
    kbm: Option<PathBuf>,

    /// Skip malformed scale lines instead of failing
    #[arg(long)]
    lenient: bool,

    /// Seconds each note is held
    #[arg(long, default_value = "1.0")]
    note_length: f32,

    /// Seconds rendered after the last note-off
    #[arg(long, default_value = "1.0")]
    tail: f32,

    /// Sample rate
    #[arg(long, default_value = "48000")]
    sample_rate: u32,

    /// Output channels
    #[arg(long, default_value = "2", value_parser = clap::value_parser!(u16).range(1..=8))]
    channels: u16,

    /// Engine block size in samples
    #[arg(long, default_value = "512")]
    block_size: usize,

    /// Output bit depth (16, 24, or 32 for float)
    #[arg(long, default_value = "24")]
    bit_depth: u16,

    /// How scale tuning reaches the voices
    #[arg(long, value_enum, default_value = "direct")]
    retune_mode: CliRetuneMode,
}

/// A note event placed on the output timeline.
struct Scheduled {
    frame: u64,
    event: MidiEvent,
}

/// Note-ons and note-offs for the requested notes, sorted by frame.
///
/// At equal frames note-offs come first, so a repeated note is released
/// before it restarts.
fn schedule(notes: &[u8], chord: bool, note_frames: u64) -> Vec<Scheduled> {
    let mut events = Vec::with_capacity(notes.len() * 2);
    for (i, &note) in notes.iter().enumerate() {
        let start = if chord { 0 } else { i as u64 * note_frames };
        events.push(Scheduled {
            frame: start,
            event: MidiEvent::note_on(0, 0, note, 100),
        });
        events.push(Scheduled {
            frame: start + note_frames,
            event: MidiEvent::note_off(0, 0, note),
        });
    }
    events.sort_by_key(|s| (s.frame, s.event.message.is_note_on()));
    events
}

fn seconds_to_frames(seconds: f32, sample_rate: u32) -> u64 {
    (f64::from(seconds) * f64::from(sample_rate)).round() as u64
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    if args.sample_rate == 0 {
        anyhow::bail!("sample rate must be positive");
    }
    if args.block_size == 0 {
        anyhow::bail!("block size must be positive");
    }
    if args.note_length.is_nan() || args.note_length <= 0.0 {
        anyhow::bail!("note length must be positive, got {}", args.note_length);
    }
    if args.tail.is_nan() || args.tail < 0.0 {
        anyhow::bail!("tail must not be negative, got {}", args.tail);
    }

    let params = Arc::new(SharedParams::new());
    let tuning = Arc::new(SharedTuning::default());

    if let Some(name) = &args.preset {
        let (preset, base_dir) = load_preset(name)?;
        preset.apply(&params);
        tracing::info!(preset = %preset.name, "preset applied");
        if args.scale.is_none() && args.kbm.is_none() && preset.tuning.is_retuning() {
            tuning.store(preset.tuning.load_mapper(base_dir.as_deref())?);
        }
    }
    if let Some(vowel) = args.vowel {
        params.set(ParamId::Vowel, f32::from(Vowel::from(vowel).index()));
    }
    if let Some(wave) = args.wave {
        params.set(ParamId::Wave, f32::from(WaveType::from(wave).index()));
    }

    if args.scale.is_some() || args.kbm.is_some() {
        let loader = ScaleLoader::new(Arc::clone(&tuning));
        if let Some(path) = &args.scale {
            loader.request(path, parse_mode(args.lenient));
            wait_for_load(&loader, path)?;
        }
        if let Some(path) = &args.kbm {
            loader.request_keyboard_mapping(path);
            wait_for_load(&loader, path)?;
        }
    }

    let spec = WavSpec {
        channels: args.channels,
        sample_rate: args.sample_rate,
        bits_per_sample: args.bit_depth,
    };
    let mut sink = WavSink::create(&args.output, spec)?;

    let channels = usize::from(args.channels);
    let mut engine = VocalEngine::new(Arc::clone(&params), Arc::clone(&tuning));
    engine.set_retune_mode(args.retune_mode.into());
    engine.prepare(args.sample_rate as f32, args.block_size, channels);

    let note_frames = seconds_to_frames(args.note_length, args.sample_rate).max(1);
    let scheduled = schedule(&args.notes, args.chord, note_frames);
    let last_off = scheduled.last().map_or(0, |s| s.frame);
    let total_frames = last_off + seconds_to_frames(args.tail, args.sample_rate);

    let mut buffer = AudioBuffer::new(channels, args.block_size);
    let mut block_events = Vec::with_capacity(scheduled.len());
    let mut next = 0;
    let mut position = 0u64;
    let mut peak = 0.0f32;

    while position < total_frames {
        let frames = (total_frames - position).min(args.block_size as u64) as usize;
        let end = position + frames as u64;

        block_events.clear();
        while let Some(s) = scheduled.get(next)
            && s.frame < end
        {
            block_events.push(MidiEvent::new((s.frame - position) as usize, s.event.message));
            next += 1;
        }

        buffer.set_len(frames);
        engine.process(&mut buffer, &block_events);
        peak = peak.max(buffer.peak());
        sink.write_buffer(&buffer)?;
        position = end;
    }
    sink.finalize()?;

    if peak > 1.0 {
        tracing::warn!(peak, "render clipped; lower the velocity or resonance gain");
    }

    println!(
        "Rendered {} note(s), {:.2}s at {} Hz to {} (peak {:.3})",
        args.notes.len(),
        total_frames as f64 / f64::from(args.sample_rate),
        args.sample_rate,
        args.output.display(),
        peak
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glottis_tuning::MidiMessage;

    #[test]
    fn sequential_schedule_releases_before_next_note() {
        let events = schedule(&[60, 60], false, 100);
        let frames: Vec<u64> = events.iter().map(|s| s.frame).collect();
        assert_eq!(frames, vec![0, 100, 100, 200]);
        assert!(matches!(events[1].event.message, MidiMessage::NoteOff { note: 60, .. }));
        assert!(matches!(events[2].event.message, MidiMessage::NoteOn { note: 60, .. }));
    }

    #[test]
    fn chord_schedule_starts_together() {
        let events = schedule(&[60, 64, 67], true, 480);
        assert!(events[..3].iter().all(|s| s.frame == 0 && s.event.message.is_note_on()));
        assert!(events[3..].iter().all(|s| s.frame == 480));
    }

    #[test]
    fn seconds_round_to_frames() {
        assert_eq!(seconds_to_frames(0.5, 48000), 24000);
        assert_eq!(seconds_to_frames(0.0, 44100), 0);
    }
}
