//! Waveform selection behind a single block-fill contract.

use glottis_core::AudioBuffer;

use crate::glottal::GlottalOscillator;
use crate::oscillator::SawOscillator;

/// Source waveform for a voice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WaveType {
    /// PolyBLEP sawtooth.
    Sawtooth,
    /// LF-model glottal pulse.
    #[default]
    Glottal,
}

impl WaveType {
    /// Stable index for atomic storage.
    pub fn index(self) -> u8 {
        match self {
            WaveType::Sawtooth => 0,
            WaveType::Glottal => 1,
        }
    }

    /// Inverse of [`index`](Self::index); unknown values map to the default.
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => WaveType::Sawtooth,
            _ => WaveType::Glottal,
        }
    }
}

/// Holds both generators and fills blocks from the selected one.
///
/// Both generators track the same frequency. On a switch the newly
/// selected generator picks up the outgoing one's phase, so the period
/// boundary does not jump mid-note.
///
/// Output is mono and broadcast identically to every channel.
#[derive(Debug, Clone, Default)]
pub struct OscillatorEngine {
    saw: SawOscillator,
    glottal: GlottalOscillator,
    wave: WaveType,
    prepared: bool,
}

impl OscillatorEngine {
    /// Create an unprepared engine using the glottal source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepare both generators for `sample_rate`.
    pub fn prepare(&mut self, sample_rate: f32) {
        self.saw.prepare(sample_rate);
        self.glottal.prepare(sample_rate);
        self.prepared = sample_rate > 0.0;
    }

    /// Whether [`prepare`](Self::prepare) has run.
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Select the active generator.
    pub fn set_wave_type(&mut self, wave: WaveType) {
        if wave == self.wave {
            return;
        }
        let saw_phase = self.saw.phase();
        let glottal_phase = self.glottal.phase();
        match wave {
            WaveType::Sawtooth => self.saw.set_phase(glottal_phase),
            WaveType::Glottal => self.glottal.set_phase(saw_phase),
        }
        self.wave = wave;
    }

    /// Active generator.
    pub fn wave_type(&self) -> WaveType {
        self.wave
    }

    /// Forward a frequency to both generators.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.saw.set_frequency(freq_hz);
        self.glottal.set_frequency(freq_hz);
    }

    /// Current frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.glottal.frequency()
    }

    /// Glottal generator, for shape control.
    pub fn glottal_mut(&mut self) -> &mut GlottalOscillator {
        &mut self.glottal
    }

    /// Glottal generator.
    pub fn glottal(&self) -> &GlottalOscillator {
        &self.glottal
    }

    /// Reset both phases.
    pub fn reset(&mut self) {
        self.saw.reset();
        self.glottal.reset();
    }

    /// Overwrite the active region of `buffer` with the selected waveform.
    ///
    /// Clears the buffer if the engine was never prepared.
    pub fn fill_block(&mut self, buffer: &mut AudioBuffer) {
        if !self.prepared || buffer.num_channels() == 0 {
            buffer.clear();
            return;
        }

        let mono = buffer.channel_mut(0);
        match self.wave {
            WaveType::Sawtooth => self.saw.process_block(mono),
            WaveType::Glottal => {
                for sample in mono.iter_mut() {
                    *sample = self.glottal.next_sample();
                }
            }
        }
        buffer.broadcast_first_channel();
    }
}
