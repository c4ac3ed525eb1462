//! Voice preset file format and operations.

use std::path::{Path, PathBuf};

use glottis_synth::{
    AdsrParameters, FormantShape, GlottalShape, ParamSnapshot, SharedParams, Vowel, WaveType,
};
use glottis_tuning::{KeyboardMapping, ParseMode, PitchMapper, Scale};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Oscillator waveform as written in preset files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetWave {
    /// LF-model glottal pulse.
    #[default]
    Glottal,
    /// Band-limited sawtooth.
    Sawtooth,
}

impl From<PresetWave> for WaveType {
    fn from(wave: PresetWave) -> Self {
        match wave {
            PresetWave::Glottal => WaveType::Glottal,
            PresetWave::Sawtooth => WaveType::Sawtooth,
        }
    }
}

impl From<WaveType> for PresetWave {
    fn from(wave: WaveType) -> Self {
        match wave {
            WaveType::Glottal => PresetWave::Glottal,
            WaveType::Sawtooth => PresetWave::Sawtooth,
        }
    }
}

/// Vowel as written in preset files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetVowel {
    /// "ah"
    A,
    /// "eh"
    #[default]
    E,
    /// "ee"
    I,
    /// "oh"
    O,
    /// "oo"
    U,
}

impl From<PresetVowel> for Vowel {
    fn from(vowel: PresetVowel) -> Self {
        match vowel {
            PresetVowel::A => Vowel::A,
            PresetVowel::E => Vowel::E,
            PresetVowel::I => Vowel::I,
            PresetVowel::O => Vowel::O,
            PresetVowel::U => Vowel::U,
        }
    }
}

impl From<Vowel> for PresetVowel {
    fn from(vowel: Vowel) -> Self {
        match vowel {
            Vowel::A => PresetVowel::A,
            Vowel::E => PresetVowel::E,
            Vowel::I => PresetVowel::I,
            Vowel::O => PresetVowel::O,
            Vowel::U => PresetVowel::U,
        }
    }
}

/// `[oscillator]` table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscillatorSection {
    /// Source waveform.
    pub wave: PresetWave,
    /// Open fraction of the glottal cycle.
    pub open_quotient: f32,
    /// Skew of the glottal pulse.
    pub asymmetry: f32,
    /// Breath noise amount.
    pub breathiness: f32,
    /// Pulse amplitude and sharpness.
    pub tenseness: f32,
}

impl Default for OscillatorSection {
    fn default() -> Self {
        let shape = GlottalShape::default();
        Self {
            wave: PresetWave::default(),
            open_quotient: shape.open_quotient,
            asymmetry: shape.asymmetry,
            breathiness: shape.breathiness,
            tenseness: shape.tenseness,
        }
    }
}

/// `[envelope]` table. Times in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeSection {
    /// Attack time.
    pub attack: f32,
    /// Decay time.
    pub decay: f32,
    /// Sustain level.
    pub sustain: f32,
    /// Release time.
    pub release: f32,
}

impl Default for EnvelopeSection {
    fn default() -> Self {
        let adsr = AdsrParameters::default();
        Self {
            attack: adsr.attack,
            decay: adsr.decay,
            sustain: adsr.sustain,
            release: adsr.release,
        }
    }
}

/// `[formant]` table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormantSection {
    /// Vowel.
    pub vowel: PresetVowel,
    /// Frequency multiplier.
    pub shift: f32,
    /// F2/F3 spacing multiplier.
    pub spread: f32,
    /// Bandwidth multiplier.
    pub bandwidth_scale: f32,
    /// Output level multiplier.
    pub resonance_gain: f32,
    /// Snap formants to harmonics.
    pub harmonic_alignment: bool,
}

impl Default for FormantSection {
    fn default() -> Self {
        FormantShape::default().into()
    }
}

impl From<FormantShape> for FormantSection {
    fn from(shape: FormantShape) -> Self {
        Self {
            vowel: shape.vowel.into(),
            shift: shape.shift,
            spread: shape.spread,
            bandwidth_scale: shape.bandwidth_scale,
            resonance_gain: shape.resonance_gain,
            harmonic_alignment: shape.harmonic_alignment,
        }
    }
}

/// `[tuning]` table. Relative paths are resolved against the preset
/// file's directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningSection {
    /// `.scl` file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<PathBuf>,
    /// `.kbm` file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyboard_map: Option<PathBuf>,
    /// Parse the scale in strict mode.
    pub strict: bool,
    /// Override of the mapping's reference frequency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_frequency: Option<f64>,
}

impl Default for TuningSection {
    fn default() -> Self {
        Self {
            scale: None,
            keyboard_map: None,
            strict: true,
            reference_frequency: None,
        }
    }
}

impl TuningSection {
    /// Parse mode for the scale file.
    pub fn parse_mode(&self) -> ParseMode {
        if self.strict { ParseMode::Strict } else { ParseMode::Lenient }
    }

    /// Whether anything differs from plain 12-TET.
    pub fn is_retuning(&self) -> bool {
        self.scale.is_some() || self.keyboard_map.is_some()
    }

    /// Scale path resolved against `base_dir`.
    pub fn scale_path(&self, base_dir: Option<&Path>) -> Option<PathBuf> {
        self.scale.as_deref().map(|p| resolve(p, base_dir))
    }

    /// Keyboard-mapping path resolved against `base_dir`.
    pub fn keyboard_map_path(&self, base_dir: Option<&Path>) -> Option<PathBuf> {
        self.keyboard_map.as_deref().map(|p| resolve(p, base_dir))
    }

    /// Load the files synchronously and build a mapper.
    pub fn load_mapper(&self, base_dir: Option<&Path>) -> Result<PitchMapper, ConfigError> {
        let mut mapper = PitchMapper::new();
        if let Some(path) = self.scale_path(base_dir) {
            mapper = mapper.with_scale(Scale::load(&path, self.parse_mode())?);
        }
        if let Some(path) = self.keyboard_map_path(base_dir) {
            mapper = mapper.with_keyboard_mapping(KeyboardMapping::load(&path)?);
        }
        Ok(mapper.with_reference_frequency(self.reference_frequency))
    }
}

fn resolve(path: &Path, base_dir: Option<&Path>) -> PathBuf {
    match base_dir {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    }
}

fn default_name() -> String {
    "Untitled".to_string()
}

/// A complete voice setting: source, envelope, formants, and tuning.
///
/// Every table and field has a default, so partial files load.
///
/// # TOML Format
///
/// ```toml
/// name = "Choir Ah"
/// description = "Open vowel, moderate breath"
///
/// [oscillator]
/// wave = "glottal"
/// open_quotient = 0.6
/// breathiness = 0.2
///
/// [envelope]
/// attack = 0.15
/// release = 0.6
///
/// [formant]
/// vowel = "a"
///
/// [tuning]
/// scale = "scales/just.scl"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoicePreset {
    /// Name of the preset.
    #[serde(default = "default_name")]
    pub name: String,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Source settings.
    #[serde(default)]
    pub oscillator: OscillatorSection,

    /// Amplitude envelope.
    #[serde(default)]
    pub envelope: EnvelopeSection,

    /// Vocal-tract settings.
    #[serde(default)]
    pub formant: FormantSection,

    /// Scale and keyboard mapping.
    #[serde(default)]
    pub tuning: TuningSection,
}

impl Default for VoicePreset {
    fn default() -> Self {
        Self::new(default_name())
    }
}

impl VoicePreset {
    /// Preset with every default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            oscillator: OscillatorSection::default(),
            envelope: EnvelopeSection::default(),
            formant: FormantSection::default(),
            tuning: TuningSection::default(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Preset capturing a parameter snapshot. Tuning is left at defaults.
    pub fn from_snapshot(name: impl Into<String>, snapshot: &ParamSnapshot) -> Self {
        let mut preset = Self::new(name);
        preset.oscillator = OscillatorSection {
            wave: snapshot.wave.into(),
            open_quotient: snapshot.glottal.open_quotient,
            asymmetry: snapshot.glottal.asymmetry,
            breathiness: snapshot.glottal.breathiness,
            tenseness: snapshot.glottal.tenseness,
        };
        preset.envelope = EnvelopeSection {
            attack: snapshot.envelope.attack,
            decay: snapshot.envelope.decay,
            sustain: snapshot.envelope.sustain,
            release: snapshot.envelope.release,
        };
        preset.formant = snapshot.formant.into();
        preset
    }

    /// The synth-side view of this preset. Values are passed through
    /// unclamped; the DSP layer clamps them.
    pub fn to_snapshot(&self) -> ParamSnapshot {
        let osc = &self.oscillator;
        let env = &self.envelope;
        let fmt = &self.formant;
        ParamSnapshot {
            wave: osc.wave.into(),
            glottal: GlottalShape {
                open_quotient: osc.open_quotient,
                asymmetry: osc.asymmetry,
                breathiness: osc.breathiness,
                tenseness: osc.tenseness,
            },
            envelope: AdsrParameters {
                attack: env.attack,
                decay: env.decay,
                sustain: env.sustain,
                release: env.release,
            },
            formant: FormantShape {
                vowel: fmt.vowel.into(),
                shift: fmt.shift,
                spread: fmt.spread,
                bandwidth_scale: fmt.bandwidth_scale,
                resonance_gain: fmt.resonance_gain,
                harmonic_alignment: fmt.harmonic_alignment,
            },
        }
    }

    /// Publish every parameter into `params`.
    pub fn apply(&self, params: &SharedParams) {
        tracing::debug!(preset = %self.name, "applying preset");
        params.store(&self.to_snapshot());
    }

    /// Load a preset from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let preset: VoicePreset = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), name = %preset.name, "loaded preset");
        Ok(preset)
    }

    /// Load a preset from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the preset to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        tracing::info!(path = %path.display(), name = %self.name, "saved preset");
        Ok(())
    }

    /// Convert the preset to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
