//! Factory voice presets bundled with the library.
//!
//! Always available without files on disk. Each is a starting point for
//! one vowel colour; none of them retune.

use crate::VoicePreset;

/// Identifiers of every factory preset, in listing order.
pub static FACTORY_PRESET_NAMES: &[&str] =
    &["choir-ah", "breathy-oo", "bright-ee", "dark-oh", "saw-vowel"];

/// TOML content for factory presets, embedded at compile time.
static FACTORY_PRESETS_TOML: &[(&str, &str)] = &[
    ("choir-ah", CHOIR_AH),
    ("breathy-oo", BREATHY_OO),
    ("bright-ee", BRIGHT_EE),
    ("dark-oh", DARK_OH),
    ("saw-vowel", SAW_VOWEL),
];

const CHOIR_AH: &str = r#"
name = "Choir Ah"
description = "Open vowel, moderate breath, slow swell"

[oscillator]
wave = "glottal"
open_quotient = 0.6
asymmetry = 0.7
breathiness = 0.15
tenseness = 0.7

[envelope]
attack = 0.25
decay = 0.2
sustain = 0.9
release = 0.8

[formant]
vowel = "a"
shift = 1.0
spread = 1.0
bandwidth_scale = 1.2
resonance_gain = 1.0
"#;

const BREATHY_OO: &str = r#"
name = "Breathy Oo"
description = "Soft rounded vowel with lax, airy source"

[oscillator]
wave = "glottal"
open_quotient = 0.7
asymmetry = 0.4
breathiness = 0.6
tenseness = 0.3

[envelope]
attack = 0.4
decay = 0.3
sustain = 0.8
release = 1.2

[formant]
vowel = "u"
shift = 0.95
bandwidth_scale = 1.6
resonance_gain = 0.9
"#;

const BRIGHT_EE: &str = r#"
name = "Bright Ee"
description = "Tense closed vowel, pressed phonation"

[oscillator]
wave = "glottal"
open_quotient = 0.35
asymmetry = 1.4
breathiness = 0.02
tenseness = 1.0

[envelope]
attack = 0.05
decay = 0.15
sustain = 0.85
release = 0.3

[formant]
vowel = "i"
shift = 1.08
spread = 1.1
bandwidth_scale = 0.8
resonance_gain = 1.2
"#;

const DARK_OH: &str = r#"
name = "Dark Oh"
description = "Low, covered vowel with formants tracking the pitch"

[oscillator]
wave = "glottal"
open_quotient = 0.55
asymmetry = 0.9
breathiness = 0.08
tenseness = 0.6

[envelope]
attack = 0.15
decay = 0.2
sustain = 1.0
release = 0.6

[formant]
vowel = "o"
shift = 0.85
spread = 0.9
resonance_gain = 1.1
harmonic_alignment = true
"#;

const SAW_VOWEL: &str = r#"
name = "Saw Vowel"
description = "Sawtooth through the vowel filter, classic talk-box colour"

[oscillator]
wave = "sawtooth"

[envelope]
attack = 0.01
decay = 0.2
sustain = 0.7
release = 0.25

[formant]
vowel = "e"
bandwidth_scale = 1.0
resonance_gain = 0.8
"#;

/// Every factory preset, parsed.
pub fn factory_presets() -> Vec<VoicePreset> {
    FACTORY_PRESETS_TOML
        .iter()
        .filter_map(|(_, toml)| VoicePreset::from_toml(toml).ok())
        .collect()
}

/// Factory preset by identifier or display name, case-insensitive.
///
/// # Example
///
/// ```rust
/// use glottis_config::get_factory_preset;
///
/// let preset = get_factory_preset("choir-ah").unwrap();
/// assert_eq!(preset.name, "Choir Ah");
/// assert!(get_factory_preset("Choir Ah").is_some());
/// ```
pub fn get_factory_preset(name: &str) -> Option<VoicePreset> {
    let name_lower = name.to_lowercase();

    for (preset_name, toml) in FACTORY_PRESETS_TOML {
        if *preset_name == name_lower {
            return VoicePreset::from_toml(toml).ok();
        }
    }

    FACTORY_PRESETS_TOML
        .iter()
        .filter_map(|(_, toml)| VoicePreset::from_toml(toml).ok())
        .find(|preset| preset.name.to_lowercase() == name_lower)
}

/// Identifiers of all factory presets.
pub fn factory_preset_names() -> Vec<&'static str> {
    FACTORY_PRESETS_TOML.iter().map(|(name, _)| *name).collect()
}

/// Whether `name` names a factory preset.
pub fn is_factory_preset(name: &str) -> bool {
    get_factory_preset(name).is_some()
}
