//! Voice presets for glottis.
//!
//! A [`VoicePreset`] is one TOML file holding everything that shapes a
//! voice: source, envelope, formants, and optionally a scale and keyboard
//! mapping. Presets publish into a
//! [`SharedParams`](glottis_synth::SharedParams) store with
//! [`VoicePreset::apply`].
//!
//! # Example
//!
//! ```rust,no_run
//! use glottis_config::{VoicePreset, user_presets_dir};
//! use glottis_synth::SharedParams;
//!
//! let preset = VoicePreset::load("soft-ah.toml").unwrap();
//! let params = SharedParams::new();
//! preset.apply(&params);
//!
//! preset.save(user_presets_dir().join("soft-ah-copy.toml")).unwrap();
//! ```

mod error;
mod preset;

/// Platform-specific paths and preset lookup.
pub mod paths;

/// Factory presets bundled with the library.
pub mod factory_presets;

pub use error::ConfigError;
pub use factory_presets::{
    FACTORY_PRESET_NAMES, factory_preset_names, factory_presets, get_factory_preset,
    is_factory_preset,
};
pub use paths::{
    ensure_user_presets_dir, find_preset, list_user_presets, preset_name_from_path, resolve_preset,
    user_config_dir, user_presets_dir,
};
pub use preset::{
    EnvelopeSection, FormantSection, OscillatorSection, PresetVowel, PresetWave, TuningSection,
    VoicePreset,
};
