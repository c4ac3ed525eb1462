//! Shared CLI helpers used across multiple commands.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use glottis_config::{VoicePreset, resolve_preset};
use glottis_tuning::{KeyboardMapping, ParseMode, PitchMapper, Scale, ScaleLoader};

/// How long a command waits for the background loader.
const LOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Parse mode from a `--lenient` flag.
pub fn parse_mode(lenient: bool) -> ParseMode {
    if lenient { ParseMode::Lenient } else { ParseMode::Strict }
}

/// Load a preset by name or path.
///
/// Searches in this order:
/// 1. Factory presets (by name)
/// 2. User presets (by name)
/// 3. File path
///
/// Also returns the directory relative tuning paths resolve against.
pub fn load_preset(name: &str) -> anyhow::Result<(VoicePreset, Option<PathBuf>)> {
    resolve_preset(name).with_context(|| "use 'glottis presets list' to see available presets")
}

/// Build a mapper synchronously from a scale and optional keyboard mapping.
pub fn load_mapper(
    scale: &Path,
    kbm: Option<&Path>,
    mode: ParseMode,
) -> anyhow::Result<PitchMapper> {
    let scale = Scale::load(scale, mode)
        .with_context(|| format!("loading scale {}", scale.display()))?;
    let mut mapper = PitchMapper::new().with_scale(scale);
    if let Some(path) = kbm {
        let mapping =
            KeyboardMapping::load(path)
                .with_context(|| format!("loading keyboard mapping {}", path.display()))?;
        mapper = mapper.with_keyboard_mapping(mapping);
    }
    Ok(mapper)
}

/// Block until the loader reports on the most recent request.
pub fn wait_for_load(loader: &ScaleLoader, path: &Path) -> anyhow::Result<()> {
    let outcome = loader
        .wait(LOAD_TIMEOUT)
        .with_context(|| format!("timed out loading {}", path.display()))?;
    outcome
        .into_result()
        .with_context(|| format!("loading {}", path.display()))
}
