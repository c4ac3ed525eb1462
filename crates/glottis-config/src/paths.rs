//! Platform-specific paths for user presets.
//!
//! - **User presets**: `~/.config/glottis/presets/` (Linux),
//!   `~/Library/Application Support/glottis/presets/` (macOS),
//!   `%APPDATA%\glottis\presets\` (Windows)
//!
//! # Example
//!
//! ```rust,no_run
//! use glottis_config::paths;
//!
//! println!("User presets: {:?}", paths::user_presets_dir());
//! if let Some(path) = paths::find_preset("my-voice") {
//!     println!("Found preset at: {:?}", path);
//! }
//! ```

use std::path::{Path, PathBuf};

use crate::{ConfigError, VoicePreset, get_factory_preset};

/// Application name used for directory paths.
const APP_NAME: &str = "glottis";

/// Subdirectory name for presets.
const PRESETS_SUBDIR: &str = "presets";

/// The user-specific presets directory. Falls back to `./glottis/presets`
/// when the platform config directory is unknown.
pub fn user_presets_dir() -> PathBuf {
    user_config_dir().join(PRESETS_SUBDIR)
}

/// The user-specific configuration directory.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join(APP_NAME)
}

/// Create the user presets directory if needed.
pub fn ensure_user_presets_dir() -> Result<PathBuf, ConfigError> {
    let dir = user_presets_dir();
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::create_dir(&dir, e))?;
    }
    Ok(dir)
}

/// Preset file for `name`: the user presets directory first (with or
/// without `.toml`), then `name` as a path.
pub fn find_preset(name: &str) -> Option<PathBuf> {
    find_preset_in(name, &user_presets_dir())
}

/// [`find_preset`] against an explicit presets directory.
pub fn find_preset_in(name: &str, presets_dir: &Path) -> Option<PathBuf> {
    let filename = if name.ends_with(".toml") {
        name.to_string()
    } else {
        format!("{name}.toml")
    };

    let user_path = presets_dir.join(&filename);
    if user_path.is_file() {
        return Some(user_path);
    }

    let path = PathBuf::from(name);
    path.is_file().then_some(path)
}

/// Resolve `name` to a preset: factory presets first, then the user
/// presets directory, then a direct path.
///
/// Returns the preset and, when it came from a file, that file's
/// directory for resolving relative tuning paths.
pub fn resolve_preset(name: &str) -> Result<(VoicePreset, Option<PathBuf>), ConfigError> {
    resolve_preset_in(name, &user_presets_dir())
}

/// [`resolve_preset`] against an explicit presets directory.
pub fn resolve_preset_in(
    name: &str,
    presets_dir: &Path,
) -> Result<(VoicePreset, Option<PathBuf>), ConfigError> {
    if let Some(preset) = get_factory_preset(name) {
        tracing::debug!(name, "using factory preset");
        return Ok((preset, None));
    }
    let Some(path) = find_preset_in(name, presets_dir) else {
        return Err(ConfigError::PresetNotFound(name.to_string()));
    };
    let preset = VoicePreset::load(&path)?;
    Ok((preset, path.parent().map(Path::to_path_buf)))
}

/// Preset files in the user presets directory.
pub fn list_user_presets() -> Vec<PathBuf> {
    list_presets_in_dir(&user_presets_dir())
}

/// `.toml` files in `dir`, sorted. Empty if the directory is missing.
pub fn list_presets_in_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut presets: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    presets.sort();
    presets
}

/// Preset name from a file path (the file stem).
///
/// ```rust
/// use glottis_config::paths::preset_name_from_path;
/// use std::path::Path;
///
/// assert_eq!(preset_name_from_path(Path::new("/p/soft-ah.toml")), Some("soft-ah".to_string()));
/// ```
pub fn preset_name_from_path(path: &Path) -> Option<String> {
    path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn user_dir_ends_with_app_name() {
        assert!(user_presets_dir().ends_with("glottis/presets"));
    }

    #[test]
    fn finds_by_name_in_presets_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("soft.toml"), "name = \"Soft\"\n").unwrap();
        assert_eq!(find_preset_in("soft", dir.path()), Some(dir.path().join("soft.toml")));
        assert_eq!(find_preset_in("soft.toml", dir.path()), Some(dir.path().join("soft.toml")));
        assert!(find_preset_in("hard", dir.path()).is_none());
    }

    #[test]
    fn factory_wins_over_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("choir-ah.toml"), "name = \"Impostor\"\n").unwrap();
        let (preset, base) = resolve_preset_in("choir-ah", dir.path()).unwrap();
        assert_eq!(preset.name, "Choir Ah");
        assert!(base.is_none());
    }

    #[test]
    fn direct_path_resolves_with_base_dir() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("mine.toml");
        fs::write(&file, "name = \"Mine\"\n").unwrap();
        let empty = TempDir::new().unwrap();
        let (preset, base) = resolve_preset_in(file.to_str().unwrap(), empty.path()).unwrap();
        assert_eq!(preset.name, "Mine");
        assert_eq!(base.as_deref(), Some(dir.path()));
    }

    #[test]
    fn unknown_name_is_not_found() {
        let empty = TempDir::new().unwrap();
        let err = resolve_preset_in("ghost", empty.path()).unwrap_err();
        assert!(matches!(err, ConfigError::PresetNotFound(ref n) if n == "ghost"));
    }

    #[test]
    fn lists_only_toml_sorted() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.toml"), "").unwrap();
        fs::write(dir.path().join("a.toml"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        let names: Vec<String> = list_presets_in_dir(dir.path())
            .iter()
            .filter_map(|p| preset_name_from_path(p))
            .collect();
        assert_eq!(names, ["a", "b"]);
        assert!(list_presets_in_dir(&dir.path().join("missing")).is_empty());
    }
}
