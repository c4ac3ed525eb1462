//! Preset management commands.
//!
//! Provides commands to list, show, and save voice presets.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use glottis_config::{
    VoicePreset, factory_presets, list_user_presets, preset_name_from_path, user_presets_dir,
};

use super::common::load_preset;

#[derive(Args)]
pub struct PresetsArgs {
    #[command(subcommand)]
    command: PresetsCommand,
}

#[derive(Subcommand)]
enum PresetsCommand {
    /// List available presets (factory and user)
    List {
        /// Show only factory presets
        #[arg(long)]
        factory: bool,

        /// Show only user presets
        #[arg(long)]
        user: bool,
    },

    /// Show details of a preset
    Show {
        /// Preset name or path
        name: String,
    },

    /// Write a preset to a TOML file for editing
    Save {
        /// Preset name or path
        name: String,

        /// Destination file
        output: PathBuf,

        /// Overwrite if the file already exists
        #[arg(long)]
        force: bool,
    },
}

pub fn run(args: PresetsArgs) -> anyhow::Result<()> {
    match args.command {
        PresetsCommand::List { factory, user } => list_presets(factory, user),
        PresetsCommand::Show { name } => show_preset(&name),
        PresetsCommand::Save { name, output, force } => save_preset(&name, &output, force),
    }
}

fn list_presets(factory_only: bool, user_only: bool) -> anyhow::Result<()> {
    let show_factory = !user_only;
    let show_user = !factory_only;

    if show_factory {
        println!("Factory Presets:");
        println!("================");
        for (id, preset) in glottis_config::FACTORY_PRESET_NAMES.iter().zip(factory_presets()) {
            let desc = preset.description.as_deref().unwrap_or("");
            println!("  {:20} - {}", id, desc);
        }
        println!();
    }

    if show_user {
        println!("User Presets ({}):", user_presets_dir().display());
        println!("=============");
        let user_presets = list_user_presets();
        if user_presets.is_empty() {
            println!("  (none)");
            println!();
            println!("  Copy one with: glottis presets save <name> <dir>/<new>.toml\n");
        } else {
            for path in user_presets {
                let name = preset_name_from_path(&path).unwrap_or_else(|| "unknown".to_string());
                match VoicePreset::load(&path) {
                    Ok(preset) => {
                        let desc = preset.description.as_deref().unwrap_or("");
                        println!("  {:20} - {}", name, desc);
                    }
                    Err(_) => {
                        println!("  {:20} - (error loading)", name);
                    }
                }
            }
        }
        println!();
    }

    Ok(())
}

fn show_preset(name: &str) -> anyhow::Result<()> {
    let (preset, base_dir) = load_preset(name)?;

    println!("Preset: {}", preset.name);
    println!("{}", "=".repeat(8 + preset.name.len()));
    println!();

    if let Some(desc) = &preset.description {
        println!("Description: {}", desc);
        println!();
    }

    let osc = &preset.oscillator;
    println!("Oscillator:");
    println!("  wave          = {:?}", osc.wave);
    println!("  open quotient = {}", osc.open_quotient);
    println!("  asymmetry     = {}", osc.asymmetry);
    println!("  breathiness   = {}", osc.breathiness);
    println!("  tenseness     = {}", osc.tenseness);
    println!();

    let env = &preset.envelope;
    println!("Envelope:");
    println!(
        "  A {}s  D {}s  S {}  R {}s",
        env.attack, env.decay, env.sustain, env.release
    );
    println!();

    let formant = &preset.formant;
    println!("Formants:");
    println!("  vowel              = {:?}", formant.vowel);
    println!("  shift              = {}", formant.shift);
    println!("  spread             = {}", formant.spread);
    println!("  bandwidth scale    = {}", formant.bandwidth_scale);
    println!("  resonance gain     = {}", formant.resonance_gain);
    println!("  harmonic alignment = {}", formant.harmonic_alignment);
    println!();

    let tuning = &preset.tuning;
    println!("Tuning:");
    if !tuning.is_retuning() {
        println!("  12-TET");
    }
    if let Some(path) = tuning.scale_path(base_dir.as_deref()) {
        println!("  scale        = {}", path.display());
    }
    if let Some(path) = tuning.keyboard_map_path(base_dir.as_deref()) {
        println!("  keyboard map = {}", path.display());
    }
    if let Some(hz) = tuning.reference_frequency {
        println!("  reference    = {} Hz", hz);
    }

    Ok(())
}

fn save_preset(name: &str, output: &Path, force: bool) -> anyhow::Result<()> {
    if output.exists() && !force {
        anyhow::bail!("{} already exists. Use --force to overwrite.", output.display());
    }

    let (mut preset, base_dir) = load_preset(name)?;
    // Relative tuning paths would dangle once the file moves.
    preset.tuning.scale = preset.tuning.scale_path(base_dir.as_deref());
    preset.tuning.keyboard_map = preset.tuning.keyboard_map_path(base_dir.as_deref());
    preset.save(output)?;

    println!("Saved preset '{}' to {}", preset.name, output.display());
    Ok(())
}
