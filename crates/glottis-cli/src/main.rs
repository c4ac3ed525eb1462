//! Glottis CLI - render sung notes to WAV and inspect tunings.

mod commands;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "glottis")]
#[command(author, version, about = "Glottis vocal synthesizer CLI", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render notes through the vocal engine into a WAV file
    Render(commands::render::RenderArgs),

    /// Show the degrees of a Scala scale file
    Scale(commands::scale::ScaleArgs),

    /// Print the pitch-bend retuning table for a scale
    Retune(commands::retune::RetuneArgs),

    /// List, show, and save voice presets
    Presets(commands::presets::PresetsArgs),
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Scale(args) => commands::scale::run(args),
        Commands::Retune(args) => commands::retune::run(args),
        Commands::Presets(args) => commands::presets::run(args),
    }
}
