//! Scala scale inspection command.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use glottis_tuning::Scale;

use super::common::parse_mode;

#[derive(Args)]
pub struct ScaleArgs {
    /// Scala .scl file
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Skip malformed lines instead of failing
    #[arg(long)]
    lenient: bool,
}

pub fn run(args: ScaleArgs) -> anyhow::Result<()> {
    let scale = Scale::load(&args.file, parse_mode(args.lenient))
        .with_context(|| format!("loading scale {}", args.file.display()))?;

    let description = if scale.description().is_empty() {
        "(no description)"
    } else {
        scale.description()
    };
    println!("Scale: {}", args.file.display());
    println!("Description: {description}");
    println!("Degrees: {}", scale.degree_count());
    if scale.declared_count() != scale.degree_count() {
        println!("Declared: {} (malformed lines skipped)", scale.declared_count());
    }
    println!("Period: {:.4} ({:.3} cents)", scale.period(), 1200.0 * scale.period().log2());
    println!();

    println!("{:>4}  {:>14}  {:>12}  {:>10}", "#", "degree", "ratio", "cents");
    println!("{:>4}  {:>14}  {:>12.6}  {:>10.3}", 0, "1/1", 1.0, 0.0);
    for (i, degree) in scale.degrees().iter().enumerate() {
        println!(
            "{:>4}  {:>14}  {:>12.6}  {:>10.3}",
            i + 1,
            degree.to_string(),
            degree.ratio(),
            degree.cents()
        );
    }
    Ok(())
}
