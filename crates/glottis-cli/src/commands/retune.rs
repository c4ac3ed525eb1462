//! Pitch-bend retuning table.

use std::path::PathBuf;

use clap::Args;
use glottis_tuning::equal_temperament_frequency;

use super::common::{load_mapper, parse_mode};

#[derive(Args)]
pub struct RetuneArgs {
    /// Scala .scl file
    #[arg(long)]
    scale: PathBuf,

    /// Scala keyboard mapping file
    #[arg(long)]
    kbm: Option<PathBuf>,

    /// Skip malformed scale lines instead of failing
    #[arg(long)]
    lenient: bool,

    /// Override the reference frequency in Hz
    #[arg(long)]
    reference: Option<f64>,

    /// First note of the table
    #[arg(long, default_value = "48", value_parser = clap::value_parser!(u8).range(0..=127))]
    from: u8,

    /// Last note of the table
    #[arg(long, default_value = "72", value_parser = clap::value_parser!(u8).range(0..=127))]
    to: u8,
}

pub fn run(args: RetuneArgs) -> anyhow::Result<()> {
    if args.from > args.to {
        anyhow::bail!("--from ({}) must not exceed --to ({})", args.from, args.to);
    }
    if let Some(hz) = args.reference
        && !(hz.is_finite() && hz > 0.0)
    {
        anyhow::bail!("reference frequency must be a positive number of Hz, got {hz}");
    }

    let mapper = load_mapper(&args.scale, args.kbm.as_deref(), parse_mode(args.lenient))?
        .with_reference_frequency(args.reference);

    if let Some(scale) = mapper.scale() {
        println!("Scale: {}", scale.description());
    }
    println!("Reference: {:.4} Hz", mapper.reference_frequency());
    println!();
    println!(
        "{:>4}  {:>11}  {:>11}  {:>5}  {:>9}  {:>5}",
        "note", "target Hz", "12-TET Hz", "sub", "cents", "bend"
    );

    for note in args.from..=args.to {
        let et = equal_temperament_frequency(f64::from(note));
        match mapper.retune(note) {
            Some(r) => println!(
                "{:>4}  {:>11.4}  {:>11.4}  {:>5}  {:>+9.3}  {:>5}",
                note, r.target_frequency, et, r.note, r.cents, r.pitch_bend
            ),
            None => println!(
                "{:>4}  {:>11}  {:>11.4}  {:>5}  {:>9}  {:>5}",
                note, "unmapped", et, "-", "-", "-"
            ),
        }
    }
    Ok(())
}
