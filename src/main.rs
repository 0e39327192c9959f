mod analysis;
mod report;

use std::error::Error;
use std::path::PathBuf;

use analysis::run_study;
use clap::Parser;
use report::render_summary;
use trussopt::{benchmark, StudyDefinition};

/// Analyse a planar truss and size its elements for minimum mass.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// JSON study definition; the ten-bar benchmark is used when omitted.
    #[arg(long)]
    study: Option<PathBuf>,

    /// Only analyse the structure, skipping the sizing run.
    #[arg(long)]
    analysis_only: bool,

    /// Print the study definition as JSON and exit.
    #[arg(long)]
    print_study: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let study = match &cli.study {
        Some(path) => StudyDefinition::from_path(path)?,
        None => benchmark::ten_bar_study(),
    };
    if cli.print_study {
        println!("{}", study.to_json()?);
        return Ok(());
    }

    let summary = run_study(&study, !cli.analysis_only)?;
    println!("{}", render_summary(&summary));

    Ok(())
}
