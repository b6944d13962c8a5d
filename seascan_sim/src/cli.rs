// seascan_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

/// Seascan: a headless side-scan sonar synthesis runner.
///
/// Tows a simulated sensor over a procedurally generated seafloor, runs the
/// full sonar pipeline every tick and writes the resulting waterfall image.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    #[arg(
        short,
        long,
        default_value = "assets/scenarios/default_survey.toml"
    )]
    pub scenario: PathBuf,

    /// Where to write the final waterfall image (PNG).
    #[arg(short, long, default_value = "waterfall.png")]
    pub output: PathBuf,

    /// Override the number of simulation ticks from the scenario.
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Pin the compute context to a fixed worker count (0 = automatic).
    #[arg(long, default_value_t = 0)]
    pub threads: usize,
}
