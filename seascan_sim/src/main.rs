// seascan_sim/src/main.rs

mod cli;
mod config;
mod scene;

use clap::Parser;
use log::{info, warn};
use seascan_core::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = cli::Cli::parse();

    let mut scenario = config::load_scenario(&cli.scenario)?;
    if let Some(ticks) = cli.ticks {
        scenario.run.ticks = ticks;
    }
    info!(
        "scenario '{}': {} ticks, {} points/tick, window [{}, {}) m",
        cli.scenario.display(),
        scenario.run.ticks,
        scenario.scene.points_per_tick,
        scenario.sensor.min_range,
        scenario.sensor.max_range,
    );

    let ctx = ComputeContext::with_threads(cli.threads)?;
    let mut sonar = SideScanSonar::new(scenario.sensor.clone(), ctx)?;
    let scene = scene::SurveyScene::new(scenario.scene.clone());
    info!("sonar ready: {} range bins", sonar.grid().bin_count());

    let mut skipped = 0u64;
    let mut dropped = 0u64;
    for tick in 0..scenario.run.ticks {
        let frame = scene.frame(tick, scenario.run.seed);
        if sonar.scan(&frame)? {
            dropped += u64::from(sonar.dropped_point_count());
        } else {
            skipped += 1;
        }
    }

    if skipped > 0 {
        warn!("{skipped} of {} ticks produced no scan", scenario.run.ticks);
    }
    info!(
        "survey complete: {} rows, {} points dropped by the coverage filter",
        scenario.run.ticks - skipped,
        dropped
    );

    let waterfall = sonar.waterfall();
    let image = image::RgbaImage::from_raw(
        waterfall.width() as u32,
        waterfall.height() as u32,
        waterfall.as_bytes().to_vec(),
    )
    .ok_or("waterfall buffer does not match its reported dimensions")?;
    image.save(&cli.output)?;
    info!("waterfall written to {}", cli.output.display());

    Ok(())
}
