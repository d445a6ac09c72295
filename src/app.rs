//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads (or generates) a plate
//! - fits every specimen
//! - prints the summary
//! - writes optional exports

use clap::Parser;
use tracing::info;

use crate::cli::{Command, CurveArgs, DemoArgs, FitArgs};
use crate::domain::{FitConfig, PlateControls};
use crate::error::AppError;
use crate::plate::Plate;

pub mod pipeline;

/// Entry point for the `dcurve` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Demo(args) => handle_demo(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args.curve);
    let file = crate::io::read_plate_json(&args.plate)?;
    let plate = file.to_plate()?;
    info!(path = %args.plate.display(), plate = plate.name(), groups = plate.group_count(), "loaded plate");

    fit_and_report(&plate, &file.controls, &config, args.curve.params)
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = FitConfig {
        sample_seed: args.seed,
        sample_specimens: args.specimens,
        sample_noise: args.noise,
        ..fit_config_from_args(&args.curve)
    };
    let sample = crate::data::generate_sample(&config)?;

    if let Some(path) = &args.save_plate {
        let file = crate::io::PlateFile::from_plate(&sample.plate, &sample.controls);
        crate::io::write_plate_json(path, &file)?;
    }

    fit_and_report(&sample.plate, &sample.controls, &config, args.curve.params)
}

fn fit_and_report(plate: &Plate, controls: &PlateControls, config: &FitConfig, params: bool) -> Result<(), AppError> {
    let run = pipeline::run_fit(plate, controls, config)?;

    println!("{}", crate::report::format_run_summary(&run, config));
    if params {
        println!("{}", crate::report::format_parameters(&run));
    }

    if let Some(path) = &config.export_curve {
        crate::io::write_curve_json(path, &pipeline::curve_file(&run, config))?;
    }
    Ok(())
}

pub fn fit_config_from_args(args: &CurveArgs) -> FitConfig {
    FitConfig {
        fit_type: args.fit_type,
        assume_decreasing: !args.increasing,
        cutoffs: args.cutoffs.clone(),
        auc: args.auc,
        export_curve: args.export_curve.clone(),
        ..FitConfig::default()
    }
}
