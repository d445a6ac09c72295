//! Command-line parsing for the dilution curve fitter.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! plate model and the fitting code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{AucKind, CurveFitType};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "dcurve", version, about = "Dilution curve fitter for neutralization plates")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit every specimen on a plate described by a JSON file.
    Fit(FitArgs),
    /// Generate a synthetic neutralization plate and fit it.
    Demo(DemoArgs),
}

/// Options shared by every fitting command.
#[derive(Debug, Args, Clone)]
pub struct CurveArgs {
    /// Curve fitting strategy.
    #[arg(long, value_enum, env = "DCURVE_FIT_TYPE", default_value_t = CurveFitType::FourParameter)]
    pub fit_type: CurveFitType,

    /// Expect the response to rise with dilution instead of falling.
    #[arg(long)]
    pub increasing: bool,

    /// Cutoff fraction(s) to report dilutions for (repeatable).
    #[arg(long = "cutoff", value_name = "FRACTION", default_values_t = vec![0.5, 0.8])]
    pub cutoffs: Vec<f64>,

    /// Report the area under each fitted curve.
    #[arg(long, value_enum, value_name = "KIND")]
    pub auc: Option<AucKind>,

    /// Print fitted parameters for every specimen.
    #[arg(long)]
    pub params: bool,

    /// Export curves (parameters + cutoffs + sampled points) to JSON.
    #[arg(long = "export-curve", value_name = "JSON")]
    pub export_curve: Option<PathBuf>,
}

/// Options for fitting a plate file.
#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Plate description JSON.
    #[arg(long, value_name = "JSON")]
    pub plate: PathBuf,

    #[command(flatten)]
    pub curve: CurveArgs,
}

/// Options for the synthetic demo plate.
#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Number of specimens on the plate.
    #[arg(short = 'n', long, default_value_t = 5)]
    pub specimens: usize,

    /// Random seed for plate generation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Log-normal noise level applied to well readings.
    #[arg(long, default_value_t = 0.05)]
    pub noise: f64,

    /// Save the generated plate as JSON (readable by `dcurve fit --plate`).
    #[arg(long = "save-plate", value_name = "JSON")]
    pub save_plate: Option<PathBuf>,

    #[command(flatten)]
    pub curve: CurveArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fit_command() {
        let cli = Cli::try_parse_from([
            "dcurve", "fit", "--plate", "p.json", "--fit-type", "five", "--cutoff", "0.9", "--increasing",
        ])
        .unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.plate, PathBuf::from("p.json"));
        assert_eq!(args.curve.fit_type, CurveFitType::FiveParameter);
        assert_eq!(args.curve.cutoffs, vec![0.9]);
        assert!(args.curve.increasing);
        assert_eq!(args.curve.auc, None);
    }

    #[test]
    fn parses_auc_kind() {
        let cli = Cli::try_parse_from(["dcurve", "demo", "--auc", "positive"]).unwrap();
        let Command::Demo(args) = cli.command else {
            panic!("expected demo");
        };
        assert_eq!(args.curve.auc, Some(AucKind::Positive));
        assert!(Cli::try_parse_from(["dcurve", "demo", "--auc", "sideways"]).is_err());
    }

    #[test]
    fn demo_defaults() {
        let cli = Cli::try_parse_from(["dcurve", "demo"]).unwrap();
        let Command::Demo(args) = cli.command else {
            panic!("expected demo");
        };
        assert_eq!(args.specimens, 5);
        assert_eq!(args.curve.cutoffs, vec![0.5, 0.8]);
        assert!(args.save_plate.is_none());
    }
}
