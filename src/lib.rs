//! `dilution-curves` library crate.
//!
//! The binary (`dcurve`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the plate model and curve fitting are reusable outside the CLI
//!
//! Entry points:
//! - [`plate::Plate`]: wells, well groups, replicate combination, statistics
//! - [`fit::CurveFitFactory`]: dilution curves for one or more groups
//! - [`fit::DilutionCurve`]: curve samples, parameters, cutoff dilutions

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plate;
pub mod report;
