//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - configuration enums (`CurveFitType`, `AucKind`) and `FitConfig`
//! - fit outputs (`FitParameters`, `CurveParameters`, `CurvePoint`)
//! - the exported curve file schema (`CurveFile`)

pub mod types;

pub use types::*;
