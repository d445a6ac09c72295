//! Shared domain types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - passed between the plate model, the fitter and the reporting layer
//! - exported to JSON
//! - reloaded later for comparisons

use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Which curve fitting strategy to use for a dilution series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CurveFitType {
    /// Four-parameter logistic (asymmetry fixed at 1).
    #[value(name = "four")]
    #[serde(rename = "four")]
    FourParameter,
    /// Five-parameter logistic (asymmetry searched).
    #[value(name = "five")]
    #[serde(rename = "five")]
    FiveParameter,
    /// Least-squares polynomial in log10(dilution).
    Polynomial,
    /// No fit: the curve is the raw data.
    None,
}

impl CurveFitType {
    pub const ALL: [CurveFitType; 4] = [
        CurveFitType::FourParameter,
        CurveFitType::FiveParameter,
        CurveFitType::Polynomial,
        CurveFitType::None,
    ];

    /// Human-readable label, as shown in reports.
    pub fn label(self) -> &'static str {
        match self {
            CurveFitType::FourParameter => "Four Parameter",
            CurveFitType::FiveParameter => "Five Parameter",
            CurveFitType::Polynomial => "Polynomial",
            CurveFitType::None => "None",
        }
    }

    /// Short name accepted on the command line.
    pub fn cli_name(self) -> &'static str {
        match self {
            CurveFitType::FourParameter => "four",
            CurveFitType::FiveParameter => "five",
            CurveFitType::Polynomial => "polynomial",
            CurveFitType::None => "none",
        }
    }
}

impl std::fmt::Display for CurveFitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CurveFitType {
    type Err = AppError;

    /// Accepts either the report label (`"Four Parameter"`) or the CLI name
    /// (`"four"`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        CurveFitType::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(needle) || t.cli_name().eq_ignore_ascii_case(needle))
            .ok_or_else(|| AppError::unsupported_fit_type(needle))
    }
}

/// Which portion of the area under a curve to integrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AucKind {
    /// Signed area (negative response cancels positive response).
    Normal,
    /// Area above zero percent only.
    Positive,
    /// Area below zero percent only (reported as a non-positive number).
    Negative,
}

/// Best-fit logistic parameters.
///
/// Percent values (`min`, `max`) are on the 0–100 scale. `asymmetry` is 1 for
/// four-parameter fits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitParameters {
    pub min: f64,
    pub max: f64,
    /// Dilution at the inflection point.
    pub ec50: f64,
    pub slope: f64,
    pub asymmetry: f64,
    /// RMS error of the fit over all data points.
    pub fit_error: f64,
}

impl FitParameters {
    pub fn with_fit_error(self, fit_error: f64) -> Self {
        Self { fit_error, ..self }
    }

    /// Dilution at which the fitted logistic reaches `percent`.
    ///
    /// NaN when `percent` lies outside the open plateau range or the curve is
    /// flat.
    pub fn dilution_at(&self, percent: f64) -> f64 {
        crate::models::logistic_inverse(percent, self)
    }
}

/// Fitted polynomial in `log10(dilution)`, lowest order coefficient first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolynomialParameters {
    pub coefficients: Vec<f64>,
    pub fit_error: f64,
}

/// Parameters reported by a dilution curve, per strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CurveParameters {
    Logistic(FitParameters),
    Polynomial(PolynomialParameters),
    /// No fitting was performed.
    None,
}

impl CurveParameters {
    pub fn logistic(&self) -> Option<&FitParameters> {
        match self {
            CurveParameters::Logistic(p) => Some(p),
            _ => None,
        }
    }
}

/// One `(dilution, percent)` point; percent is on the 0–100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub dilution: f64,
    pub percent: f64,
}

/// Names of the CONTROL groups that bound a neutralization assay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlateControls {
    /// Cells only: the 100% neutralization reading.
    pub cell: String,
    /// Virus without serum: the 0% neutralization reading.
    pub virus: String,
}

impl Default for PlateControls {
    fn default() -> Self {
        Self {
            cell: "CELL_CONTROL".to_string(),
            virus: "VIRUS_CONTROL".to_string(),
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub fit_type: CurveFitType,
    /// Whether the response is expected to fall as dilution grows.
    pub assume_decreasing: bool,
    /// Cutoffs (fractions in `[0, 1]`) to report dilutions for.
    pub cutoffs: Vec<f64>,
    /// Area under the curve to report, if any.
    pub auc: Option<AucKind>,
    pub export_curve: Option<PathBuf>,

    /// Seed for the synthetic demo plate.
    pub sample_seed: u64,
    /// Number of specimens on the synthetic demo plate.
    pub sample_specimens: usize,
    /// Multiplicative (log-normal) noise level for synthetic well values.
    pub sample_noise: f64,
}

impl AucKind {
    pub fn label(self) -> &'static str {
        match self {
            AucKind::Normal => "AUC",
            AucKind::Positive => "pAUC",
            AucKind::Negative => "nAUC",
        }
    }
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            fit_type: CurveFitType::FourParameter,
            assume_decreasing: true,
            cutoffs: vec![0.5, 0.8],
            auc: None,
            export_curve: None,
            sample_seed: 42,
            sample_specimens: 5,
            sample_noise: 0.05,
        }
    }
}

/// A saved set of fitted curves (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub generated: DateTime<Utc>,
    pub plate: String,
    pub fit_type: CurveFitType,
    pub curves: Vec<CurveRecord>,
}

/// One fitted specimen inside a [`CurveFile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveRecord {
    pub group: String,
    pub parameters: CurveParameters,
    pub fit_error: f64,
    pub cutoffs: Vec<CutoffRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auc: Option<f64>,
    pub points: Vec<CurvePoint>,
}

/// Cutoff dilutions for one cutoff level.
///
/// Infinite dilutions are written as `null`, since JSON has no infinity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutoffRecord {
    pub cutoff: f64,
    pub curve_dilution: Option<f64>,
    pub interpolated_dilution: Option<f64>,
}
