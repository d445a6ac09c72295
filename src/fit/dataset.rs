//! The `(dilution, percent)` dataset every curve strategy fits.
//!
//! Percent values come from an assay-specific [`PercentCalculator`] as
//! fractions and are stored on the 0–100 scale. Points are kept sorted by
//! dilution so raw-data cutoff interpolation can walk consecutive pairs.

use crate::domain::CurvePoint;
use crate::error::AppError;
use crate::math::{Crossing, cutoff_dilution};
use crate::plate::{WellData, WellDatum, WellGroupRef};

/// Converts a group's data point into a response fraction (nominally `0..=1`).
pub trait PercentCalculator {
    fn percent(&self, group: &WellGroupRef<'_>, data: &WellDatum<'_>) -> f64;
}

/// [`PercentCalculator`] backed by a closure; build with [`percent_fn`].
#[derive(Debug, Clone, Copy)]
pub struct FnPercent<F>(F);

/// Wrap a closure as a [`PercentCalculator`].
pub fn percent_fn<F>(f: F) -> FnPercent<F>
where
    F: Fn(&WellGroupRef<'_>, &WellDatum<'_>) -> f64,
{
    FnPercent(f)
}

impl<F> PercentCalculator for FnPercent<F>
where
    F: Fn(&WellGroupRef<'_>, &WellDatum<'_>) -> f64,
{
    fn percent(&self, group: &WellGroupRef<'_>, data: &WellDatum<'_>) -> f64 {
        (self.0)(group, data)
    }
}

/// Combined data of one or more well groups.
#[derive(Debug, Clone, PartialEq)]
pub struct DoseResponse {
    label: String,
    points: Vec<CurvePoint>,
}

impl DoseResponse {
    pub fn new(label: impl Into<String>, mut points: Vec<CurvePoint>) -> Self {
        points.sort_by(|a, b| a.dilution.total_cmp(&b.dilution));
        Self {
            label: label.into(),
            points,
        }
    }

    /// Collect every group's replicate-combined data and convert it to percent.
    pub fn from_groups<C>(groups: &[WellGroupRef<'_>], calculator: &C) -> Result<Self, AppError>
    where
        C: PercentCalculator + ?Sized,
    {
        let mut points = Vec::new();
        for group in groups {
            for datum in group.well_data(true)? {
                let Some(dilution) = datum.dilution() else {
                    let at = datum.position().map(|p| p.to_string()).unwrap_or_default();
                    return Err(AppError::invalid_input(format!(
                        "Well data {at} in group '{}' has no dilution.",
                        group.name()
                    )));
                };
                let percent = calculator.percent(group, &datum) * 100.0;
                points.push(CurvePoint { dilution, percent });
            }
        }

        let label = groups.iter().map(|g| g.name()).collect::<Vec<_>>().join(", ");
        Ok(Self::new(label, points))
    }

    /// Group name(s) the data came from.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Points ordered by dilution.
    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn min_percentage(&self) -> f64 {
        self.points.iter().map(|p| p.percent).fold(f64::NAN, f64::min)
    }

    pub fn max_percentage(&self) -> f64 {
        self.points.iter().map(|p| p.percent).fold(f64::NAN, f64::max)
    }

    pub fn min_dilution(&self) -> f64 {
        self.points.first().map(|p| p.dilution).unwrap_or(f64::NAN)
    }

    pub fn max_dilution(&self) -> f64 {
        self.points.last().map(|p| p.dilution).unwrap_or(f64::NAN)
    }

    /// Raw-data crossing of `percent` (0–100 scale), averaged over every
    /// bracketing pair of consecutive points.
    pub fn cutoff_dilution(&self, percent: f64, assume_decreasing: bool) -> f64 {
        cutoff_dilution(&self.points, percent, assume_decreasing, Crossing::Mean)
    }
}
