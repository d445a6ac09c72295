//! Curve strategy selection.
//!
//! The factory gathers the percent data of one or more well groups and hands it
//! to the strategy named by [`CurveFitType`].

use tracing::debug;

use crate::domain::CurveFitType;
use crate::error::AppError;
use crate::fit::curve::DilutionCurve;
use crate::fit::dataset::{DoseResponse, PercentCalculator};
use crate::plate::{GroupId, Plate, WellGroupRef};

/// Builds dilution curves for well groups.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurveFitFactory;

impl CurveFitFactory {
    /// Fit one curve over the combined data of `groups`.
    pub fn curve<C>(
        groups: &[WellGroupRef<'_>],
        assume_decreasing: bool,
        calculator: &C,
        fit_type: CurveFitType,
    ) -> Result<DilutionCurve, AppError>
    where
        C: PercentCalculator + ?Sized,
    {
        let data = DoseResponse::from_groups(groups, calculator)?;
        debug!(
            groups = data.label(),
            points = data.len(),
            fit_type = fit_type.label(),
            "fitting dilution curve"
        );
        DilutionCurve::fit(data, assume_decreasing, fit_type)
    }

    /// Fit one curve over a single group.
    pub fn curve_for_group<C>(
        group: WellGroupRef<'_>,
        assume_decreasing: bool,
        calculator: &C,
        fit_type: CurveFitType,
    ) -> Result<DilutionCurve, AppError>
    where
        C: PercentCalculator + ?Sized,
    {
        Self::curve(&[group], assume_decreasing, calculator, fit_type)
    }
}

impl Plate {
    /// Fit one curve over the groups `ids` of this plate.
    pub fn dilution_curve<C>(
        &self,
        ids: &[GroupId],
        assume_decreasing: bool,
        calculator: &C,
        fit_type: CurveFitType,
    ) -> Result<DilutionCurve, AppError>
    where
        C: PercentCalculator + ?Sized,
    {
        let groups = ids.iter().map(|id| self.group(*id)).collect::<Result<Vec<WellGroupRef<'_>>, _>>()?;
        CurveFitFactory::curve(&groups, assume_decreasing, calculator, fit_type)
    }
}
