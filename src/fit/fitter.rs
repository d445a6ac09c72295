//! Logistic curve fitting by brute-force grid search.
//!
//! For each candidate pair of plateaus `(min, max)`:
//! - the inflection dilution (EC50) is where the raw data crosses the midpoint
//!   `min + (max - min) / 2`; pairs without a crossing are skipped
//! - slope is swept as `tan(θ)` over 30 evenly spaced angles `θ` in `[0, π)`;
//!   five-parameter fits also sweep asymmetry over the angles themselves
//! - the RMS error of every candidate is computed (parallel)
//!
//! and the lowest-error candidate is kept. The plateau search steps by 10
//! percent from the observed extremes; it keeps going past "reasonable"
//! plateaus (below 0, above 100) only until a first feasible fit exists.

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::domain::{CurveFitType, FitParameters};
use crate::error::AppError;
use crate::fit::dataset::DoseResponse;
use crate::math::{angle_sweep, tangent_sweep};
use crate::models::logistic;

/// Plateau search step, in percent.
pub const PLATEAU_STEP: f64 = 10.0;

/// Maximum number of plateau steps away from the observed extremes.
const PLATEAU_STEPS: usize = 10;

/// Angles swept for slope and asymmetry.
pub const ANGLE_STEPS: usize = 30;

/// Fit a four- or five-parameter logistic to `data`.
pub fn fit_logistic(data: &DoseResponse, fit_type: CurveFitType) -> Result<FitParameters, AppError> {
    let asymmetries = match fit_type {
        CurveFitType::FourParameter => vec![1.0],
        CurveFitType::FiveParameter => angle_sweep(ANGLE_STEPS),
        other => return Err(AppError::unsupported_fit_type(other.label())),
    };
    let slopes = tangent_sweep(ANGLE_STEPS);

    // Slope outer, asymmetry inner: the enumeration order decides ties.
    let shapes: Vec<(f64, f64)> = slopes
        .iter()
        .flat_map(|&s| asymmetries.iter().map(move |&a| (s, a)))
        .collect();

    let min_percentage = data.min_percentage();
    let max_percentage = data.max_percentage();
    let mut best: Option<FitParameters> = None;

    for i in 0..=PLATEAU_STEPS {
        let min = min_percentage - PLATEAU_STEP * i as f64;
        if !(best.is_none() || min > -PLATEAU_STEP) {
            break;
        }
        for j in 0..=PLATEAU_STEPS {
            let max = max_percentage + PLATEAU_STEP * j as f64;
            if !(best.is_none() || max < 100.0 + PLATEAU_STEP) {
                break;
            }

            let absolute_cutoff = min + 0.5 * (max - min);
            let ec50 = data.cutoff_dilution(absolute_cutoff, true);
            if !ec50.is_finite() {
                trace!(min, max, absolute_cutoff, "no raw-data crossing; skipping plateau pair");
                continue;
            }

            let Some(candidate) = best_shape(data, min, max, ec50, &shapes) else {
                continue;
            };
            if best.is_none_or(|b| candidate.fit_error < b.fit_error) {
                best = Some(candidate);
            }
        }
    }

    let Some(best) = best else {
        return Err(AppError::fit_failed(format!(
            "{} fit failed for '{}': no inflection point found (percent range {:.2}..{:.2}, {} points).",
            fit_type.label(),
            data.label(),
            min_percentage,
            max_percentage,
            data.len()
        )));
    };

    debug!(
        group = data.label(),
        fit_type = fit_type.label(),
        min = best.min,
        max = best.max,
        ec50 = best.ec50,
        slope = best.slope,
        asymmetry = best.asymmetry,
        fit_error = best.fit_error,
        "logistic fit complete"
    );
    Ok(best)
}

/// Best slope/asymmetry for fixed plateaus and inflection.
///
/// Candidates are evaluated in parallel; the reduction keeps the lowest error
/// and breaks ties by enumeration index, so the result matches a serial scan.
fn best_shape(data: &DoseResponse, min: f64, max: f64, ec50: f64, shapes: &[(f64, f64)]) -> Option<FitParameters> {
    shapes
        .par_iter()
        .enumerate()
        .filter_map(|(idx, &(slope, asymmetry))| {
            let params = FitParameters {
                min,
                max,
                ec50,
                slope,
                asymmetry,
                fit_error: 0.0,
            };
            let err = rms_error(data, &params);
            err.is_finite().then_some((idx, params.with_fit_error(err)))
        })
        .reduce_with(|a, b| {
            if b.1.fit_error < a.1.fit_error || (b.1.fit_error == a.1.fit_error && b.0 < a.0) {
                b
            } else {
                a
            }
        })
        .map(|(_, params)| params)
}

/// Root-mean-square distance between the logistic and the data.
pub fn rms_error(data: &DoseResponse, params: &FitParameters) -> f64 {
    let n = data.len();
    if n == 0 {
        return f64::NAN;
    }
    let sse: f64 = data
        .points()
        .iter()
        .map(|p| {
            let r = logistic(p.dilution, params) - p.percent;
            r * r
        })
        .sum();
    (sse / n as f64).sqrt()
}
