//! Model evaluation for the logistic and polynomial curve families.
//!
//! The fitters rely on a few primitive operations:
//! - evaluate the logistic at a dilution for a parameter set
//! - invert the logistic (dilution for a given percent)
//! - build a polynomial design row in `log10(dilution)` (for OLS)
//! - predict a polynomial value

use crate::domain::FitParameters;

/// Evaluate the (4- or 5-parameter) logistic at dilution `x`.
///
/// ```text
/// y = min + (max - min) / (1 + 10^((log10(ec50) - log10(x)) * slope))^asymmetry
/// ```
pub fn logistic(x: f64, params: &FitParameters) -> f64 {
    let exponent = (params.ec50.log10() - x.log10()) * params.slope;
    let denom = (1.0 + 10f64.powf(exponent)).powf(params.asymmetry);
    params.min + (params.max - params.min) / denom
}

/// Solve the logistic for the dilution at which it reaches `percent`.
///
/// Returns NaN when `percent` is not strictly between the plateaus or the
/// curve is flat.
pub fn logistic_inverse(percent: f64, params: &FitParameters) -> f64 {
    let lo = params.min.min(params.max);
    let hi = params.min.max(params.max);
    if !(percent > lo && percent < hi) || params.slope == 0.0 || params.asymmetry == 0.0 {
        return f64::NAN;
    }
    // (1 + 10^z)^a = (max - min) / (percent - min)
    let ratio = (params.max - params.min) / (percent - params.min);
    let base = ratio.powf(1.0 / params.asymmetry) - 1.0;
    if !(base > 0.0) {
        return f64::NAN;
    }
    let z = base.log10();
    10f64.powf(params.ec50.log10() - z / params.slope)
}

/// Fill a polynomial design row `[1, u, u^2, ...]` for `u = log10(dilution)`.
///
/// # Panics
/// Panics if `out` is empty.
pub fn fill_design_row(log_dilution: f64, out: &mut [f64]) {
    out[0] = 1.0;
    for j in 1..out.len() {
        out[j] = out[j - 1] * log_dilution;
    }
}

/// Evaluate a polynomial in `log10(dilution)`; coefficients lowest order first.
pub fn predict_polynomial(dilution: f64, coefficients: &[f64]) -> f64 {
    let u = dilution.log10();
    coefficients.iter().rev().fold(0.0, |acc, c| acc * u + c)
}
