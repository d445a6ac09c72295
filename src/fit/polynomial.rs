//! Least-squares polynomial fit in `log10(dilution)`.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::domain::PolynomialParameters;
use crate::error::AppError;
use crate::fit::dataset::DoseResponse;
use crate::math::solve_least_squares;
use crate::models::{fill_design_row, predict_polynomial};

/// Default polynomial degree.
pub const POLYNOMIAL_DEGREE: usize = 3;

/// Fit a polynomial of at most `degree` to `data`.
///
/// The degree drops to `distinct dilutions - 1` when there are too few
/// dilutions to determine every coefficient.
pub fn fit_polynomial(data: &DoseResponse, degree: usize) -> Result<PolynomialParameters, AppError> {
    let n = data.len();
    if n == 0 {
        return Err(AppError::fit_failed(format!(
            "Polynomial fit failed for '{}': no data points.",
            data.label()
        )));
    }

    let mut distinct: Vec<f64> = data.points().iter().map(|p| p.dilution).collect();
    distinct.dedup();
    let p = degree.min(distinct.len() - 1) + 1;

    let mut x = DMatrix::<f64>::zeros(n, p);
    let mut y = DVector::<f64>::zeros(n);
    let mut row = vec![0.0; p];
    for (i, point) in data.points().iter().enumerate() {
        fill_design_row(point.dilution.log10(), &mut row);
        for j in 0..p {
            x[(i, j)] = row[j];
        }
        y[i] = point.percent;
    }

    let Some(beta) = solve_least_squares(&x, &y) else {
        return Err(AppError::fit_failed(format!(
            "Polynomial fit failed for '{}': least squares system is ill-conditioned ({n} points).",
            data.label()
        )));
    };
    let coefficients: Vec<f64> = beta.iter().copied().collect();

    let sse: f64 = data
        .points()
        .iter()
        .map(|pt| {
            let r = predict_polynomial(pt.dilution, &coefficients) - pt.percent;
            r * r
        })
        .sum();
    let fit_error = (sse / n as f64).sqrt();

    debug!(group = data.label(), degree = p - 1, fit_error, "polynomial fit complete");
    Ok(PolynomialParameters {
        coefficients,
        fit_error,
    })
}
