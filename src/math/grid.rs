//! Sampling grids.
//!
//! Curves are sampled at log-uniform dilutions. The logistic grid search sweeps
//! slope as `tan(θ)` and asymmetry as `θ` itself, over evenly spaced angles.

use crate::error::AppError;

/// Generate `steps` log-spaced points between `min` and `max` (inclusive).
pub fn log_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, AppError> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && max > 0.0 && max > min) {
        return Err(AppError::invalid_input(format!(
            "Invalid dilution range: min={min}, max={max} (must be finite, >0, and max>min)."
        )));
    }
    if steps < 2 {
        return Err(AppError::invalid_input("Sample steps must be >= 2."));
    }

    let log_min = min.log10();
    let log_max = max.log10();
    let step = (log_max - log_min) / (steps as f64 - 1.0);

    let mut out = Vec::with_capacity(steps);
    for i in 0..steps {
        out.push(10f64.powf(log_min + step * i as f64));
    }
    // Pin the endpoints so the sampled range matches the data range exactly.
    out[0] = min;
    out[steps - 1] = max;
    Ok(out)
}

/// `iπ/steps` for `i in 0..steps`: evenly spaced angles in `[0, π)`.
pub fn angle_sweep(steps: usize) -> Vec<f64> {
    (0..steps)
        .map(|i| std::f64::consts::PI * i as f64 / steps as f64)
        .collect()
}

/// `tan(θ)` for every angle of [`angle_sweep`].
pub fn tangent_sweep(steps: usize) -> Vec<f64> {
    angle_sweep(steps).into_iter().map(f64::tan).collect()
}
