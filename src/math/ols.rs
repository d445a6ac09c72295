//! Least squares for the polynomial strategy.
//!
//! Solves `minimize Σ (y_i - x_i^T β)^2` where `x_i` is the Vandermonde row of
//! `log10(dilution_i)`. The design is tall (one row per well, at most four
//! columns), so SVD is used rather than `QR::solve`, which expects a square
//! system. Singular values below a threshold relative to the largest one are
//! treated as zero; clustered dilutions make the columns nearly collinear.

use nalgebra::{DMatrix, DVector};

/// Relative singular value thresholds, tried strictest first.
const RELATIVE_TOLERANCES: [f64; 3] = [1e-12, 1e-10, 1e-8];

/// Solve `x β ≈ y` in the least squares sense.
///
/// Returns `None` for an empty or rank-zero design, or when no tolerance
/// yields a finite solution.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() == 0 || x.ncols() == 0 || x.nrows() != y.len() {
        return None;
    }

    let svd = x.clone().svd(true, true);
    let largest = svd.singular_values.max();
    if !(largest.is_finite() && largest > 0.0) {
        return None;
    }

    RELATIVE_TOLERANCES.iter().find_map(|&rel| {
        svd.solve(y, rel * largest)
            .ok()
            .filter(|beta| beta.iter().all(|v| v.is_finite()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exact_line() {
        // y = 40 - 12u on u = [0, 1, 2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[40.0, 28.0, 16.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 40.0).abs() < 1e-9);
        assert!((beta[1] + 12.0).abs() < 1e-9);
    }

    #[test]
    fn replicate_rows_average() {
        let x = DMatrix::from_row_slice(4, 1, &[1.0, 1.0, 1.0, 1.0]);
        let y = DVector::from_row_slice(&[10.0, 20.0, 30.0, 60.0]);
        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 30.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_empty_and_zero_designs() {
        let empty = DMatrix::<f64>::zeros(0, 2);
        assert!(solve_least_squares(&empty, &DVector::zeros(0)).is_none());

        let zero = DMatrix::<f64>::zeros(3, 2);
        assert!(solve_least_squares(&zero, &DVector::from_element(3, 1.0)).is_none());
    }
}
