//! Cutoff interpolation along a piecewise-linear `(dilution, percent)` path.
//!
//! A cutoff is bracketed by a segment when it lies between the segment's two
//! percent values (inclusive). The crossing dilution is found by linear
//! interpolation in `log10(dilution)`.
//!
//! When no segment brackets the cutoff the answer is an infinity whose sign
//! depends on whether every point sits above the cutoff and on the expected
//! direction of the curve.

use crate::domain::CurvePoint;

/// Which bracketing segments contribute to the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossing {
    /// First bracketing segment only.
    First,
    /// Mean of the crossing dilutions over every bracketing segment.
    Mean,
}

/// Find the dilution at which `points` cross `cutoff` (percent scale).
///
/// `points` must be ordered by dilution.
pub fn cutoff_dilution(points: &[CurvePoint], cutoff: f64, assume_decreasing: bool, crossing: Crossing) -> f64 {
    let mut total = 0.0;
    let mut count = 0usize;

    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if !brackets(a.percent, b.percent, cutoff) {
            continue;
        }
        let x = crossing_dilution(a, b, cutoff);
        if crossing == Crossing::First {
            return x;
        }
        total += x;
        count += 1;
    }

    if count > 0 {
        return total / count as f64;
    }
    unbracketed(points, cutoff, assume_decreasing)
}

fn brackets(y0: f64, y1: f64, cutoff: f64) -> bool {
    (y0 <= cutoff && cutoff <= y1) || (y1 <= cutoff && cutoff <= y0)
}

fn crossing_dilution(a: CurvePoint, b: CurvePoint, cutoff: f64) -> f64 {
    let (log_a, log_b) = (a.dilution.log10(), b.dilution.log10());
    if b.percent == a.percent {
        return a.dilution;
    }
    let fraction = (cutoff - a.percent) / (b.percent - a.percent);
    10f64.powf(log_a + fraction * (log_b - log_a))
}

/// Infinite answer for a cutoff that no segment brackets.
///
/// | direction  | every point above cutoff | result |
/// |------------|--------------------------|--------|
/// | decreasing | yes                      | +∞     |
/// | decreasing | no                       | −∞     |
/// | increasing | yes                      | −∞     |
/// | increasing | no                       | +∞     |
fn unbracketed(points: &[CurvePoint], cutoff: f64, assume_decreasing: bool) -> f64 {
    let always_above = points.iter().all(|p| p.percent >= cutoff);
    if always_above == assume_decreasing {
        f64::INFINITY
    } else {
        f64::NEG_INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(data: &[(f64, f64)]) -> Vec<CurvePoint> {
        data.iter()
            .map(|&(dilution, percent)| CurvePoint { dilution, percent })
            .collect()
    }

    #[test]
    fn interpolates_in_log_space() {
        let p = pts(&[(10.0, 80.0), (1000.0, 20.0)]);
        let x = cutoff_dilution(&p, 50.0, true, Crossing::First);
        assert!((x - 100.0).abs() < 1e-9, "got {x}");
    }

    #[test]
    fn mean_averages_every_crossing() {
        // Crosses 50 twice: once near 10^0.5, once near 10^2.5.
        let p = pts(&[(1.0, 40.0), (10.0, 60.0), (100.0, 60.0), (1000.0, 40.0)]);
        let first = cutoff_dilution(&p, 50.0, true, Crossing::First);
        let mean = cutoff_dilution(&p, 50.0, true, Crossing::Mean);
        assert!((first - 10f64.powf(0.5)).abs() < 1e-9);
        let expected = (10f64.powf(0.5) + 10f64.powf(2.5)) / 2.0;
        assert!((mean - expected).abs() < 1e-9);
    }

    #[test]
    fn unbracketed_sign_rules() {
        let high = pts(&[(1.0, 90.0), (10.0, 80.0)]);
        let low = pts(&[(1.0, 30.0), (10.0, 20.0)]);
        assert_eq!(cutoff_dilution(&high, 50.0, true, Crossing::First), f64::INFINITY);
        assert_eq!(cutoff_dilution(&low, 50.0, true, Crossing::First), f64::NEG_INFINITY);
        assert_eq!(cutoff_dilution(&high, 50.0, false, Crossing::First), f64::NEG_INFINITY);
        assert_eq!(cutoff_dilution(&low, 50.0, false, Crossing::First), f64::INFINITY);
    }

    #[test]
    fn single_point_never_brackets() {
        let p = pts(&[(10.0, 50.0)]);
        assert!(cutoff_dilution(&p, 50.0, true, Crossing::Mean).is_infinite());
    }
}
