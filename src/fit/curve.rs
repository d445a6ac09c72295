//! Dilution curves: one fitted (or unfitted) curve over a dose-response dataset.
//!
//! [`DilutionCurve`] is a closed set of strategies. Each strategy owns the
//! shared [`DoseResponse`] plus whatever its fit produced; the sampled curve is
//! computed on first request and cached.

use std::sync::OnceLock;

use crate::domain::{AucKind, CurveFitType, CurveParameters, CurvePoint, FitParameters, PolynomialParameters};
use crate::error::AppError;
use crate::fit::dataset::DoseResponse;
use crate::fit::fitter::fit_logistic;
use crate::fit::polynomial::{POLYNOMIAL_DEGREE, fit_polynomial};
use crate::math::{Crossing, cutoff_dilution, log_space};
use crate::models::{logistic, predict_polynomial};

/// Number of points a fitted curve is sampled at.
pub const CURVE_POINTS: usize = 100;

/// A dilution curve, dispatched by fit type.
#[derive(Debug, Clone)]
pub enum DilutionCurve {
    FourParameter(LogisticCurve),
    FiveParameter(LogisticCurve),
    Polynomial(PolynomialCurve),
    Empty(NoFitCurve),
}

/// Logistic fit (four or five parameters).
#[derive(Debug, Clone)]
pub struct LogisticCurve {
    data: DoseResponse,
    params: FitParameters,
    assume_decreasing: bool,
    samples: OnceLock<Vec<CurvePoint>>,
}

/// Least-squares polynomial in `log10(dilution)`.
#[derive(Debug, Clone)]
pub struct PolynomialCurve {
    data: DoseResponse,
    params: PolynomialParameters,
    assume_decreasing: bool,
    samples: OnceLock<Vec<CurvePoint>>,
}

/// No fit: the curve is the data itself.
#[derive(Debug, Clone)]
pub struct NoFitCurve {
    data: DoseResponse,
    assume_decreasing: bool,
}

impl DilutionCurve {
    /// Fit `data` with the requested strategy.
    pub fn fit(data: DoseResponse, assume_decreasing: bool, fit_type: CurveFitType) -> Result<Self, AppError> {
        if data.is_empty() {
            return Err(AppError::fit_failed(format!(
                "{} fit failed for '{}': no data points.",
                fit_type.label(),
                data.label()
            )));
        }

        let curve = match fit_type {
            CurveFitType::FourParameter | CurveFitType::FiveParameter => {
                let params = fit_logistic(&data, fit_type)?;
                let curve = LogisticCurve {
                    data,
                    params,
                    assume_decreasing,
                    samples: OnceLock::new(),
                };
                if fit_type == CurveFitType::FourParameter {
                    DilutionCurve::FourParameter(curve)
                } else {
                    DilutionCurve::FiveParameter(curve)
                }
            }
            CurveFitType::Polynomial => {
                let params = fit_polynomial(&data, POLYNOMIAL_DEGREE)?;
                DilutionCurve::Polynomial(PolynomialCurve {
                    data,
                    params,
                    assume_decreasing,
                    samples: OnceLock::new(),
                })
            }
            CurveFitType::None => DilutionCurve::Empty(NoFitCurve {
                data,
                assume_decreasing,
            }),
        };
        Ok(curve)
    }

    pub fn fit_type(&self) -> CurveFitType {
        match self {
            DilutionCurve::FourParameter(_) => CurveFitType::FourParameter,
            DilutionCurve::FiveParameter(_) => CurveFitType::FiveParameter,
            DilutionCurve::Polynomial(_) => CurveFitType::Polynomial,
            DilutionCurve::Empty(_) => CurveFitType::None,
        }
    }

    /// The dataset the curve was built from.
    pub fn data(&self) -> &DoseResponse {
        match self {
            DilutionCurve::FourParameter(c) | DilutionCurve::FiveParameter(c) => &c.data,
            DilutionCurve::Polynomial(c) => &c.data,
            DilutionCurve::Empty(c) => &c.data,
        }
    }

    pub fn assume_decreasing(&self) -> bool {
        match self {
            DilutionCurve::FourParameter(c) | DilutionCurve::FiveParameter(c) => c.assume_decreasing,
            DilutionCurve::Polynomial(c) => c.assume_decreasing,
            DilutionCurve::Empty(c) => c.assume_decreasing,
        }
    }

    /// The sampled curve, ordered by dilution.
    ///
    /// Fitted curves are sampled at [`CURVE_POINTS`] log-uniform dilutions
    /// spanning the data; the no-fit curve is the data itself.
    pub fn curve(&self) -> &[CurvePoint] {
        match self {
            DilutionCurve::FourParameter(c) | DilutionCurve::FiveParameter(c) => c
                .samples
                .get_or_init(|| sample(&c.data, |x| logistic(x, &c.params)))
                .as_slice(),
            DilutionCurve::Polynomial(c) => c
                .samples
                .get_or_init(|| sample(&c.data, |x| predict_polynomial(x, &c.params.coefficients)))
                .as_slice(),
            DilutionCurve::Empty(c) => c.data.points(),
        }
    }

    pub fn parameters(&self) -> CurveParameters {
        match self {
            DilutionCurve::FourParameter(c) | DilutionCurve::FiveParameter(c) => CurveParameters::Logistic(c.params),
            DilutionCurve::Polynomial(c) => CurveParameters::Polynomial(c.params.clone()),
            DilutionCurve::Empty(_) => CurveParameters::None,
        }
    }

    /// RMS error of the fit; `0.0` when no fit was performed.
    pub fn fit_error(&self) -> f64 {
        match self {
            DilutionCurve::FourParameter(c) | DilutionCurve::FiveParameter(c) => c.params.fit_error,
            DilutionCurve::Polynomial(c) => c.params.fit_error,
            DilutionCurve::Empty(_) => 0.0,
        }
    }

    /// Dilution at which the curve crosses `cutoff` (a fraction in `[0, 1]`).
    ///
    /// Fitted curves use the first bracketing segment of the sampled curve.
    /// The no-fit curve answers from the data, like
    /// [`interpolated_cutoff_dilution`](Self::interpolated_cutoff_dilution).
    pub fn cutoff_dilution(&self, cutoff: f64) -> Result<f64, AppError> {
        let percent = cutoff_percent(cutoff)?;
        Ok(match self {
            DilutionCurve::Empty(c) => c.data.cutoff_dilution(percent, c.assume_decreasing),
            _ => cutoff_dilution(self.curve(), percent, self.assume_decreasing(), Crossing::First),
        })
    }

    /// Dilution at which the raw data crosses `cutoff`, averaged over every
    /// bracketing pair of consecutive points.
    pub fn interpolated_cutoff_dilution(&self, cutoff: f64) -> Result<f64, AppError> {
        let percent = cutoff_percent(cutoff)?;
        Ok(self.data().cutoff_dilution(percent, self.assume_decreasing()))
    }

    pub fn min_percentage(&self) -> f64 {
        self.data().min_percentage()
    }

    pub fn max_percentage(&self) -> f64 {
        self.data().max_percentage()
    }

    pub fn min_dilution(&self) -> f64 {
        self.data().min_dilution()
    }

    pub fn max_dilution(&self) -> f64 {
        self.data().max_dilution()
    }

    /// Area under the sampled curve in `fraction × log10(dilution)` units.
    ///
    /// `range` limits integration to a dilution interval; `None` covers the
    /// whole curve.
    pub fn auc(&self, kind: AucKind, range: Option<(f64, f64)>) -> Result<f64, AppError> {
        let points = match range {
            None => self.curve().to_vec(),
            Some((lo, hi)) => {
                if !(lo.is_finite() && hi.is_finite() && lo > 0.0 && hi >= lo) {
                    return Err(AppError::invalid_input(format!(
                        "Invalid AUC range: {lo}..{hi} (must be finite, >0, and ordered)."
                    )));
                }
                clip(self.curve(), lo, hi)
            }
        };

        let area = points
            .windows(2)
            .map(|w| {
                let dx = w[1].dilution.log10() - w[0].dilution.log10();
                segment_area(w[0].percent / 100.0, w[1].percent / 100.0, dx, kind)
            })
            .sum();
        Ok(area)
    }
}

fn cutoff_percent(cutoff: f64) -> Result<f64, AppError> {
    if !(0.0..=1.0).contains(&cutoff) {
        return Err(AppError::invalid_input(format!(
            "Cutoff {cutoff} is outside [0, 1]."
        )));
    }
    Ok(cutoff * 100.0)
}

/// Sample `f` across the data's dilution range.
///
/// A single distinct dilution gives a one-point curve. Any other range
/// `log_space` rejects (zero, negative or NaN dilutions) is sampled linearly
/// in log10, so the bad values surface as NaN points instead of vanishing.
fn sample(data: &DoseResponse, f: impl Fn(f64) -> f64) -> Vec<CurvePoint> {
    let (lo, hi) = (data.min_dilution(), data.max_dilution());
    let dilutions = if lo == hi {
        vec![lo]
    } else {
        log_space(lo, hi, CURVE_POINTS).unwrap_or_else(|_| raw_log_space(lo, hi))
    };
    dilutions
        .into_iter()
        .map(|dilution| CurvePoint {
            dilution,
            percent: f(dilution),
        })
        .collect()
}

fn raw_log_space(lo: f64, hi: f64) -> Vec<f64> {
    let (log_lo, log_hi) = (lo.log10(), hi.log10());
    let step = (log_hi - log_lo) / (CURVE_POINTS as f64 - 1.0);
    (0..CURVE_POINTS)
        .map(|i| 10f64.powf(log_lo + step * i as f64))
        .collect()
}

/// Restrict a curve to `[lo, hi]`, interpolating (in log10 dilution) at the
/// boundaries.
fn clip(points: &[CurvePoint], lo: f64, hi: f64) -> Vec<CurvePoint> {
    let mut out = Vec::new();
    for w in points.windows(2) {
        let (a, b) = (w[0], w[1]);
        if b.dilution < lo || a.dilution > hi {
            continue;
        }
        let start = if a.dilution < lo { at(a, b, lo) } else { a };
        let end = if b.dilution > hi { at(a, b, hi) } else { b };
        if out.last() != Some(&start) {
            out.push(start);
        }
        out.push(end);
    }
    out
}

fn at(a: CurvePoint, b: CurvePoint, dilution: f64) -> CurvePoint {
    let (la, lb) = (a.dilution.log10(), b.dilution.log10());
    let t = if lb == la { 0.0 } else { (dilution.log10() - la) / (lb - la) };
    CurvePoint {
        dilution,
        percent: a.percent + t * (b.percent - a.percent),
    }
}

/// Trapezoid area of one segment, split at a zero crossing for the one-sided
/// kinds.
fn segment_area(y0: f64, y1: f64, dx: f64, kind: AucKind) -> f64 {
    let full = 0.5 * (y0 + y1) * dx;
    let keep = |y: f64| match kind {
        AucKind::Normal => true,
        AucKind::Positive => y >= 0.0,
        AucKind::Negative => y <= 0.0,
    };
    match (keep(y0), keep(y1)) {
        (true, true) => full,
        (false, false) => 0.0,
        _ => {
            // Triangle on the kept side of the zero crossing.
            let t = y0 / (y0 - y1);
            if keep(y0) { 0.5 * y0 * t * dx } else { 0.5 * y1 * (1.0 - t) * dx }
        }
    }
}
