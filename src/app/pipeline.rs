//! Shared fit pipeline used by the `fit` and `demo` commands.
//!
//! plate -> control means -> per-specimen curves -> cutoff dilutions
//!
//! The commands then only differ in where the plate comes from.

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::{CurveFile, CurveRecord, CutoffRecord, FitConfig, PlateControls};
use crate::error::{AppError, ErrorKind};
use crate::fit::{CurveFitFactory, DilutionCurve, Neutralization};
use crate::plate::{Plate, WellGroupType};

/// One fitted specimen.
#[derive(Debug, Clone)]
pub struct SpecimenFit {
    pub group: String,
    pub curve: DilutionCurve,
    pub cutoffs: Vec<CutoffRecord>,
    pub auc: Option<f64>,
}

/// A specimen whose curve could not be fitted.
#[derive(Debug, Clone)]
pub struct SpecimenFailure {
    pub group: String,
    pub reason: String,
}

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub plate: String,
    pub neutralization: Neutralization,
    pub fits: Vec<SpecimenFit>,
    pub failures: Vec<SpecimenFailure>,
}

/// Fit every SPECIMEN group on `plate`.
///
/// A specimen that cannot be fitted is reported in `failures`; any other
/// error aborts the run.
pub fn run_fit(plate: &Plate, controls: &PlateControls, config: &FitConfig) -> Result<RunOutput, AppError> {
    validate_cutoffs(&config.cutoffs)?;
    let neutralization = Neutralization::from_controls(plate, controls)?;
    info!(
        plate = plate.name(),
        cell = neutralization.cell(),
        virus = neutralization.virus(),
        fit_type = config.fit_type.label(),
        "fitting specimens"
    );

    let mut fits = Vec::new();
    let mut failures = Vec::new();
    for group in plate.groups_of_type(WellGroupType::Specimen) {
        let curve = match CurveFitFactory::curve_for_group(
            group,
            config.assume_decreasing,
            &neutralization,
            config.fit_type,
        ) {
            Ok(curve) => curve,
            Err(e) if e.kind() == ErrorKind::FitFailed => {
                warn!(group = group.name(), "{}", e.message());
                failures.push(SpecimenFailure {
                    group: group.name().to_string(),
                    reason: e.message().to_string(),
                });
                continue;
            }
            Err(e) => return Err(e),
        };

        let mut cutoffs = Vec::with_capacity(config.cutoffs.len());
        for &cutoff in &config.cutoffs {
            cutoffs.push(CutoffRecord {
                cutoff,
                curve_dilution: finite(curve.cutoff_dilution(cutoff)?),
                interpolated_dilution: finite(curve.interpolated_cutoff_dilution(cutoff)?),
            });
        }
        let auc = match config.auc {
            Some(kind) => Some(curve.auc(kind, None)?),
            None => None,
        };
        fits.push(SpecimenFit {
            group: group.name().to_string(),
            curve,
            cutoffs,
            auc,
        });
    }

    Ok(RunOutput {
        plate: plate.name().to_string(),
        neutralization,
        fits,
        failures,
    })
}

/// Exportable record of a run.
pub fn curve_file(run: &RunOutput, config: &FitConfig) -> CurveFile {
    CurveFile {
        tool: env!("CARGO_PKG_NAME").to_string(),
        generated: Utc::now(),
        plate: run.plate.clone(),
        fit_type: config.fit_type,
        curves: run
            .fits
            .iter()
            .map(|f| CurveRecord {
                group: f.group.clone(),
                parameters: f.curve.parameters(),
                fit_error: f.curve.fit_error(),
                cutoffs: f.cutoffs.clone(),
                auc: f.auc,
                points: f.curve.curve().to_vec(),
            })
            .collect(),
    }
}

fn validate_cutoffs(cutoffs: &[f64]) -> Result<(), AppError> {
    if let Some(bad) = cutoffs.iter().find(|c| !(0.0..=1.0).contains(*c)) {
        return Err(AppError::invalid_input(format!("Cutoff {bad} is outside [0, 1].")));
    }
    Ok(())
}

fn finite(x: f64) -> Option<f64> {
    x.is_finite().then_some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::generate_sample;
    use crate::domain::{AucKind, CurveFitType};
    use crate::plate::Position;

    #[test]
    fn demo_plate_recovers_titers() {
        let config = FitConfig {
            sample_specimens: 3,
            sample_noise: 0.02,
            ..FitConfig::default()
        };
        let sample = generate_sample(&config).unwrap();
        let run = run_fit(&sample.plate, &sample.controls, &config).unwrap();

        assert!(run.failures.is_empty(), "{:?}", run.failures);
        assert_eq!(run.fits.len(), 3);
        for (fit, truth) in run.fits.iter().zip(&sample.truth) {
            assert_eq!(fit.group, truth.name);
            let ic50 = fit.cutoffs[0].interpolated_dilution.unwrap();
            // Within one dilution step (3-fold) of the true titer.
            assert!((ic50.log10() - truth.titer.log10()).abs() < 3f64.log10(), "{ic50} vs {}", truth.titer);
        }

        assert!(run.fits.iter().all(|f| f.auc.is_none()));

        let file = curve_file(&run, &config);
        assert_eq!(file.curves.len(), 3);
        assert_eq!(file.curves[0].points.len(), crate::fit::CURVE_POINTS);
    }

    #[test]
    fn unfittable_specimen_is_reported_not_fatal() {
        let values = vec![vec![0.05, 1.2, 0.6]];
        let mut plate = Plate::from_values("p", &values, None).unwrap();
        let controls = PlateControls::default();
        plate
            .add_group(&controls.cell, WellGroupType::Control, vec![Position::new(0, 0)])
            .unwrap();
        plate
            .add_group(&controls.virus, WellGroupType::Control, vec![Position::new(0, 1)])
            .unwrap();
        let id = plate
            .add_group("Specimen 1", WellGroupType::Specimen, vec![Position::new(0, 2)])
            .unwrap();
        plate.set_group_dilution(id, 20.0).unwrap();

        let config = FitConfig::default();
        let run = run_fit(&plate, &controls, &config).unwrap();
        assert!(run.fits.is_empty());
        assert_eq!(run.failures.len(), 1);
        assert_eq!(run.failures[0].group, "Specimen 1");

        let none = FitConfig {
            fit_type: CurveFitType::None,
            ..FitConfig::default()
        };
        let run = run_fit(&plate, &controls, &none).unwrap();
        assert_eq!(run.fits.len(), 1);
        assert_eq!(run.fits[0].cutoffs[0].curve_dilution, None);
    }

    #[test]
    fn auc_is_reported_when_requested() {
        let config = FitConfig {
            sample_specimens: 2,
            auc: Some(AucKind::Normal),
            ..FitConfig::default()
        };
        let sample = generate_sample(&config).unwrap();
        let run = run_fit(&sample.plate, &sample.controls, &config).unwrap();
        for fit in &run.fits {
            let auc = fit.auc.unwrap();
            assert_eq!(auc, fit.curve.auc(AucKind::Normal, None).unwrap());
            // Neutralization lies in roughly [0, 1] over a positive log10 span.
            assert!(auc > 0.0, "{}: {auc}", fit.group);
        }
        let file = curve_file(&run, &config);
        assert_eq!(file.curves[0].auc, run.fits[0].auc);
    }

    #[test]
    fn rejects_bad_cutoffs() {
        let sample = generate_sample(&FitConfig::default()).unwrap();
        let config = FitConfig {
            cutoffs: vec![0.5, 80.0],
            ..FitConfig::default()
        };
        let err = run_fit(&sample.plate, &sample.controls, &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
