//! Synthetic neutralization plate generation.
//!
//! Layout (8 rows):
//! - column 0: cell control (background reading)
//! - column 1: virus control (full signal)
//! - columns `2 + 2k`, `3 + 2k`: specimen `k` in duplicate; row `r` is diluted
//!   `20 * 3^r` and each row pair is a REPLICATE group
//!
//! Each specimen follows a Hill curve `n(d) = 1 / (1 + (d / titer)^hill)` with
//! a random titer and slope. Readings are `cell + (virus - cell) * (1 - n)`
//! times log-normal noise.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::LogNormal;
use tracing::debug;

use crate::domain::{FitConfig, PlateControls};
use crate::error::AppError;
use crate::plate::{Plate, Position, WellGroupType};

/// Rows on the synthetic plate (one per dilution step).
pub const SAMPLE_ROWS: usize = 8;

/// First dilution of the series.
pub const START_DILUTION: f64 = 20.0;

/// Fold change between consecutive rows.
pub const DILUTION_FACTOR: f64 = 3.0;

const CELL_READING: f64 = 0.05;
const VIRUS_READING: f64 = 1.2;

/// True curve behind one synthetic specimen.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecimenTruth {
    pub name: String,
    /// Dilution giving 50% neutralization.
    pub titer: f64,
    pub hill: f64,
}

#[derive(Debug, Clone)]
pub struct SampleData {
    pub plate: Plate,
    pub controls: PlateControls,
    pub truth: Vec<SpecimenTruth>,
}

pub fn generate_sample(config: &FitConfig) -> Result<SampleData, AppError> {
    if config.sample_specimens == 0 {
        return Err(AppError::invalid_input("Specimen count must be > 0."));
    }
    if !(config.sample_noise.is_finite() && config.sample_noise >= 0.0) {
        return Err(AppError::invalid_input("Noise level must be finite and >= 0."));
    }

    let mut rng = StdRng::seed_from_u64(config.sample_seed);
    let noise = LogNormal::new(0.0, config.sample_noise)
        .map_err(|e| AppError::invalid_input(format!("Noise distribution error: {e}")))?;

    let columns = 2 + 2 * config.sample_specimens;
    let controls = PlateControls::default();

    // Log-uniform titers inside the dilution series, so curves cross 50%.
    let first = START_DILUTION.log10();
    let last = (START_DILUTION * DILUTION_FACTOR.powi(SAMPLE_ROWS as i32 - 1)).log10();
    let mut truth = Vec::with_capacity(config.sample_specimens);
    for k in 0..config.sample_specimens {
        let span = last - first;
        let titer = 10f64.powf(rng.gen_range(first + 0.2 * span..=last - 0.2 * span));
        let hill = rng.gen_range(0.8..=1.6);
        truth.push(SpecimenTruth {
            name: format!("Specimen {}", k + 1),
            titer,
            hill,
        });
    }

    let mut values = vec![vec![0.0; columns]; SAMPLE_ROWS];
    for (row, line) in values.iter_mut().enumerate() {
        line[0] = CELL_READING * noise.sample(&mut rng);
        line[1] = VIRUS_READING * noise.sample(&mut rng);
        let dilution = dilution_for_row(row);
        for (k, specimen) in truth.iter().enumerate() {
            let neutralized = 1.0 / (1.0 + (dilution / specimen.titer).powf(specimen.hill));
            let expected = CELL_READING + (VIRUS_READING - CELL_READING) * (1.0 - neutralized);
            for column in [2 + 2 * k, 3 + 2 * k] {
                line[column] = expected * noise.sample(&mut rng);
            }
        }
    }
    let mut plate = Plate::from_values("Synthetic neutralization plate", &values, None)?;

    let last_row = SAMPLE_ROWS - 1;
    plate.add_region_group(&controls.cell, WellGroupType::Control, Position::new(0, 0), Position::new(last_row, 0))?;
    plate.add_region_group(&controls.virus, WellGroupType::Control, Position::new(0, 1), Position::new(last_row, 1))?;

    for (k, specimen) in truth.iter().enumerate() {
        let (left, right) = (2 + 2 * k, 3 + 2 * k);
        plate.add_region_group(
            &specimen.name,
            WellGroupType::Specimen,
            Position::new(0, left),
            Position::new(last_row, right),
        )?;
        for row in 0..SAMPLE_ROWS {
            let id = plate.add_region_group(
                format!("{} row {}", specimen.name, Position::new(row, left).row_label()),
                WellGroupType::Replicate,
                Position::new(row, left),
                Position::new(row, right),
            )?;
            plate.set_group_dilution(id, dilution_for_row(row))?;
        }
    }

    debug!(
        specimens = truth.len(),
        seed = config.sample_seed,
        noise = config.sample_noise,
        "generated synthetic plate"
    );
    Ok(SampleData {
        plate,
        controls,
        truth,
    })
}

pub fn dilution_for_row(row: usize) -> f64 {
    START_DILUTION * DILUTION_FACTOR.powi(row as i32)
}
