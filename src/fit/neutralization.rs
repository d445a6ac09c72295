//! Percent neutralization relative to a plate's cell and virus controls.

use crate::domain::PlateControls;
use crate::error::AppError;
use crate::fit::dataset::PercentCalculator;
use crate::plate::{Plate, WellData, WellDatum, WellGroupRef, WellGroupType};

/// `1 - (mean - cell) / (virus - cell)`: 1 at the cell control reading,
/// 0 at the virus control reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neutralization {
    cell: f64,
    virus: f64,
}

impl Neutralization {
    pub fn new(cell: f64, virus: f64) -> Result<Self, AppError> {
        if !(cell.is_finite() && virus.is_finite()) || cell == virus {
            return Err(AppError::invalid_input(format!(
                "Control means must be finite and distinct (cell={cell}, virus={virus})."
            )));
        }
        Ok(Self { cell, virus })
    }

    /// Read the control means from the plate's CONTROL groups.
    pub fn from_controls(plate: &Plate, controls: &PlateControls) -> Result<Self, AppError> {
        let mean = |name: &str| -> Result<f64, AppError> {
            let group = plate.find_group(WellGroupType::Control, name).ok_or_else(|| {
                AppError::invalid_input(format!(
                    "Plate '{}' has no control group '{name}'.",
                    plate.name()
                ))
            })?;
            group.mean()
        };
        Self::new(mean(&controls.cell)?, mean(&controls.virus)?)
    }

    pub fn cell(&self) -> f64 {
        self.cell
    }

    pub fn virus(&self) -> f64 {
        self.virus
    }

    pub fn fraction(&self, value: f64) -> f64 {
        1.0 - (value - self.cell) / (self.virus - self.cell)
    }
}

impl PercentCalculator for Neutralization {
    fn percent(&self, _group: &WellGroupRef<'_>, data: &WellDatum<'_>) -> f64 {
        self.fraction(data.mean())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plate::Position;

    #[test]
    fn fraction_spans_controls() {
        let n = Neutralization::new(0.1, 1.1).unwrap();
        assert!((n.fraction(0.1) - 1.0).abs() < 1e-12);
        assert!(n.fraction(1.1).abs() < 1e-12);
        assert!((n.fraction(0.6) - 0.5).abs() < 1e-12);
        assert!(Neutralization::new(1.0, 1.0).is_err());
    }

    #[test]
    fn reads_control_means_from_plate() {
        let values = vec![vec![0.1, 1.0], vec![0.3, 1.2]];
        let mut plate = Plate::from_values("p", &values, None).unwrap();
        let controls = PlateControls::default();
        plate
            .add_region_group(&controls.cell, WellGroupType::Control, Position::new(0, 0), Position::new(1, 0))
            .unwrap();
        plate
            .add_region_group(&controls.virus, WellGroupType::Control, Position::new(0, 1), Position::new(1, 1))
            .unwrap();

        let n = Neutralization::from_controls(&plate, &controls).unwrap();
        assert!((n.cell() - 0.2).abs() < 1e-12);
        assert!((n.virus() - 1.1).abs() < 1e-12);

        let missing = PlateControls {
            cell: "nope".to_string(),
            ..PlateControls::default()
        };
        assert!(Neutralization::from_controls(&plate, &missing).is_err());
    }
}
