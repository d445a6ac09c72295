//! Single wells and the `WellData` capability.

use serde::{Deserialize, Serialize};

use crate::plate::Position;

/// Summary values shared by single wells and aggregated replicate groups.
pub trait WellData {
    fn mean(&self) -> f64;
    fn min(&self) -> f64;
    fn max(&self) -> f64;
    /// Sample standard deviation; NaN for fewer than two values.
    fn std_dev(&self) -> f64;
    fn dilution(&self) -> Option<f64>;
}

/// One measured well on a plate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Well {
    position: Position,
    value: f64,
    dilution: Option<f64>,
    excluded: bool,
}

impl Well {
    pub fn new(position: Position, value: f64, excluded: bool) -> Self {
        Self {
            position,
            value,
            dilution: None,
            excluded,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_excluded(&self) -> bool {
        self.excluded
    }

    pub(crate) fn set_dilution(&mut self, dilution: Option<f64>) {
        self.dilution = dilution;
    }

    pub(crate) fn set_excluded(&mut self, excluded: bool) {
        self.excluded = excluded;
    }
}

impl WellData for Well {
    fn mean(&self) -> f64 {
        self.value
    }

    fn min(&self) -> f64 {
        self.value
    }

    fn max(&self) -> f64 {
        self.value
    }

    fn std_dev(&self) -> f64 {
        f64::NAN
    }

    fn dilution(&self) -> Option<f64> {
        self.dilution
    }
}
