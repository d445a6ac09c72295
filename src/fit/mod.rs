//! Curve fitting.
//!
//! Responsibilities:
//!
//! - turn well group data into a `(dilution, percent)` dataset
//! - fit the dataset with the requested strategy (logistic grid search,
//!   polynomial least squares, or no fit)
//! - convert readings to percent neutralization against plate controls
//! - answer cutoff and area queries on the resulting curve

pub mod curve;
pub mod dataset;
pub mod fitter;
pub mod neutralization;
pub mod polynomial;
pub mod selection;

pub use curve::*;
pub use dataset::*;
pub use fitter::*;
pub use neutralization::*;
pub use polynomial::*;
pub use selection::*;
