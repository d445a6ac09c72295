//! Read/write curve JSON files.
//!
//! Curve JSON is the portable record of a fitting run:
//! - plate name, fit type and generation time
//! - per specimen: curve parameters, fit error, cutoff dilutions
//! - the sampled curve for plotting elsewhere
//!
//! The schema is defined by `domain::CurveFile`.

use std::fs::File;
use std::path::Path;

use tracing::info;

use crate::domain::CurveFile;
use crate::error::AppError;

/// Write a curve JSON file.
pub fn write_curve_json(path: &Path, curves: &CurveFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create curve JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, curves)
        .map_err(|e| AppError::io(format!("Failed to write curve JSON: {e}")))?;
    info!(path = %path.display(), curves = curves.curves.len(), "wrote curve JSON");
    Ok(())
}

/// Read a curve JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open curve JSON '{}': {e}", path.display())))?;
    let curves: CurveFile =
        serde_json::from_reader(file).map_err(|e| AppError::io(format!("Invalid curve JSON: {e}")))?;
    Ok(curves)
}
