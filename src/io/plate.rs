//! Read/write plate description JSON files.
//!
//! A plate file carries everything needed to rebuild a [`Plate`]:
//! - well readings (and optional excluded flags) as row-major grids
//! - well groups, from explicit positions or an inclusive rectangle
//! - dilutions, per group or as a grid
//! - the CONTROL group names used for neutralization
//! - optionally, a run's precomputed group statistics
//!
//! ```json
//! {
//!   "name": "Plate 1",
//!   "values": [[0.05, 1.2, 0.31], [0.06, 1.1, 0.75]],
//!   "controls": { "cell": "CELL_CONTROL", "virus": "VIRUS_CONTROL" },
//!   "groups": [
//!     { "name": "Specimen 1", "type": "specimen",
//!       "region": { "upper_left": { "row": 0, "column": 2 },
//!                   "lower_right": { "row": 1, "column": 2 } } }
//!   ],
//!   "dilutions": [[null, null, 20.0], [null, null, 60.0]]
//! }
//! ```

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::PlateControls;
use crate::error::AppError;
use crate::plate::{InMemoryStatsStore, Plate, Position, StatsRecord, WellGroupType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlateFile {
    pub name: String,
    #[serde(default = "default_plate_number")]
    pub plate_number: u32,
    pub values: Vec<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded: Option<Vec<Vec<bool>>>,
    #[serde(default)]
    pub controls: PlateControls,
    pub groups: Vec<GroupSpec>,
    /// Per-well dilutions; `null` for wells without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dilutions: Option<Vec<Vec<Option<f64>>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precomputed: Option<PrecomputedStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub group_type: WellGroupType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positions: Vec<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
    /// Dilution applied to every well of the group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dilution: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Region {
    pub upper_left: Position,
    pub lower_right: Position,
}

/// Stored statistics for a saved run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrecomputedStats {
    pub run_id: i64,
    pub records: Vec<StatsRecord>,
}

fn default_plate_number() -> u32 {
    1
}

impl PlateFile {
    /// Describe an existing plate (without precomputed statistics).
    pub fn from_plate(plate: &Plate, controls: &PlateControls) -> Self {
        let mut values = vec![vec![0.0; plate.columns()]; plate.rows()];
        let mut excluded = vec![vec![false; plate.columns()]; plate.rows()];
        let mut dilutions = vec![vec![None; plate.columns()]; plate.rows()];
        for well in plate.wells() {
            let p = well.position();
            values[p.row()][p.column()] = well.value();
            excluded[p.row()][p.column()] = well.is_excluded();
            dilutions[p.row()][p.column()] = crate::plate::WellData::dilution(well);
        }
        let any_excluded = excluded.iter().flatten().any(|e| *e);

        let groups = plate
            .groups()
            .map(|g| GroupSpec {
                name: g.name().to_string(),
                group_type: g.group_type(),
                positions: g.positions().to_vec(),
                region: None,
                dilution: None,
            })
            .collect();

        Self {
            name: plate.name().to_string(),
            plate_number: plate.plate_number(),
            values,
            excluded: any_excluded.then_some(excluded),
            controls: controls.clone(),
            groups,
            dilutions: Some(dilutions),
            precomputed: None,
        }
    }

    /// Build the plate described by this file.
    pub fn to_plate(&self) -> Result<Plate, AppError> {
        let mut plate = Plate::from_values(&self.name, &self.values, self.excluded.as_deref())?
            .with_plate_number(self.plate_number);

        if let Some(grid) = &self.dilutions {
            if grid.len() != plate.rows() || grid.iter().any(|r| r.len() != plate.columns()) {
                return Err(AppError::invalid_input("Dilution grid size must match the plate size."));
            }
            for (row, line) in grid.iter().enumerate() {
                for (column, &dilution) in line.iter().enumerate() {
                    plate.set_dilution(Position::new(row, column), dilution)?;
                }
            }
        }

        for spec in &self.groups {
            let id = match (&spec.region, spec.positions.is_empty()) {
                (Some(region), true) => {
                    plate.add_region_group(&spec.name, spec.group_type, region.upper_left, region.lower_right)?
                }
                (None, false) => plate.add_group(&spec.name, spec.group_type, spec.positions.clone())?,
                _ => {
                    return Err(AppError::invalid_input(format!(
                        "Group '{}' needs exactly one of 'positions' or 'region'.",
                        spec.name
                    )));
                }
            };
            if let Some(dilution) = spec.dilution {
                plate.set_group_dilution(id, dilution)?;
            }
        }

        if let Some(pre) = &self.precomputed {
            let store = InMemoryStatsStore::from_records(pre.records.iter().cloned());
            plate = plate.with_precomputed_stats(pre.run_id, Arc::new(store));
        }
        Ok(plate)
    }
}

/// Read a plate JSON file.
pub fn read_plate_json(path: &Path) -> Result<PlateFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open plate JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::io(format!("Invalid plate JSON '{}': {e}", path.display())))
}

/// Write a plate JSON file.
pub fn write_plate_json(path: &Path, plate: &PlateFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create plate JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, plate).map_err(|e| AppError::io(format!("Failed to write plate JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::generate_sample;
    use crate::domain::FitConfig;
    use crate::error::ErrorKind;

    const SMALL: &str = r#"{
        "name": "Plate 1",
        "values": [[0.05, 1.2, 0.3], [0.07, 1.0, 0.8]],
        "excluded": [[false, false, false], [false, true, false]],
        "groups": [
            { "name": "CELL_CONTROL", "type": "control",
              "positions": [{ "row": 0, "column": 0 }, { "row": 1, "column": 0 }] },
            { "name": "VIRUS_CONTROL", "type": "control",
              "region": { "upper_left": { "row": 0, "column": 1 }, "lower_right": { "row": 1, "column": 1 } } },
            { "name": "S1", "type": "specimen",
              "region": { "upper_left": { "row": 0, "column": 2 }, "lower_right": { "row": 1, "column": 2 } } }
        ],
        "dilutions": [[null, null, 20.0], [null, null, 60.0]]
    }"#;

    #[test]
    fn parses_and_builds_plate() {
        let file: PlateFile = serde_json::from_str(SMALL).unwrap();
        assert_eq!(file.controls, PlateControls::default());
        let plate = file.to_plate().unwrap();
        assert_eq!(plate.group_count(), 3);
        assert!(plate.well(1, 1).unwrap().is_excluded());
        let virus = plate.find_group(WellGroupType::Control, "VIRUS_CONTROL").unwrap();
        assert_eq!(virus.mean().unwrap(), 1.2);
        let s1 = plate.find_group(WellGroupType::Specimen, "S1").unwrap();
        assert_eq!(s1.dilution(), None);
        assert_eq!(crate::plate::WellData::dilution(plate.well(1, 2).unwrap()), Some(60.0));
    }

    #[test]
    fn group_needs_positions_or_region() {
        let mut file: PlateFile = serde_json::from_str(SMALL).unwrap();
        file.groups[2].region = None;
        let err = file.to_plate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn precomputed_stats_switch_plate_to_stored_path() {
        let mut file: PlateFile = serde_json::from_str(SMALL).unwrap();
        file.precomputed = Some(serde_json::from_str(
            r#"{ "run_id": 3, "records": [
                { "run_id": 3, "plate_number": 1, "group_name": "S1", "replicate": false,
                  "mean": 0.42, "std_dev": null, "min": 0.3, "max": 0.8 } ] }"#,
        ).unwrap());
        let plate = file.to_plate().unwrap();
        assert!(!plate.must_calculate_stats());
        let s1 = plate.find_group(WellGroupType::Specimen, "S1").unwrap();
        assert_eq!(s1.mean().unwrap(), 0.42);
        let cell = plate.find_group(WellGroupType::Control, "CELL_CONTROL").unwrap();
        assert_eq!(cell.mean().unwrap_err().kind(), ErrorKind::InconsistentState);
    }

    #[test]
    fn round_trips_through_disk() {
        let sample = generate_sample(&FitConfig { sample_specimens: 2, ..FitConfig::default() }).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plate.json");

        write_plate_json(&path, &PlateFile::from_plate(&sample.plate, &sample.controls)).unwrap();
        let plate = read_plate_json(&path).unwrap().to_plate().unwrap();

        assert_eq!(plate.group_count(), sample.plate.group_count());
        for (a, b) in plate.wells().iter().zip(sample.plate.wells()) {
            assert!((a.value() - b.value()).abs() < 1e-12);
            assert_eq!(crate::plate::WellData::dilution(a), crate::plate::WellData::dilution(b));
        }
        let specimen = plate.find_group(WellGroupType::Specimen, "Specimen 1").unwrap();
        assert_eq!(specimen.well_data(true).unwrap().len(), crate::data::SAMPLE_ROWS);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_plate_json(&dir.path().join("missing.json")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
