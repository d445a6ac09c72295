//! The plate: a grid of wells plus every well group laid out on it.
//!
//! The plate owns all wells (row-major) and all group records. Groups are
//! handed out as [`WellGroupRef`] views; group membership is stored as
//! positions, never as references into the well grid.

use std::sync::Arc;

use crate::error::AppError;
use crate::plate::group::{GroupId, WellGroup, WellGroupRef, WellGroupType};
use crate::plate::stats::StatsStore;
use crate::plate::{Position, Well};

#[derive(Debug, Clone)]
pub struct Plate {
    name: String,
    rows: usize,
    columns: usize,
    plate_number: u32,
    run_id: Option<i64>,
    stats_store: Option<Arc<dyn StatsStore>>,
    wells: Vec<Well>,
    groups: Vec<WellGroup>,
}

impl Plate {
    /// An empty plate with every well value set to zero.
    pub fn new(name: impl Into<String>, rows: usize, columns: usize) -> Self {
        let mut wells = Vec::with_capacity(rows * columns);
        for row in 0..rows {
            for column in 0..columns {
                wells.push(Well::new(Position::new(row, column), 0.0, false));
            }
        }
        Self {
            name: name.into(),
            rows,
            columns,
            plate_number: 1,
            run_id: None,
            stats_store: None,
            wells,
            groups: Vec::new(),
        }
    }

    /// A plate populated from a `rows × columns` value grid and optional
    /// excluded flags of the same shape.
    pub fn from_values(
        name: impl Into<String>,
        values: &[Vec<f64>],
        excluded: Option<&[Vec<bool>]>,
    ) -> Result<Self, AppError> {
        let rows = values.len();
        let columns = values.first().map(|r| r.len()).unwrap_or(0);
        if rows == 0 || columns == 0 {
            return Err(AppError::invalid_input("Plate values must have at least one row and column."));
        }
        if values.iter().any(|r| r.len() != columns) {
            return Err(AppError::invalid_input("Well values array size must match the plate size."));
        }
        if let Some(flags) = excluded {
            if flags.len() != rows || flags.iter().any(|r| r.len() != columns) {
                return Err(AppError::invalid_input("Excluded values array size must match the plate size."));
            }
        }

        let mut plate = Self::new(name, rows, columns);
        for (well, (row, column)) in plate.wells.iter_mut().zip(grid_indices(rows, columns)) {
            let is_excluded = excluded.map(|f| f[row][column]).unwrap_or(false);
            *well = Well::new(Position::new(row, column), values[row][column], is_excluded);
        }
        Ok(plate)
    }

    pub fn with_plate_number(mut self, plate_number: u32) -> Self {
        self.plate_number = plate_number;
        self
    }

    /// Attach the plate to a saved run: statistics are then read from `store`.
    pub fn with_precomputed_stats(mut self, run_id: i64, store: Arc<dyn StatsStore>) -> Self {
        self.run_id = Some(run_id);
        self.stats_store = Some(store);
        self.clear_stats();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn plate_number(&self) -> u32 {
        self.plate_number
    }

    pub fn run_id(&self) -> Option<i64> {
        self.run_id
    }

    pub(crate) fn stats_store(&self) -> Option<&dyn StatsStore> {
        self.stats_store.as_deref()
    }

    /// True when well data comes straight from a file and group statistics
    /// must be computed rather than read from a saved run.
    pub fn must_calculate_stats(&self) -> bool {
        self.run_id.is_none()
    }

    fn index_of(&self, position: Position) -> Result<usize, AppError> {
        if position.row() >= self.rows || position.column() >= self.columns {
            return Err(AppError::invalid_input(format!(
                "Position {position} is outside the {}x{} plate '{}'.",
                self.rows, self.columns, self.name
            )));
        }
        Ok(position.row() * self.columns + position.column())
    }

    pub fn well(&self, row: usize, column: usize) -> Result<&Well, AppError> {
        self.well_at(Position::new(row, column))
    }

    pub fn well_at(&self, position: Position) -> Result<&Well, AppError> {
        let idx = self.index_of(position)?;
        Ok(&self.wells[idx])
    }

    /// All wells, row-major.
    pub fn wells(&self) -> &[Well] {
        &self.wells
    }

    pub fn set_excluded(&mut self, position: Position, excluded: bool) -> Result<(), AppError> {
        let idx = self.index_of(position)?;
        self.wells[idx].set_excluded(excluded);
        self.clear_stats();
        Ok(())
    }

    pub fn set_dilution(&mut self, position: Position, dilution: Option<f64>) -> Result<(), AppError> {
        let idx = self.index_of(position)?;
        self.wells[idx].set_dilution(dilution);
        Ok(())
    }

    /// Assign one dilution to every well of a group.
    pub fn set_group_dilution(&mut self, id: GroupId, dilution: f64) -> Result<(), AppError> {
        let positions = self.group_record(id).positions().to_vec();
        for position in positions {
            self.set_dilution(position, Some(dilution))?;
        }
        Ok(())
    }

    /// Add a group over explicit positions.
    ///
    /// Group names are unique per type: adding a group with an existing
    /// `(type, name)` replaces that group in place and keeps its id.
    pub fn add_group(
        &mut self,
        name: impl Into<String>,
        group_type: WellGroupType,
        positions: Vec<Position>,
    ) -> Result<GroupId, AppError> {
        for &p in &positions {
            self.index_of(p)?;
        }
        let group = WellGroup::new(name.into(), group_type, positions);

        let existing = self
            .groups
            .iter()
            .position(|g| g.group_type() == group_type && g.name() == group.name());
        let id = match existing {
            Some(idx) => {
                self.groups[idx] = group;
                GroupId(idx)
            }
            None => {
                self.groups.push(group);
                GroupId(self.groups.len() - 1)
            }
        };

        // Membership changed: every cached overlap set and statistic may be stale.
        for g in &mut self.groups {
            g.clear_overlaps();
        }
        self.clear_stats();
        Ok(id)
    }

    /// Add a group covering the inclusive rectangle `upper_left..=lower_right`.
    pub fn add_region_group(
        &mut self,
        name: impl Into<String>,
        group_type: WellGroupType,
        upper_left: Position,
        lower_right: Position,
    ) -> Result<GroupId, AppError> {
        if lower_right.row() < upper_left.row() || lower_right.column() < upper_left.column() {
            return Err(AppError::invalid_input(format!(
                "Region {upper_left}..{lower_right} is empty."
            )));
        }
        let mut positions = Vec::new();
        for column in upper_left.column()..=lower_right.column() {
            for row in upper_left.row()..=lower_right.row() {
                positions.push(Position::new(row, column));
            }
        }
        self.add_group(name, group_type, positions)
    }

    /// View of one group; `id` must have been issued by this plate.
    pub fn group(&self, id: GroupId) -> Result<WellGroupRef<'_>, AppError> {
        if id.0 >= self.groups.len() {
            return Err(AppError::invalid_input(format!(
                "Group id {} is not on plate '{}' ({} groups).",
                id.0,
                self.name,
                self.groups.len()
            )));
        }
        Ok(WellGroupRef::new(self, id))
    }

    pub(crate) fn group_record(&self, id: GroupId) -> &WellGroup {
        &self.groups[id.0]
    }

    /// Every group, in insertion order.
    pub fn groups(&self) -> impl Iterator<Item = WellGroupRef<'_>> {
        (0..self.groups.len()).map(move |i| WellGroupRef::new(self, GroupId(i)))
    }

    pub fn find_group(&self, group_type: WellGroupType, name: &str) -> Option<WellGroupRef<'_>> {
        self.groups().find(|g| g.group_type() == group_type && g.name() == name)
    }

    /// Groups of one type, ordered by top-left position (column, then row).
    pub fn groups_of_type(&self, group_type: WellGroupType) -> Vec<WellGroupRef<'_>> {
        let mut out: Vec<WellGroupRef<'_>> = self.groups().filter(|g| g.group_type() == group_type).collect();
        out.sort_by(|a, b| match (a.top_left(), b.top_left()) {
            (Some(pa), Some(pb)) => pa.column_major(&pb),
            (a, b) => b.is_none().cmp(&a.is_none()),
        });
        out
    }

    pub fn groups_containing(&self, position: Position) -> Vec<WellGroupRef<'_>> {
        self.groups().filter(|g| g.contains(position)).collect()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn group_count_of_type(&self, group_type: WellGroupType) -> usize {
        self.groups.iter().filter(|g| g.group_type() == group_type).count()
    }

    fn clear_stats(&mut self) {
        for g in &mut self.groups {
            g.clear_stats();
        }
    }
}

fn grid_indices(rows: usize, columns: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..rows).flat_map(move |r| (0..columns).map(move |c| (r, c)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::plate::stats::{InMemoryStatsStore, StatsKey, WellGroupStats};
    use crate::plate::{WellData, WellDatum};

    fn values(rows: usize, columns: usize) -> Vec<Vec<f64>> {
        (0..rows)
            .map(|r| (0..columns).map(|c| (r * columns + c) as f64).collect())
            .collect()
    }

    #[test]
    fn from_values_populates_grid() {
        let plate = Plate::from_values("p", &values(2, 3), None).unwrap();
        assert_eq!(plate.rows(), 2);
        assert_eq!(plate.columns(), 3);
        assert_eq!(plate.well(1, 2).unwrap().value(), 5.0);
        assert!(plate.must_calculate_stats());

        let err = plate.well(2, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn from_values_rejects_ragged_grids() {
        let ragged = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(Plate::from_values("p", &ragged, None).is_err());

        let flags = vec![vec![false, false]];
        assert!(Plate::from_values("p", &values(2, 2), Some(flags.as_slice())).is_err());
    }

    #[test]
    fn region_group_is_sorted_column_major() {
        let mut plate = Plate::new("p", 4, 4);
        let id = plate
            .add_region_group("s", WellGroupType::Specimen, Position::new(1, 1), Position::new(2, 2))
            .unwrap();
        let positions = plate.group(id).unwrap().positions().to_vec();
        assert_eq!(
            positions,
            vec![Position::new(1, 1), Position::new(2, 1), Position::new(1, 2), Position::new(2, 2)]
        );
    }

    #[test]
    fn group_id_from_another_plate_is_an_error() {
        let mut big = Plate::new("big", 2, 2);
        big.add_group("a", WellGroupType::Control, vec![Position::new(0, 0)]).unwrap();
        let b = big.add_group("b", WellGroupType::Control, vec![Position::new(0, 1)]).unwrap();

        let mut small = Plate::new("small", 2, 2);
        small.add_group("a", WellGroupType::Control, vec![Position::new(0, 0)]).unwrap();

        let err = small.group(b).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidInput);
        assert!(err.message().contains("small"));
        assert!(big.group(b).is_ok());
    }

    #[test]
    fn readding_a_group_replaces_it() {
        let mut plate = Plate::new("p", 2, 2);
        let a = plate
            .add_group("g", WellGroupType::Other, vec![Position::new(0, 0)])
            .unwrap();
        let b = plate
            .add_group("g", WellGroupType::Other, vec![Position::new(1, 1)])
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(plate.group_count(), 1);
        assert!(plate.group(a).unwrap().contains(Position::new(1, 1)));

        plate.add_group("g", WellGroupType::Control, vec![]).unwrap();
        assert_eq!(plate.group_count(), 2);
        assert_eq!(plate.group_count_of_type(WellGroupType::Control), 1);
    }

    #[test]
    fn overlap_sets_are_symmetric_and_exclude_disjoint_groups() {
        let mut plate = Plate::new("p", 4, 4);
        let a = plate
            .add_group("a", WellGroupType::Other, vec![Position::new(0, 0), Position::new(0, 1)])
            .unwrap();
        let b = plate
            .add_group("b", WellGroupType::Other, vec![Position::new(0, 1), Position::new(1, 1)])
            .unwrap();
        let c = plate
            .add_group("c", WellGroupType::Other, vec![Position::new(3, 3)])
            .unwrap();

        let of_a: Vec<GroupId> = plate.group(a).unwrap().overlapping_groups().iter().map(|g| g.id()).collect();
        let of_b: Vec<GroupId> = plate.group(b).unwrap().overlapping_groups().iter().map(|g| g.id()).collect();
        assert_eq!(of_a, vec![b]);
        assert_eq!(of_b, vec![a]);
        assert!(plate.group(c).unwrap().overlapping_groups().is_empty());
        assert!(!plate.group(a).unwrap().overlaps(&plate.group(c).unwrap()));
    }

    #[test]
    fn groups_of_type_are_ordered_by_top_left() {
        let mut plate = Plate::new("p", 4, 4);
        plate
            .add_group("late", WellGroupType::Specimen, vec![Position::new(0, 3)])
            .unwrap();
        plate
            .add_group("early", WellGroupType::Specimen, vec![Position::new(2, 0)])
            .unwrap();
        let names: Vec<&str> = plate
            .groups_of_type(WellGroupType::Specimen)
            .iter()
            .map(|g| g.name())
            .collect();
        assert_eq!(names, vec!["early", "late"]);
        assert_eq!(plate.groups_containing(Position::new(2, 0)).len(), 1);
        assert!(plate.find_group(WellGroupType::Specimen, "late").is_some());
        assert!(plate.find_group(WellGroupType::Control, "late").is_none());
    }

    /// Specimen over columns 0-1; each row is a replicate pair at one dilution.
    fn specimen_plate() -> (Plate, GroupId) {
        let grid = vec![vec![1.0, 3.0], vec![10.0, 20.0], vec![7.0, 7.0]];
        let mut plate = Plate::from_values("p", &grid, None).unwrap();
        let specimen = plate
            .add_region_group("S1", WellGroupType::Specimen, Position::new(0, 0), Position::new(2, 1))
            .unwrap();
        for row in 0..2 {
            let id = plate
                .add_region_group(
                    format!("S1 R{row}"),
                    WellGroupType::Replicate,
                    Position::new(row, 0),
                    Position::new(row, 1),
                )
                .unwrap();
            plate.set_group_dilution(id, 10f64.powi(row as i32 + 1)).unwrap();
        }
        (plate, specimen)
    }

    #[test]
    fn combined_well_data_collapses_replicates() {
        let (plate, specimen) = specimen_plate();
        let group = plate.group(specimen).unwrap();

        let raw = group.well_data(false).unwrap();
        assert_eq!(raw.len(), 6);

        let combined = group.well_data(true).unwrap();
        // Two replicate aggregates plus the two unreplicated wells of row 2.
        assert_eq!(combined.len(), 4);
        match combined[0] {
            WellDatum::Replicate { group, stats } => {
                assert_eq!(group.name(), "S1 R0");
                assert_eq!(stats.mean, 2.0);
            }
            WellDatum::Well(_) => panic!("expected replicate aggregate first"),
        }
        assert_eq!(combined[0].dilution(), Some(10.0));
        assert_eq!(combined[1].mean(), 15.0);
        assert!(matches!(combined[2], WellDatum::Well(w) if w.position() == Position::new(2, 0)));
        assert_eq!(combined[3].dilution(), None);
    }

    #[test]
    fn group_stats_skip_excluded_wells() {
        let (mut plate, specimen) = specimen_plate();
        let stats = plate.group(specimen).unwrap().stats().unwrap();
        // Values: replicate means 2 and 15, then 7 and 7.
        assert!((stats.mean - 7.75).abs() < 1e-12);
        assert_eq!(stats.count, 4);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 15.0);

        plate.set_excluded(Position::new(2, 0), true).unwrap();
        plate.set_excluded(Position::new(2, 1), true).unwrap();
        plate.set_excluded(Position::new(1, 1), true).unwrap();
        let stats = plate.group(specimen).unwrap().stats().unwrap();
        assert_eq!(stats.count, 2);
        assert!((stats.mean - 6.0).abs() < 1e-12);
        let expected_sd = ((4.0f64 * 4.0 + 4.0 * 4.0) / 1.0).sqrt();
        assert!((stats.std_dev - expected_sd).abs() < 1e-12);
    }

    #[test]
    fn dilution_requires_agreement() {
        let (mut plate, specimen) = specimen_plate();
        assert_eq!(plate.group(specimen).unwrap().dilution(), None);
        let r0 = plate.find_group(WellGroupType::Replicate, "S1 R0").unwrap().id();
        assert_eq!(plate.group(r0).unwrap().dilution(), Some(10.0));
        plate.set_dilution(Position::new(0, 1), Some(11.0)).unwrap();
        assert_eq!(plate.group(r0).unwrap().dilution(), None);
    }

    #[test]
    fn precomputed_stats_come_from_the_store() {
        let (plate, specimen) = specimen_plate();
        let mut store = InMemoryStatsStore::new();
        let stored = WellGroupStats {
            mean: 42.0,
            std_dev: 1.0,
            min: 41.0,
            max: 43.0,
            count: 3,
        };
        store.insert(
            StatsKey {
                run_id: 9,
                plate_number: 2,
                group_name: "S1".to_string(),
                replicate: false,
            },
            stored,
        );
        let plate = plate.with_plate_number(2).with_precomputed_stats(9, Arc::new(store));
        assert!(!plate.must_calculate_stats());
        assert_eq!(plate.group(specimen).unwrap().stats().unwrap(), stored);

        // Replicate rows are missing from the store.
        let r0 = plate.find_group(WellGroupType::Replicate, "S1 R0").unwrap();
        let err = r0.stats().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InconsistentState);
    }
}
