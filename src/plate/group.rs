//! Well groups: named, typed sets of plate positions.
//!
//! A [`WellGroup`] is stored in its plate's group arena and addressed by
//! [`GroupId`]. Read access goes through [`WellGroupRef`], a borrowed view that
//! pairs the id with the owning plate, so groups never hold a pointer back to
//! the plate.
//!
//! Overlaps and statistics are computed on first use and cached in the group
//! record. Mutations through `&mut Plate` clear the caches.

use std::collections::HashSet;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::plate::stats::{StatsKey, WellGroupStats};
use crate::plate::{Plate, Position, Well, WellData};

/// Role of a well group on the plate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WellGroupType {
    Control,
    Specimen,
    Replicate,
    Other,
}

/// Index of a group in its plate's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub(crate) usize);

/// Stored group record.
#[derive(Debug, Clone)]
pub struct WellGroup {
    name: String,
    group_type: WellGroupType,
    /// Sorted column-major, no duplicates.
    positions: Vec<Position>,
    overlaps: OnceLock<Vec<GroupId>>,
    stats: OnceLock<WellGroupStats>,
}

impl WellGroup {
    pub(crate) fn new(name: String, group_type: WellGroupType, mut positions: Vec<Position>) -> Self {
        positions.sort_by(Position::column_major);
        positions.dedup();
        Self {
            name,
            group_type,
            positions,
            overlaps: OnceLock::new(),
            stats: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group_type(&self) -> WellGroupType {
        self.group_type
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn contains(&self, position: Position) -> bool {
        self.positions
            .binary_search_by(|p| p.column_major(&position))
            .is_ok()
    }

    pub(crate) fn clear_overlaps(&mut self) {
        self.overlaps.take();
    }

    pub(crate) fn clear_stats(&mut self) {
        self.stats.take();
    }
}

/// Borrowed view of a group together with its plate.
#[derive(Clone, Copy)]
pub struct WellGroupRef<'a> {
    plate: &'a Plate,
    id: GroupId,
}

impl std::fmt::Debug for WellGroupRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WellGroupRef")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("type", &self.group_type())
            .finish()
    }
}

impl<'a> WellGroupRef<'a> {
    pub(crate) fn new(plate: &'a Plate, id: GroupId) -> Self {
        Self { plate, id }
    }

    fn record(&self) -> &'a WellGroup {
        self.plate.group_record(self.id)
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn plate(&self) -> &'a Plate {
        self.plate
    }

    pub fn name(&self) -> &'a str {
        self.record().name()
    }

    pub fn group_type(&self) -> WellGroupType {
        self.record().group_type()
    }

    pub fn positions(&self) -> &'a [Position] {
        self.record().positions()
    }

    /// First position in column-major order.
    pub fn top_left(&self) -> Option<Position> {
        self.positions().first().copied()
    }

    pub fn contains(&self, position: Position) -> bool {
        self.record().contains(position)
    }

    /// The group's wells, in position order.
    pub fn wells(&self) -> impl Iterator<Item = &'a Well> + use<'a> {
        let plate = self.plate;
        self.positions().iter().filter_map(move |p| plate.well_at(*p).ok())
    }

    /// The dilution shared by every well, or `None` when the wells disagree,
    /// any well has no dilution, or the group is empty.
    pub fn dilution(&self) -> Option<f64> {
        let mut wells = self.wells();
        let first = wells.next()?.dilution()?;
        for well in wells {
            if well.dilution() != Some(first) {
                return None;
            }
        }
        Some(first)
    }

    /// Every other group on the plate sharing at least one position.
    pub fn overlapping_groups(&self) -> Vec<WellGroupRef<'a>> {
        let ids = self
            .record()
            .overlaps
            .get_or_init(|| self.compute_overlaps());
        ids.iter().map(|id| WellGroupRef::new(self.plate, *id)).collect()
    }

    pub fn overlaps(&self, other: &WellGroupRef<'_>) -> bool {
        self.id != other.id && self.positions().iter().any(|p| other.contains(*p))
    }

    fn compute_overlaps(&self) -> Vec<GroupId> {
        let mut out = Vec::new();
        for &position in self.positions() {
            for group in self.plate.groups_containing(position) {
                if group.id != self.id && !out.contains(&group.id) {
                    out.push(group.id);
                }
            }
        }
        out
    }

    /// The group's data points.
    ///
    /// With `combine_replicates`, positions covered by an overlapping REPLICATE
    /// group are replaced by one aggregate datum per replicate group, emitted at
    /// its first covered position. Other positions pass through as wells.
    pub fn well_data(&self, combine_replicates: bool) -> Result<Vec<WellDatum<'a>>, AppError> {
        let mut out = Vec::with_capacity(self.positions().len());
        if !combine_replicates {
            for &position in self.positions() {
                out.push(WellDatum::Well(self.plate.well_at(position)?));
            }
            return Ok(out);
        }

        let replicates: Vec<WellGroupRef<'a>> = self
            .overlapping_groups()
            .into_iter()
            .filter(|g| g.group_type() == WellGroupType::Replicate)
            .collect();
        let mut emitted: HashSet<GroupId> = HashSet::new();

        for &position in self.positions() {
            let mut covered = false;
            for replicate in replicates.iter().filter(|r| r.contains(position)) {
                covered = true;
                if emitted.insert(replicate.id) {
                    out.push(WellDatum::Replicate {
                        group: *replicate,
                        stats: replicate.stats()?,
                    });
                }
            }
            if !covered {
                out.push(WellDatum::Well(self.plate.well_at(position)?));
            }
        }
        Ok(out)
    }

    /// Group statistics, computed once per group instance.
    ///
    /// Plates without a run compute from the wells; plates with a run read the
    /// stored row and fail with `InconsistentState` if it is missing.
    pub fn stats(&self) -> Result<WellGroupStats, AppError> {
        let cell = &self.record().stats;
        if let Some(stats) = cell.get() {
            return Ok(*stats);
        }
        let stats = if self.plate.must_calculate_stats() {
            self.compute_stats()?
        } else {
            self.stored_stats()?
        };
        Ok(*cell.get_or_init(|| stats))
    }

    pub fn mean(&self) -> Result<f64, AppError> {
        Ok(self.stats()?.mean)
    }

    pub fn std_dev(&self) -> Result<f64, AppError> {
        Ok(self.stats()?.std_dev)
    }

    pub fn min(&self) -> Result<f64, AppError> {
        Ok(self.stats()?.min)
    }

    pub fn max(&self) -> Result<f64, AppError> {
        Ok(self.stats()?.max)
    }

    fn compute_stats(&self) -> Result<WellGroupStats, AppError> {
        // Replicate groups reduce their own wells; combining them again would
        // recurse into any replicate group they overlap.
        if self.group_type() == WellGroupType::Replicate {
            let values: Vec<f64> = self
                .wells()
                .filter(|w| !w.is_excluded())
                .map(|w| w.value())
                .collect();
            return Ok(WellGroupStats::from_values(&values));
        }

        let mut values = Vec::new();
        for datum in self.well_data(true)? {
            if !datum.is_excluded() {
                values.push(datum.mean());
            }
        }
        Ok(WellGroupStats::from_values(&values))
    }

    fn stored_stats(&self) -> Result<WellGroupStats, AppError> {
        let (Some(run_id), Some(store)) = (self.plate.run_id(), self.plate.stats_store()) else {
            return Err(AppError::inconsistent_state(format!(
                "Plate '{}' has no statistics store for group '{}'.",
                self.plate.name(),
                self.name()
            )));
        };
        let key = StatsKey {
            run_id,
            plate_number: self.plate.plate_number(),
            group_name: self.name().to_string(),
            replicate: self.group_type() == WellGroupType::Replicate,
        };
        store.lookup(&key).ok_or_else(|| {
            AppError::inconsistent_state(format!(
                "No stored statistics for group '{}' (run {run_id}, plate {}).",
                key.group_name, key.plate_number
            ))
        })
    }
}

/// One data point of a group: a single well or an aggregated replicate group.
#[derive(Debug, Clone, Copy)]
pub enum WellDatum<'a> {
    Well(&'a Well),
    Replicate {
        group: WellGroupRef<'a>,
        stats: WellGroupStats,
    },
}

impl WellDatum<'_> {
    /// Plate position of a well, or the top-left position of a replicate group.
    pub fn position(&self) -> Option<Position> {
        match self {
            WellDatum::Well(w) => Some(w.position()),
            WellDatum::Replicate { group, .. } => group.top_left(),
        }
    }

    /// A replicate aggregate counts as excluded when none of its wells is.
    pub fn is_excluded(&self) -> bool {
        match self {
            WellDatum::Well(w) => w.is_excluded(),
            WellDatum::Replicate { stats, .. } => stats.count == 0,
        }
    }
}

impl WellData for WellDatum<'_> {
    fn mean(&self) -> f64 {
        match self {
            WellDatum::Well(w) => w.mean(),
            WellDatum::Replicate { stats, .. } => stats.mean,
        }
    }

    fn min(&self) -> f64 {
        match self {
            WellDatum::Well(w) => WellData::min(*w),
            WellDatum::Replicate { stats, .. } => stats.min,
        }
    }

    fn max(&self) -> f64 {
        match self {
            WellDatum::Well(w) => WellData::max(*w),
            WellDatum::Replicate { stats, .. } => stats.max,
        }
    }

    fn std_dev(&self) -> f64 {
        match self {
            WellDatum::Well(w) => w.std_dev(),
            WellDatum::Replicate { stats, .. } => stats.std_dev,
        }
    }

    fn dilution(&self) -> Option<f64> {
        match self {
            WellDatum::Well(w) => w.dilution(),
            WellDatum::Replicate { group, .. } => group.dilution(),
        }
    }
}
