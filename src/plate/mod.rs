//! Plate data model: positions, wells, well groups and group statistics.
//!
//! - `Plate` owns every well and group (arena + `GroupId` index)
//! - `WellGroupRef` is the read view handed to the fitter and reporting layers
//! - statistics are computed from wells or read from a `StatsStore`

pub mod group;
#[allow(clippy::module_inception)]
pub mod plate;
pub mod position;
pub mod stats;
pub mod well;

pub use group::*;
pub use plate::*;
pub use position::*;
pub use stats::*;
pub use well::*;
