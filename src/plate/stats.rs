//! Well group statistics and the precomputed statistics store.
//!
//! Plates that belong to a saved run read their group statistics from a
//! [`StatsStore`] rather than recomputing them from the wells. Callers go
//! through `WellGroupRef::stats()` either way and cannot tell the paths apart.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Mean, spread and range over a group's replicate-combined values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WellGroupStats {
    pub mean: f64,
    /// Sample standard deviation (`n - 1` denominator).
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// Number of values the statistics were computed over.
    pub count: usize,
}

impl WellGroupStats {
    /// Reduce a list of values.
    ///
    /// - `n == 0`: every statistic is NaN
    /// - `n == 1`: mean/min/max are the value and `std_dev` is NaN
    pub fn from_values(values: &[f64]) -> Self {
        let n = values.len();
        if n == 0 {
            return Self {
                mean: f64::NAN,
                std_dev: f64::NAN,
                min: f64::NAN,
                max: f64::NAN,
                count: 0,
            };
        }

        let mean = values.iter().sum::<f64>() / n as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let std_dev = if n < 2 {
            f64::NAN
        } else {
            let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
            (ss / (n as f64 - 1.0)).sqrt()
        };

        Self {
            mean,
            std_dev,
            min,
            max,
            count: n,
        }
    }
}

/// Lookup key for precomputed statistics: one row per run, plate number,
/// group name and replicate flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatsKey {
    pub run_id: i64,
    pub plate_number: u32,
    pub group_name: String,
    /// True when the row describes a REPLICATE group.
    pub replicate: bool,
}

/// Source of precomputed group statistics.
pub trait StatsStore: std::fmt::Debug + Send + Sync {
    fn lookup(&self, key: &StatsKey) -> Option<WellGroupStats>;
}

/// A stored statistics row as it appears in a JSON export.
///
/// `std_dev` is optional because single-value groups have none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsRecord {
    #[serde(flatten)]
    pub key: StatsKey,
    pub mean: f64,
    pub std_dev: Option<f64>,
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub count: usize,
}

/// `StatsStore` backed by a hash map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStatsStore {
    rows: HashMap<StatsKey, WellGroupStats>,
}

impl InMemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = StatsRecord>) -> Self {
        let mut store = Self::new();
        for r in records {
            let stats = WellGroupStats {
                mean: r.mean,
                std_dev: r.std_dev.unwrap_or(f64::NAN),
                min: r.min,
                max: r.max,
                count: r.count,
            };
            store.insert(r.key, stats);
        }
        store
    }

    pub fn insert(&mut self, key: StatsKey, stats: WellGroupStats) {
        self.rows.insert(key, stats);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl StatsStore for InMemoryStatsStore {
    fn lookup(&self, key: &StatsKey) -> Option<WellGroupStats> {
        self.rows.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_std_dev_uses_n_minus_one() {
        let s = WellGroupStats::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((s.mean - 5.0).abs() < 1e-12);
        // Population sd is 2; sample sd is sqrt(32/7).
        assert!((s.std_dev - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(s.min, 2.0);
        assert_eq!(s.max, 9.0);
        assert_eq!(s.count, 8);
    }

    #[test]
    fn degenerate_sample_sizes() {
        let one = WellGroupStats::from_values(&[3.5]);
        assert_eq!(one.mean, 3.5);
        assert_eq!(one.min, 3.5);
        assert_eq!(one.max, 3.5);
        assert!(one.std_dev.is_nan());

        let none = WellGroupStats::from_values(&[]);
        assert!(none.mean.is_nan() && none.std_dev.is_nan() && none.min.is_nan() && none.max.is_nan());
    }

    #[test]
    fn records_deserialize_into_store() {
        let json = r#"[
            {"run_id": 7, "plate_number": 1, "group_name": "Specimen 1", "replicate": false,
             "mean": 0.5, "std_dev": 0.1, "min": 0.4, "max": 0.6, "count": 4},
            {"run_id": 7, "plate_number": 1, "group_name": "R1", "replicate": true,
             "mean": 0.9, "std_dev": null, "min": 0.9, "max": 0.9}
        ]"#;
        let records: Vec<StatsRecord> = serde_json::from_str(json).unwrap();
        let store = InMemoryStatsStore::from_records(records);
        assert_eq!(store.len(), 2);

        let key = StatsKey {
            run_id: 7,
            plate_number: 1,
            group_name: "R1".to_string(),
            replicate: true,
        };
        let stats = store.lookup(&key).unwrap();
        assert_eq!(stats.mean, 0.9);
        assert!(stats.std_dev.is_nan());
    }
}
