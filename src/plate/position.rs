//! Plate coordinates.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A `(row, column)` coordinate on a plate, zero-based.
///
/// Equality, hashing and the natural ordering use `(row, column)`. Well groups
/// order their members with [`Position::column_major`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    row: usize,
    column: usize,
}

impl Position {
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    pub fn row(self) -> usize {
        self.row
    }

    pub fn column(self) -> usize {
        self.column
    }

    /// Column first, then row: the order well groups keep their positions in.
    pub fn column_major(&self, other: &Position) -> Ordering {
        (self.column, self.row).cmp(&(other.column, other.row))
    }

    /// Row label in plate notation: `A`..`Z`, then `AA`, `AB`, ...
    pub fn row_label(self) -> String {
        let mut n = self.row + 1;
        let mut label = Vec::new();
        while n > 0 {
            let rem = (n - 1) % 26;
            label.push(b'A' + rem as u8);
            n = (n - 1) / 26;
        }
        label.reverse();
        String::from_utf8_lossy(&label).into_owned()
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.row_label(), self.column + 1)
    }
}
