//! Auto-placement of keys into the derived grid.
//!
//! Keys without an explicit row take the lowest row whose occupancy is below
//! its capacity; the same rule then picks a column within that row. The grid
//! is a pure function of the layout.

use crate::models::Layout;
use serde::Serialize;
use std::collections::HashMap;

/// Final row and column of one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    /// Grid row
    pub row: usize,
    /// Column within the row
    pub column: usize,
}

/// Keys of one column, by index into the layout's key list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GridColumn {
    /// Key indices in layout order
    pub keys: Vec<usize>,
}

/// One grid row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GridRow {
    /// Columns; empty placeholders keep indices stable
    pub columns: Vec<GridColumn>,
}

impl GridRow {
    /// Number of keys in the row.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.columns.iter().map(|c| c.keys.len()).sum()
    }
}

/// Rows → columns → key indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Grid {
    /// Rows; empty placeholders keep indices stable
    pub rows: Vec<GridRow>,
}

impl Grid {
    /// Key count of the longest row.
    #[must_use]
    pub fn longest_row(&self) -> usize {
        self.rows.iter().map(GridRow::key_count).max().unwrap_or(0)
    }

    /// Key counts per row.
    #[must_use]
    pub fn row_sizes(&self) -> Vec<usize> {
        self.rows.iter().map(GridRow::key_count).collect()
    }

    fn insert(&mut self, placement: Placement, index: usize) {
        if self.rows.len() <= placement.row {
            self.rows.resize_with(placement.row + 1, GridRow::default);
        }
        let row = &mut self.rows[placement.row];
        if row.columns.len() <= placement.column {
            row.columns.resize_with(placement.column + 1, GridColumn::default);
        }
        row.columns[placement.column].keys.push(index);
    }
}

/// Places every key of `layout`.
///
/// Returns one placement per key, in key order, and the grid built from them.
#[must_use]
pub fn place_keys(layout: &Layout) -> (Vec<Placement>, Grid) {
    let mut row_count: HashMap<usize, usize> = HashMap::new();
    let mut column_count: HashMap<(usize, usize), usize> = HashMap::new();

    for key in &layout.keys {
        if let Some(row) = key.row {
            *row_count.entry(row).or_default() += 1;
            if let Some(column) = key.column {
                *column_count.entry((row, column)).or_default() += 1;
            }
        }
    }

    let mut grid = Grid::default();
    let mut placements = Vec::with_capacity(layout.keys.len());

    for (index, key) in layout.keys.iter().enumerate() {
        let row = key.row.unwrap_or_else(|| {
            let row = first_free(|r| row_count.get(&r).copied(), |r| layout.row_capacity(r));
            *row_count.entry(row).or_default() += 1;
            row
        });

        let column = match key.column {
            Some(column) => {
                if key.row.is_none() {
                    *column_count.entry((row, column)).or_default() += 1;
                }
                column
            }
            None => {
                let column = first_free(
                    |c| column_count.get(&(row, c)).copied(),
                    |c| layout.column_capacity(row, c),
                );
                *column_count.entry((row, column)).or_default() += 1;
                column
            }
        };

        let placement = Placement { row, column };
        grid.insert(placement, index);
        placements.push(placement);
    }

    tracing::debug!(
        layout = %layout.name,
        keys = placements.len(),
        rows = grid.rows.len(),
        longest_row = grid.longest_row(),
        "Placed keys"
    );

    (placements, grid)
}

/// Lowest index whose occupancy is strictly below its capacity.
fn first_free(occupancy: impl Fn(usize) -> Option<usize>, capacity: impl Fn(usize) -> Option<usize>) -> usize {
    (0..)
        .find(|&i| capacity(i).map_or(true, |cap| occupancy(i).unwrap_or(0) < cap))
        .unwrap_or_default()
}
