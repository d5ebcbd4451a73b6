//! Worksheet storage: sparse rows of sparse cells.

use std::collections::BTreeMap;

use super::types::{CellStyle, CellValue};

/// A cell: its value and optional styling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetCell {
    pub value: CellValue,
    pub style: Option<CellStyle>,
}

impl SheetCell {
    pub fn new(value: CellValue) -> Self {
        Self { value, style: None }
    }
}

/// A row of cells keyed by zero-based column index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetRow {
    pub(crate) cells: BTreeMap<usize, SheetCell>,
}

impl SheetRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(&self, col: usize) -> Option<&SheetCell> {
        self.cells.get(&col)
    }

    pub fn cell_mut(&mut self, col: usize) -> Option<&mut SheetCell> {
        self.cells.get_mut(&col)
    }

    /// Cells in column order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, &SheetCell)> {
        self.cells.iter().map(|(&c, cell)| (c, cell))
    }

    /// Index of the last cell plus one, 0 for a row without cells.
    pub fn last_cell_num(&self) -> usize {
        self.cells.keys().next_back().map_or(0, |&c| c + 1)
    }

    /// Set a cell, replacing any existing one.
    pub fn set_cell(&mut self, col: usize, cell: SheetCell) {
        self.cells.insert(col, cell);
    }
}

/// A rectangular merged range, all bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MergedRegion {
    pub first_row: usize,
    pub last_row: usize,
    pub first_col: usize,
    pub last_col: usize,
}

impl MergedRegion {
    pub fn contains_row(&self, row: usize) -> bool {
        (self.first_row..=self.last_row).contains(&row)
    }
}

/// One sheet of a workbook.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Worksheet {
    pub(crate) name: String,
    pub(crate) rows: BTreeMap<usize, SheetRow>,
    pub(crate) merges: Vec<MergedRegion>,
}

impl Worksheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row(&self, index: usize) -> Option<&SheetRow> {
        self.rows.get(&index)
    }

    pub fn row_mut(&mut self, index: usize) -> Option<&mut SheetRow> {
        self.rows.get_mut(&index)
    }

    /// Rows in order, with their indices.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &SheetRow)> {
        self.rows.iter().map(|(&r, row)| (r, row))
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&SheetCell> {
        self.rows.get(&row).and_then(|r| r.cell(col))
    }

    #[inline]
    pub fn merged_regions(&self) -> &[MergedRegion] {
        &self.merges
    }

    /// Index of the last row, 0 for an empty sheet.
    pub fn last_row_num(&self) -> usize {
        self.rows.keys().next_back().copied().unwrap_or(0)
    }

    /// Last row index plus one, 0 for a sheet without rows.
    pub fn row_count(&self) -> usize {
        self.rows.keys().next_back().map_or(0, |&r| r + 1)
    }

    /// Replace row `index` with an empty row.
    pub fn create_row(&mut self, index: usize) -> &mut SheetRow {
        self.rows.insert(index, SheetRow::new());
        self.rows.entry(index).or_default()
    }

    /// Row `index`, created empty if missing.
    pub fn row_or_create(&mut self, index: usize) -> &mut SheetRow {
        self.rows.entry(index).or_default()
    }

    /// Cell at (`row`, `col`), created empty along with its row if missing.
    pub fn cell_or_create(&mut self, row: usize, col: usize) -> &mut SheetCell {
        self.row_or_create(row).cells.entry(col).or_default()
    }

    /// Delete row `index` and move every row below it up by one.
    ///
    /// Returns false when `index` is past the last row or the sheet is empty.
    pub fn remove_row(&mut self, index: usize) -> bool {
        let last = self.last_row_num();
        if self.rows.is_empty() || index > last {
            return false;
        }
        self.rows.remove(&index);
        if index != last {
            let below = self.rows.split_off(&(index + 1));
            self.rows.extend(below.into_iter().map(|(r, row)| (r - 1, row)));
        }
        self.merges.retain_mut(|m| {
            if m.first_row > index {
                m.first_row -= 1;
                m.last_row -= 1;
                true
            } else if m.contains_row(index) {
                if m.first_row == m.last_row {
                    return false;
                }
                m.last_row -= 1;
                // A single cell is not a merge
                m.first_row != m.last_row || m.first_col != m.last_col
            } else {
                true
            }
        });
        true
    }

    /// Drop every row and merged region.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.merges.clear();
    }

    pub fn add_merged_region(&mut self, region: MergedRegion) {
        self.merges.push(region);
    }
}
