//! Tables, rows and cells.

use super::{BodyElement, Paragraph};

/// A 2-D grid of cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub(crate) open_tag: Option<String>,
    /// Markup before the first row (table properties, grid)
    pub(crate) leading: String,
    pub(crate) rows: Vec<Row>,
}

impl Table {
    /// Create a `rows` x `cols` table of empty cells.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows: (0..rows).map(|_| Row::new(cols)).collect(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[inline]
    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.cells.get(col))
    }

    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
        self.rows.get_mut(row).and_then(|r| r.cells.get_mut(col))
    }

    /// Widest row, in cells.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
    }
}

/// A table row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub(crate) open_tag: Option<String>,
    /// Markup before the first cell (row properties)
    pub(crate) leading: String,
    pub(crate) cells: Vec<Cell>,
    /// Markup after the row, before the next one
    pub(crate) trailing: String,
}

impl Row {
    pub fn new(cols: usize) -> Self {
        Self {
            cells: (0..cols).map(|_| Cell::new()).collect(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

/// A table cell holding block content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub(crate) open_tag: Option<String>,
    /// Raw cell properties markup
    pub(crate) properties: Option<String>,
    pub(crate) elements: Vec<BodyElement>,
    /// Markup after the cell, before the next one
    pub(crate) trailing: String,
}

impl Cell {
    /// Create a cell with one empty paragraph.
    pub fn new() -> Self {
        Self {
            elements: vec![BodyElement::Paragraph(Paragraph::new())],
            ..Self::default()
        }
    }

    /// Paragraphs directly inside this cell, in order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.elements.iter().filter_map(BodyElement::as_paragraph)
    }

    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.elements.iter_mut().filter_map(|e| match e {
            BodyElement::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Blocks of the cell, including nested tables.
    #[inline]
    pub fn elements(&self) -> &[BodyElement] {
        &self.elements
    }

    #[inline]
    pub fn elements_mut(&mut self) -> &mut [BodyElement] {
        &mut self.elements
    }

    /// Paragraph texts of the cell.
    pub fn texts(&self) -> Vec<String> {
        self.paragraphs().map(Paragraph::text).collect()
    }

    /// Cell text with paragraphs joined by `\n`.
    pub fn text(&self) -> String {
        self.texts().join("\n")
    }

    /// Replace the cell content with a single paragraph of `text`.
    pub fn set_text(&mut self, text: &str) {
        self.elements
            .retain(|e| !matches!(e, BodyElement::Paragraph(_)));
        self.elements
            .insert(0, BodyElement::Paragraph(Paragraph::with_text(text)));
    }
}
