//! The workbook object and its row/column/cell operations.

use std::fmt;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::options::WorkbookOptions;
use super::traits::codec_for;
use super::types::{CellStyle, CellValue};
use super::worksheet::{MergedRegion, SheetCell, Worksheet};
use crate::common::detection::functions::{detect_file_format_from_bytes, resolve_format};
use crate::common::{Error, FileFormat, Result};

const MAX_SHEET_NAME_LEN: usize = 31;
const FORBIDDEN_SHEET_NAME_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];

/// A spreadsheet: an ordered list of named sheets.
///
/// All indices are zero-based. Reads return `None` for cells that do not
/// exist, and render values as text the way a user sees them.
///
/// # Examples
///
/// ```
/// use officekit::{FileFormat, Workbook};
///
/// let mut wb = Workbook::new(FileFormat::Xlsx)?;
/// let s = wb.create_sheet(Some("Orders"))?;
/// wb.write_row(s, 0, 0, &["id", "qty"])?;
/// wb.write_value(s, 1, 1, 3.0)?;
/// assert_eq!(wb.read_row(s, 1, 0, None)?, vec![None, Some("3".to_string())]);
/// # Ok::<(), officekit::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Workbook {
    format: FileFormat,
    source: Option<PathBuf>,
    options: WorkbookOptions,
    pub(crate) sheets: Vec<Worksheet>,
    /// Dates count from 1904-01-01
    pub(crate) date1904: bool,
}

impl Workbook {
    /// Create a workbook without sheets that will be saved as `format`.
    pub fn new(format: FileFormat) -> Result<Self> {
        ensure_spreadsheet(format)?;
        Ok(Self::from_sheets(format, Vec::new(), false))
    }

    pub(crate) fn from_sheets(format: FileFormat, sheets: Vec<Worksheet>, date1904: bool) -> Self {
        Self {
            format,
            source: None,
            options: WorkbookOptions::default(),
            sheets,
            date1904,
        }
    }

    /// Open a workbook, detecting the format from its content.
    ///
    /// The extension must be `.xls`, `.xlsx` or `.et`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let format = resolve_format(path, &bytes)?;
        let mut workbook = decode(format, &bytes)?;
        workbook.source = Some(path.to_path_buf());
        debug!(path = %path.display(), %format, sheets = workbook.sheets.len(), "opened workbook");
        Ok(workbook)
    }

    /// Decode a workbook held in memory, detecting the format.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let format = detect_file_format_from_bytes(bytes).ok_or(Error::NotOfficeFile)?;
        decode(format, bytes)
    }

    /// Decode a workbook of a known format from a reader.
    pub fn from_reader<R: Read>(mut reader: R, format: FileFormat) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        decode(format, &bytes)
    }

    /// Whether `path` has a spreadsheet extension.
    pub fn is_spreadsheet_path<P: AsRef<Path>>(path: P) -> bool {
        crate::common::detection::is_spreadsheet_path(path)
    }

    #[inline]
    pub fn with_options(mut self, options: WorkbookOptions) -> Self {
        self.options = options;
        self
    }

    #[inline]
    pub fn options(&self) -> &WorkbookOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: WorkbookOptions) {
        self.options = options;
    }

    #[inline]
    pub fn format(&self) -> FileFormat {
        self.format
    }

    #[inline]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    #[inline]
    pub fn is_date1904(&self) -> bool {
        self.date1904
    }

    /// Change the format used by the next save.
    pub fn convert(&mut self, format: FileFormat) -> Result<()> {
        ensure_spreadsheet(format)?;
        self.format = format;
        Ok(())
    }

    /// Write back to the path the workbook was opened from.
    pub fn save(&self) -> Result<()> {
        let path = self.source.as_deref().ok_or(Error::NoSourcePath)?;
        self.save_as(path)
    }

    pub fn save_as<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        fs::write(path.as_ref(), bytes)?;
        debug!(path = %path.as_ref().display(), "saved workbook");
        Ok(())
    }

    pub fn save_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.to_bytes()?)?;
        Ok(())
    }

    /// Encode in the current format.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        codec_for(self.format)?.encode(self)
    }

    // Sheets

    #[inline]
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    #[inline]
    pub fn sheets(&self) -> &[Worksheet] {
        &self.sheets
    }

    pub fn sheet(&self, index: usize) -> Result<&Worksheet> {
        let len = self.sheets.len();
        self.sheets.get(index).ok_or(Error::out_of_range("sheet", index, len))
    }

    pub fn sheet_mut(&mut self, index: usize) -> Result<&mut Worksheet> {
        let len = self.sheets.len();
        self.sheets.get_mut(index).ok_or(Error::out_of_range("sheet", index, len))
    }

    /// Position of the sheet named `name`, compared case-insensitively.
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn sheet_name(&self, index: usize) -> Result<&str> {
        Ok(self.sheet(index)?.name())
    }

    /// Rename a sheet.
    ///
    /// Names are 1 to 31 characters, contain none of `: \ / ? * [ ]`, do not
    /// start or end with an apostrophe and are unique ignoring case.
    pub fn set_sheet_name(&mut self, index: usize, name: &str) -> Result<()> {
        self.sheet(index)?;
        self.validate_sheet_name(name, Some(index))?;
        self.sheets[index].name = name.to_string();
        Ok(())
    }

    /// Move the sheet named `name` to position `index`.
    pub fn set_sheet_order(&mut self, name: &str, index: usize) -> Result<()> {
        let from = self
            .sheet_index(name)
            .ok_or_else(|| Error::SheetNotFound(name.to_string()))?;
        if index >= self.sheets.len() {
            return Err(Error::out_of_range("sheet", index, self.sheets.len()));
        }
        let sheet = self.sheets.remove(from);
        self.sheets.insert(index, sheet);
        Ok(())
    }

    /// Append a sheet and return its index.
    ///
    /// Without a name, the first free `SheetN` is used.
    pub fn create_sheet(&mut self, name: Option<&str>) -> Result<usize> {
        let name = match name {
            Some(name) => {
                self.validate_sheet_name(name, None)?;
                name.to_string()
            },
            None => {
                let mut n = self.sheets.len() + 1;
                loop {
                    let candidate = format!("Sheet{}", n);
                    if self.sheet_index(&candidate).is_none() {
                        break candidate;
                    }
                    n += 1;
                }
            },
        };
        self.sheets.push(Worksheet::new(&name));
        Ok(self.sheets.len() - 1)
    }

    /// Remove every row of a sheet, keeping its name and position.
    pub fn clear_sheet(&mut self, index: usize) -> Result<()> {
        self.sheet_mut(index)?.clear();
        Ok(())
    }

    pub fn remove_sheet_at(&mut self, index: usize) -> Result<()> {
        self.sheet(index)?;
        self.sheets.remove(index);
        Ok(())
    }

    pub fn remove_sheet_by_name(&mut self, name: &str) -> Result<()> {
        let index = self
            .sheet_index(name)
            .ok_or_else(|| Error::SheetNotFound(name.to_string()))?;
        self.remove_sheet_at(index)
    }

    /// One-line description of a sheet: position, name and row count.
    pub fn sheet_summary(&self, index: usize) -> Result<String> {
        let sheet = self.sheet(index)?;
        Ok(format!(
            "sheet {} '{}': {} rows",
            index + 1,
            sheet.name(),
            sheet.row_count()
        ))
    }

    fn validate_sheet_name(&self, name: &str, renaming: Option<usize>) -> Result<()> {
        let invalid = |reason| {
            Err(Error::InvalidSheetName {
                name: name.to_string(),
                reason,
            })
        };
        let len = name.chars().count();
        if len == 0 {
            return invalid("name is empty");
        }
        if len > MAX_SHEET_NAME_LEN {
            return invalid("name is longer than 31 characters");
        }
        if name.contains(FORBIDDEN_SHEET_NAME_CHARS) {
            return invalid("name contains one of : \\ / ? * [ ]");
        }
        if name.starts_with('\'') || name.ends_with('\'') {
            return invalid("name starts or ends with an apostrophe");
        }
        match self.sheet_index(name) {
            Some(existing) if Some(existing) != renaming => invalid("another sheet has this name"),
            _ => Ok(()),
        }
    }

    // Rows and cells

    /// Index of the last row plus one, 0 for a sheet without rows.
    pub fn row_count(&self, sheet: usize) -> Result<usize> {
        Ok(self.sheet(sheet)?.row_count())
    }

    /// Index of the last cell of a row plus one, `None` when the row does
    /// not exist.
    pub fn column_count(&self, sheet: usize, row: usize) -> Result<Option<usize>> {
        Ok(self.sheet(sheet)?.row(row).map(|r| r.last_cell_num()))
    }

    pub fn is_null_row(&self, sheet: usize, row: usize) -> Result<bool> {
        Ok(self.sheet(sheet)?.row(row).is_none())
    }

    pub fn is_null_cell(&self, sheet: usize, row: usize, col: usize) -> Result<bool> {
        Ok(self.sheet(sheet)?.cell(row, col).is_none())
    }

    /// Create an empty row, replacing any existing one.
    pub fn create_row(&mut self, sheet: usize, row: usize) -> Result<()> {
        self.sheet_mut(sheet)?.create_row(row);
        Ok(())
    }

    /// Create an empty cell, replacing any existing one.
    pub fn create_cell(&mut self, sheet: usize, row: usize, col: usize) -> Result<()> {
        self.sheet_mut(sheet)?
            .row_or_create(row)
            .set_cell(col, SheetCell::default());
        Ok(())
    }

    /// Delete a row and move the rows below it up by one.
    ///
    /// Returns false when the row is past the end of the sheet.
    pub fn remove_row(&mut self, sheet: usize, row: usize) -> Result<bool> {
        Ok(self.sheet_mut(sheet)?.remove_row(row))
    }

    /// Delete rows `start..=end`, bottom-up. `end` is clamped to the last row.
    ///
    /// Returns true if any row was removed.
    pub fn remove_rows(&mut self, sheet: usize, start: usize, end: usize) -> Result<bool> {
        let ws = self.sheet_mut(sheet)?;
        let count = ws.row_count();
        if count == 0 {
            return Ok(false);
        }
        let end = end.min(count - 1);
        let mut removed = false;
        for row in (start..=end).rev() {
            removed = ws.remove_row(row) || removed;
        }
        Ok(removed)
    }

    // Writes

    /// Store `value` as text, creating the row and cell if needed. The
    /// cell's style is kept.
    pub fn write(&mut self, sheet: usize, row: usize, col: usize, value: &str) -> Result<()> {
        self.write_value(sheet, row, col, value)
    }

    /// Store a typed value, creating the row and cell if needed.
    pub fn write_value(&mut self, sheet: usize, row: usize, col: usize, value: impl Into<CellValue>) -> Result<()> {
        self.sheet_mut(sheet)?.cell_or_create(row, col).value = value.into();
        Ok(())
    }

    /// Write `values` across row `row`, starting at `start_col`.
    pub fn write_row<S: AsRef<str>>(&mut self, sheet: usize, row: usize, start_col: usize, values: &[S]) -> Result<()> {
        let ws = self.sheet_mut(sheet)?;
        for (i, value) in values.iter().enumerate() {
            ws.cell_or_create(row, start_col + i).value = CellValue::from(value.as_ref());
        }
        Ok(())
    }

    /// Write `values` down column `col`, starting at `start_row`.
    pub fn write_column<S: AsRef<str>>(&mut self, sheet: usize, start_row: usize, col: usize, values: &[S]) -> Result<()> {
        let ws = self.sheet_mut(sheet)?;
        for (i, value) in values.iter().enumerate() {
            ws.cell_or_create(start_row + i, col).value = CellValue::from(value.as_ref());
        }
        Ok(())
    }

    /// Write the same text into every cell of a rectangle, bounds inclusive.
    pub fn write_region(
        &mut self,
        sheet: usize,
        first_row: usize,
        last_row: usize,
        first_col: usize,
        last_col: usize,
        value: &str,
    ) -> Result<()> {
        let ws = self.sheet_mut(sheet)?;
        for col in first_col..=last_col {
            for row in first_row..=last_row {
                ws.cell_or_create(row, col).value = CellValue::from(value);
            }
        }
        Ok(())
    }

    // Reads

    /// Typed value of a cell.
    pub fn cell_value(&self, sheet: usize, row: usize, col: usize) -> Result<Option<&CellValue>> {
        Ok(self.sheet(sheet)?.cell(row, col).map(|c| &c.value))
    }

    /// Text of a cell, `None` when the cell does not exist.
    pub fn read_cell(&self, sheet: usize, row: usize, col: usize) -> Result<Option<String>> {
        Ok(self.sheet(sheet)?.cell(row, col).map(|c| self.render(&c.value)))
    }

    /// Text of cells `start_col..=end_col` of a row.
    ///
    /// `end_col` is clamped to the row's last cell; `None` reads to the end.
    /// A missing row reads as a single `None`.
    pub fn read_row(&self, sheet: usize, row: usize, start_col: usize, end_col: Option<usize>) -> Result<Vec<Option<String>>> {
        let ws = self.sheet(sheet)?;
        let Some(r) = ws.row(row) else {
            return Ok(vec![None]);
        };
        let last = r.last_cell_num();
        if last == 0 {
            return Ok(Vec::new());
        }
        let end = end_col.unwrap_or(usize::MAX).min(last - 1);
        if start_col > end {
            return Ok(Vec::new());
        }
        Ok((start_col..=end)
            .map(|c| r.cell(c).map(|cell| self.render(&cell.value)))
            .collect())
    }

    /// Every row from `start` to `end` inclusive, each read in full.
    ///
    /// `end` is clamped to the last row; `None` reads to the end.
    pub fn read_rows(&self, sheet: usize, start: usize, end: Option<usize>) -> Result<Vec<Vec<Option<String>>>> {
        let count = self.sheet(sheet)?.row_count();
        if count == 0 {
            return Ok(Vec::new());
        }
        let end = end.unwrap_or(usize::MAX).min(count - 1);
        if start > end {
            return Ok(Vec::new());
        }
        (start..=end).map(|r| self.read_row(sheet, r, 0, None)).collect()
    }

    /// Every row of a sheet.
    pub fn read_sheet(&self, sheet: usize) -> Result<Vec<Vec<Option<String>>>> {
        self.read_rows(sheet, 0, None)
    }

    /// Text of column `col` for rows `start..=end`, `None` for missing rows
    /// and cells. `end` is clamped to the last row.
    pub fn read_column(&self, sheet: usize, start: usize, end: Option<usize>, col: usize) -> Result<Vec<Option<String>>> {
        let ws = self.sheet(sheet)?;
        let count = ws.row_count();
        if count == 0 {
            return Ok(Vec::new());
        }
        let end = end.unwrap_or(usize::MAX).min(count - 1);
        if start > end {
            return Ok(Vec::new());
        }
        Ok((start..=end)
            .map(|r| ws.cell(r, col).map(|cell| self.render(&cell.value)))
            .collect())
    }

    fn render(&self, value: &CellValue) -> String {
        value.render(&self.options.date_pattern, self.date1904)
    }

    // Styling

    /// Set the style of an existing cell. Returns false if the cell does not
    /// exist.
    pub fn set_style(&mut self, sheet: usize, row: usize, col: usize, style: CellStyle) -> Result<bool> {
        match self.sheet_mut(sheet)?.row_mut(row).and_then(|r| r.cell_mut(col)) {
            Some(cell) => {
                cell.style = (!style.is_plain()).then_some(style);
                Ok(true)
            },
            None => Ok(false),
        }
    }

    pub fn style(&self, sheet: usize, row: usize, col: usize) -> Result<Option<&CellStyle>> {
        Ok(self
            .sheet(sheet)?
            .cell(row, col)
            .and_then(|c| c.style.as_ref()))
    }

    /// Give an existing cell a solid background, keeping its other
    /// formatting. `rgb` is `RRGGBB`, optionally prefixed with `#`.
    ///
    /// Returns false if the cell does not exist.
    pub fn update_cell_background_color(&mut self, sheet: usize, row: usize, col: usize, rgb: &str) -> Result<bool> {
        let rgb = normalize_rgb(rgb)?;
        let mut style = self.style(sheet, row, col)?.cloned().unwrap_or_default();
        style.fill_color = Some(rgb);
        self.set_style(sheet, row, col, style)
    }

    /// Merge a rectangle of cells, bounds inclusive.
    pub fn merge_region(&mut self, sheet: usize, first_row: usize, last_row: usize, first_col: usize, last_col: usize) -> Result<()> {
        if first_row > last_row || first_col > last_col || (first_row == last_row && first_col == last_col) {
            return Err(Error::Other(format!(
                "merged region must span at least two cells: rows {}..={}, columns {}..={}",
                first_row, last_row, first_col, last_col
            )));
        }
        self.sheet_mut(sheet)?.add_merged_region(MergedRegion {
            first_row,
            last_row,
            first_col,
            last_col,
        });
        Ok(())
    }
}

impl fmt::Display for Workbook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} workbook: {} sheets", self.format, self.sheets.len())
    }
}

fn ensure_spreadsheet(format: FileFormat) -> Result<()> {
    if format.is_spreadsheet() {
        Ok(())
    } else {
        Err(Error::InvalidFormat(format!("{} is not a spreadsheet format", format)))
    }
}

fn decode(format: FileFormat, bytes: &[u8]) -> Result<Workbook> {
    let mut workbook = codec_for(format)?.decode(bytes)?;
    workbook.format = format;
    Ok(workbook)
}

/// `#rrggbb`, `RRGGBB` or `AARRGGBB` to `RRGGBB`.
fn normalize_rgb(rgb: &str) -> Result<String> {
    let hex = rgb.trim_start_matches('#');
    let hex = match hex.len() {
        8 => hex.get(2..).unwrap_or_default(),
        _ => hex,
    };
    if hex.len() == 6 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(hex.to_ascii_uppercase())
    } else {
        Err(Error::Other(format!("invalid RGB color {:?}", rgb)))
    }
}
