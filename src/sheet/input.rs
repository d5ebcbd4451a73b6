//! Helpers for import jobs that read a sheet by header names.

use std::collections::HashMap;

use super::Workbook;
use crate::common::{Error, Result};

/// Column positions resolved from a header row.
///
/// # Examples
///
/// ```
/// use officekit::{FileFormat, Workbook};
/// use officekit::sheet::ColumnLookup;
///
/// let mut wb = Workbook::new(FileFormat::Xlsx)?;
/// let s = wb.create_sheet(None)?;
/// wb.write_row(s, 0, 0, &["Name", "Age"])?;
/// let columns = ColumnLookup::find(&wb, s, 0, &["age"])?;
/// assert_eq!(columns.get("age"), Some(1));
/// # Ok::<(), officekit::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnLookup {
    columns: HashMap<String, usize>,
}

impl ColumnLookup {
    /// Find each of `names` in row `header_row`.
    ///
    /// Header text is trimmed and compared case-insensitively; the first
    /// matching column wins. Fails with [`Error::ColumnNotFound`] naming the
    /// first header that is missing.
    pub fn find(workbook: &Workbook, sheet: usize, header_row: usize, names: &[&str]) -> Result<Self> {
        let headers = workbook.read_row(sheet, header_row, 0, None)?;
        let mut columns = HashMap::with_capacity(names.len());
        for name in names {
            let wanted = name.trim();
            let position = headers.iter().position(|h| {
                h.as_deref()
                    .is_some_and(|h| h.trim().eq_ignore_ascii_case(wanted))
            });
            match position {
                Some(col) => {
                    columns.insert(wanted.to_ascii_lowercase(), col);
                },
                None => return Err(Error::ColumnNotFound(name.to_string())),
            }
        }
        Ok(Self { columns })
    }

    /// Column of a header, compared case-insensitively.
    pub fn get(&self, name: &str) -> Option<usize> {
        self.columns.get(&name.trim().to_ascii_lowercase()).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Reject sheets holding more than `max` rows.
///
/// `None` uses the workbook's `max_import_rows` option.
pub fn ensure_row_limit(workbook: &Workbook, sheet: usize, max: Option<usize>) -> Result<()> {
    let limit = max.unwrap_or(workbook.options().max_import_rows);
    let rows = workbook.row_count(sheet)?;
    if rows > limit {
        return Err(Error::TooManyRows { rows, limit });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::FileFormat;
    use crate::sheet::WorkbookOptions;

    fn workbook_with_headers() -> Workbook {
        let mut wb = Workbook::new(FileFormat::Xlsx).unwrap();
        let s = wb.create_sheet(Some("Import")).unwrap();
        wb.write_row(s, 0, 0, &[" Name ", "Email", "Age"]).unwrap();
        wb
    }

    #[test]
    fn test_find_columns() {
        let wb = workbook_with_headers();
        let lookup = ColumnLookup::find(&wb, 0, 0, &["age", "NAME"]).unwrap();
        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup.get("Age"), Some(2));
        assert_eq!(lookup.get("name"), Some(0));
        assert_eq!(lookup.get("email"), None);
    }

    #[test]
    fn test_missing_column() {
        let wb = workbook_with_headers();
        let err = ColumnLookup::find(&wb, 0, 0, &["Name", "Phone"]).unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound(ref n) if n == "Phone"));
    }

    #[test]
    fn test_missing_header_row() {
        let wb = workbook_with_headers();
        assert!(matches!(
            ColumnLookup::find(&wb, 0, 5, &["Name"]),
            Err(Error::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_row_limit() {
        let mut wb = workbook_with_headers();
        wb.write(0, 3, 0, "x").unwrap();
        assert!(ensure_row_limit(&wb, 0, Some(4)).is_ok());
        assert!(matches!(
            ensure_row_limit(&wb, 0, Some(3)),
            Err(Error::TooManyRows { rows: 4, limit: 3 })
        ));

        wb.set_options(WorkbookOptions::new().with_max_import_rows(2));
        assert!(matches!(
            ensure_row_limit(&wb, 0, None),
            Err(Error::TooManyRows { rows: 4, limit: 2 })
        ));
    }
}
