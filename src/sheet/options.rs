use serde::{Deserialize, Serialize};

/// Default strftime pattern for date cells.
pub const DEFAULT_DATE_PATTERN: &str = "%Y/%m/%d %H:%M:%S";
/// Default upper bound on rows accepted by an import job.
pub const DEFAULT_MAX_IMPORT_ROWS: usize = 30_000;

/// Settings for reading cell text.
///
/// # Examples
///
/// ```
/// use officekit::sheet::WorkbookOptions;
///
/// let opts = WorkbookOptions::new().with_date_pattern("%Y-%m-%d");
/// assert_eq!(opts.max_import_rows, 30_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbookOptions {
    /// chrono strftime pattern used to render date cells
    pub date_pattern: String,
    /// Row limit checked by [`ensure_row_limit`](super::input::ensure_row_limit)
    pub max_import_rows: usize,
}

impl Default for WorkbookOptions {
    fn default() -> Self {
        Self {
            date_pattern: DEFAULT_DATE_PATTERN.to_string(),
            max_import_rows: DEFAULT_MAX_IMPORT_ROWS,
        }
    }
}

impl WorkbookOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_date_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.date_pattern = pattern.into();
        self
    }

    #[inline]
    pub fn with_max_import_rows(mut self, rows: usize) -> Self {
        self.max_import_rows = rows;
        self
    }
}
