//! Spreadsheets.
//!
//! A [`Workbook`] is an ordered list of [`Worksheet`]s decoded from a
//! `.xlsx`, `.xls` or `.et` file. Rows and cells are sparse; reads render
//! cell values as the text a user would see.
//!
//! # Supported Formats
//!
//! - `.xlsx` - Excel 2007+ (Office Open XML), read and write
//! - `.xls` - Excel 97-2003 (BIFF8 in OLE2), read only
//! - `.et` - WPS Spreadsheets, read as `.xls`
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use officekit::Workbook;
//!
//! let mut workbook = Workbook::open("data.xlsx")?;
//! let sheet = workbook.sheet_index("Orders").unwrap_or(0);
//! for row in workbook.read_sheet(sheet)? {
//!     println!("{:?}", row);
//! }
//! workbook.write(sheet, 0, 5, "checked")?;
//! workbook.save()?;
//! # Ok::<(), officekit::Error>(())
//! ```

pub mod format;
pub mod input;
mod options;
mod traits;
mod types;
mod workbook;
mod worksheet;


pub use input::{ColumnLookup, ensure_row_limit};
pub use options::{DEFAULT_DATE_PATTERN, DEFAULT_MAX_IMPORT_ROWS, WorkbookOptions};
pub use traits::{WorkbookCodec, codec_for};
pub use types::{CellStyle, CellValue};
pub use workbook::Workbook;
pub use worksheet::{MergedRegion, SheetCell, SheetRow, Worksheet};
