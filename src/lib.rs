//! officekit - template filling and cell access for Office documents
//!
//! This library opens word-processing documents and spreadsheets in both the
//! Office Open XML and the legacy OLE2 binary formats, and presents each
//! family through one model.
//!
//! # Features
//!
//! - **Label substitution**: Replace `${name}` style labels in paragraphs and
//!   tables of `.docx`, `.doc` and `.wps` files, keeping run formatting
//! - **Workbook access**: Read and edit cells, rows, styles and merged regions
//!   of `.xlsx`, `.xls` and `.et` files
//! - **Format detection**: Pick the codec from the file content rather than
//!   the extension
//! - **Conversion**: Legacy binaries are read-only and can be re-saved as
//!   DOCX or XLSX
//!
//! # Example - Filling a letter
//!
//! ```no_run
//! use std::collections::HashMap;
//! use officekit::Document;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut doc = Document::open("letter.docx")?;
//! let bindings = HashMap::from([
//!     ("name".to_string(), "Alice".to_string()),
//!     ("day".to_string(), "Monday".to_string()),
//! ]);
//! let resolved = doc.substitute_everywhere(&bindings);
//! println!("resolved {} labels", resolved.len());
//! doc.save_as("letter-filled.docx")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Reading a workbook
//!
//! ```no_run
//! use officekit::Workbook;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let workbook = Workbook::open("report.xls")?;
//! for row in workbook.read_sheet(0)? {
//!     println!("{:?}", row);
//! }
//! # Ok(())
//! # }
//! ```

/// Error type, format detection and low-level readers shared by every format
pub mod common;

/// Word-processing document model and label substitution
pub mod document;

/// Label matching and substitution options
pub mod matcher;

/// OLE2 compound files and the legacy Word and Excel binaries stored in them
pub mod ole;

/// OOXML (Office Open XML) packages, DOCX and XLSX
pub mod ooxml;

/// Workbook model and cell operations
pub mod sheet;

pub use common::{Error, FileFormat, Result, detect_file_format, detect_file_format_from_bytes};
pub use document::{Document, LabelSubstituter};
pub use matcher::{
    Bindings, LabelMatcher, RunStrategy, SubstitutionOptions, Substitutions, UnresolvedPolicy,
};
pub use sheet::{CellStyle, CellValue, Workbook, WorkbookOptions};
