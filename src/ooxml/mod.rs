//! Office Open XML (OOXML) format implementation.
//!
//! This module reads and writes the ZIP based Office formats:
//!
//! - `package`: Open Packaging Conventions container (parts, relationships, content types)
//! - `docx`: WordprocessingML main document part
//! - `xlsx`: SpreadsheetML workbook, worksheets, shared strings and styles
//!
//! Word documents keep every part they do not model, so a load and save
//! only rewrites the main document part.

pub mod constants;
pub mod docx;
pub mod package;
pub mod xlsx;

pub use package::{Package, Relationship};
