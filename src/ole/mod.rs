//! OLE2 compound file reader and the legacy formats stored in it.

/// Constants for the compound file format
pub mod consts;

/// Compound file parsing
mod file;

/// Legacy Word document (.doc, .wps) text reader
pub mod doc;

/// Legacy Excel workbook (.xls, .et) BIFF8 reader
pub mod xls;

#[cfg(test)]
pub(crate) mod builder;

pub use file::{DirectoryEntry, OleError, OleFile, is_ole_file};
