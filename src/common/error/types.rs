//! Unified error type for officekit.
//!
//! Every fallible operation in the crate, from container decoding to
//! workbook index checks and matcher construction, reports through this enum.
use thiserror::Error;

/// Main error type for officekit operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid file format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// File is not a recognized Office format
    #[error("Not a valid Office file")]
    NotOfficeFile,

    /// Corrupted or malformed file
    #[error("Corrupted file: {0}")]
    CorruptedFile(String),

    /// Stream or part not found
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    /// XML parsing error
    #[error("XML error: {0}")]
    XmlError(String),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// Operation not available for this format
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// File name does not carry a known Office extension
    #[error("Unsupported file extension: {0}")]
    UnsupportedExtension(String),

    /// Label pattern or options are unusable
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Positional access outside the valid range
    #[error("{what} index {index} out of range (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// No sheet carries the given name
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Sheet name violates the naming rules
    #[error("Invalid sheet name {name:?}: {reason}")]
    InvalidSheetName { name: String, reason: &'static str },

    /// Header row does not contain the requested column
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Sheet exceeds the configured import limit
    #[error("Sheet has {rows} rows, limit is {limit}")]
    TooManyRows { rows: usize, limit: usize },

    /// `save()` called on a document that was not opened from a path
    #[error("No source path to save to")]
    NoSourcePath,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for an out-of-range index error.
    #[inline]
    pub(crate) fn out_of_range(what: &'static str, index: usize, len: usize) -> Self {
        Error::IndexOutOfRange { what, index, len }
    }
}

/// Result type for officekit operations.
pub type Result<T> = std::result::Result<T, Error>;
