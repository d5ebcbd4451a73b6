//! Types and helpers shared by the word-processing and spreadsheet layers.

pub mod binary;
pub mod detection;
pub mod error;
pub mod xml;

pub use detection::{FileFormat, detect_file_format, detect_file_format_from_bytes};
pub use error::{Error, Result};
