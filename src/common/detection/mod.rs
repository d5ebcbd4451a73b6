//! File format detection.
//!
//! Formats are identified by container signature first (OLE2 magic or ZIP
//! local header) and refined by the streams or content types inside.
//! Extension lookups are available separately for path-based dispatch.

pub mod functions;
pub mod types;

pub use functions::{
    detect_file_format, detect_file_format_from_bytes, is_spreadsheet_path, is_word_path,
};
pub use types::FileFormat;
