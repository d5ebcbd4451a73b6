//! Signature- and extension-based format detection.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use super::types::FileFormat;
use crate::common::error::{Error, Result};
use crate::ole::{OleFile, is_ole_file};
use crate::ooxml::package::Package;

/// ZIP local file header signature
pub const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

/// Detect the format of an in-memory file from its byte signature.
///
/// OLE2 files are classified by their streams (`WordDocument` versus
/// `Workbook`/`Book`); ZIP files by the main content type declared in
/// `[Content_Types].xml`.
pub fn detect_file_format_from_bytes(bytes: &[u8]) -> Option<FileFormat> {
    if is_ole_file(bytes) {
        let ole = OleFile::open(Cursor::new(bytes)).ok()?;
        if ole.exists(&["WordDocument"]) {
            return Some(FileFormat::Doc);
        }
        if ole.exists(&["Workbook"]) || ole.exists(&["Book"]) {
            return Some(FileFormat::Xls);
        }
        return None;
    }

    if bytes.starts_with(ZIP_SIGNATURE) {
        let package = Package::from_bytes(bytes).ok()?;
        let content_types = package.part_str("[Content_Types].xml")?;
        if content_types.contains("wordprocessingml.document.main")
            || content_types.contains("wordprocessingml.template.main")
        {
            return Some(FileFormat::Docx);
        }
        if content_types.contains("spreadsheetml.sheet.main")
            || content_types.contains("spreadsheetml.template.main")
        {
            return Some(FileFormat::Xlsx);
        }
    }

    None
}

/// Detect the format of a file on disk.
///
/// The signature decides the container; the extension only refines an
/// OLE2 result to [`FileFormat::Wps`] or [`FileFormat::Et`].
pub fn detect_file_format<P: AsRef<Path>>(path: P) -> Option<FileFormat> {
    let path = path.as_ref();
    let bytes = fs::read(path).ok()?;
    let detected = detect_file_format_from_bytes(&bytes)?;
    Some(refine_with_extension(detected, path))
}

/// Resolve the format of a file about to be opened from `path`.
///
/// The path must carry a known Office extension; the signature then decides
/// the container and the extension only refines it.
pub(crate) fn resolve_format(path: &Path, bytes: &[u8]) -> Result<FileFormat> {
    FileFormat::from_path(path)?;
    let detected = detect_file_format_from_bytes(bytes).ok_or(Error::NotOfficeFile)?;
    Ok(refine_with_extension(detected, path))
}

/// Refine a signature-based result with the path's extension.
pub(crate) fn refine_with_extension(detected: FileFormat, path: &Path) -> FileFormat {
    match (detected, FileFormat::from_path(path).ok()) {
        (FileFormat::Doc, Some(FileFormat::Wps)) => FileFormat::Wps,
        (FileFormat::Xls, Some(FileFormat::Et)) => FileFormat::Et,
        _ => detected,
    }
}

/// Whether `path` carries a word-processing extension (`.doc`, `.docx`, `.wps`).
pub fn is_word_path<P: AsRef<Path>>(path: P) -> bool {
    FileFormat::from_path(path).is_ok_and(FileFormat::is_word)
}

/// Whether `path` carries a spreadsheet extension (`.xls`, `.xlsx`, `.et`).
pub fn is_spreadsheet_path<P: AsRef<Path>>(path: P) -> bool {
    FileFormat::from_path(path).is_ok_and(FileFormat::is_spreadsheet)
}
