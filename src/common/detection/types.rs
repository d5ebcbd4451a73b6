//! File format type enumeration.

use std::path::Path;

use crate::common::error::{Error, Result};

/// Formats the crate can open, grouped in two families.
///
/// The word-processing family is `Doc`, `Docx` and `Wps`; the spreadsheet
/// family is `Xls`, `Xlsx` and `Et`. `Wps` and `Et` are the WPS Office
/// spellings of the legacy binary containers and decode as `Doc` and `Xls`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// Microsoft Word Document (OLE2 format, .doc)
    Doc,
    /// Microsoft Word Document (OOXML format, .docx)
    Docx,
    /// WPS Writer document (OLE2 format, .wps)
    Wps,
    /// Microsoft Excel Spreadsheet (OLE2 format, .xls)
    Xls,
    /// Microsoft Excel Spreadsheet (OOXML format, .xlsx)
    Xlsx,
    /// WPS Spreadsheets workbook (OLE2 format, .et)
    Et,
}

impl FileFormat {
    /// Look a format up by file extension, case-insensitively.
    ///
    /// ```
    /// use officekit::FileFormat;
    /// assert_eq!(FileFormat::from_extension("DOCX"), Some(FileFormat::Docx));
    /// assert_eq!(FileFormat::from_extension("pdf"), None);
    /// ```
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "doc" => Some(FileFormat::Doc),
            "docx" => Some(FileFormat::Docx),
            "wps" => Some(FileFormat::Wps),
            "xls" => Some(FileFormat::Xls),
            "xlsx" => Some(FileFormat::Xlsx),
            "et" => Some(FileFormat::Et),
            _ => None,
        }
    }

    /// Look a format up from the extension of `path`.
    ///
    /// Fails with [`Error::UnsupportedExtension`] when the path has no known
    /// Office extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| Error::UnsupportedExtension(path.display().to_string()))
    }

    /// Canonical extension, without the dot.
    #[inline]
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Doc => "doc",
            FileFormat::Docx => "docx",
            FileFormat::Wps => "wps",
            FileFormat::Xls => "xls",
            FileFormat::Xlsx => "xlsx",
            FileFormat::Et => "et",
        }
    }

    /// Whether this is a word-processing format.
    #[inline]
    pub fn is_word(self) -> bool {
        matches!(self, FileFormat::Doc | FileFormat::Docx | FileFormat::Wps)
    }

    /// Whether this is a spreadsheet format.
    #[inline]
    pub fn is_spreadsheet(self) -> bool {
        !self.is_word()
    }

    /// Whether this is an OLE2 binary format.
    #[inline]
    pub fn is_legacy(self) -> bool {
        !matches!(self, FileFormat::Docx | FileFormat::Xlsx)
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}
