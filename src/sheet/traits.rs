//! Format-family dispatch for workbooks.

use super::Workbook;
use crate::common::{Error, FileFormat, Result};
use crate::ole::xls::XlsCodec;
use crate::ooxml::xlsx::XlsxCodec;

/// Decoder and encoder for one spreadsheet container family.
pub trait WorkbookCodec {
    /// Decode a whole file held in memory.
    fn decode(&self, bytes: &[u8]) -> Result<Workbook>;

    /// Encode `workbook` into this codec's container.
    fn encode(&self, workbook: &Workbook) -> Result<Vec<u8>>;
}

/// Codec handling `format`.
pub fn codec_for(format: FileFormat) -> Result<&'static dyn WorkbookCodec> {
    match format {
        FileFormat::Xlsx => Ok(&XlsxCodec),
        FileFormat::Xls | FileFormat::Et => Ok(&XlsCodec),
        other => Err(Error::InvalidFormat(format!("{} is not a spreadsheet format", other))),
    }
}
