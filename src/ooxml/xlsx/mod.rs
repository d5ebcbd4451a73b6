//! Excel (.xlsx) codec.
//!
//! Cell values, simple styles (bold, solid fill, date formats) and merged
//! regions are decoded into the workbook model. Encoding writes a fresh
//! package from the model: workbook, one part per sheet, a shared strings
//! table and a style sheet.

pub mod cell_ref;
pub(crate) mod reader;
pub(crate) mod shared_strings;
pub(crate) mod styles;
pub(crate) mod writer;

use tracing::debug;

use crate::common::{FileFormat, Result};
use crate::ooxml::package::Package;
use crate::sheet::{Workbook, WorkbookCodec};

/// Codec for SpreadsheetML packages.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxCodec;

impl WorkbookCodec for XlsxCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Workbook> {
        let package = Package::from_bytes(bytes)?;
        let decoded = reader::read_workbook(&package)?;
        debug!(sheets = decoded.sheets.len(), date1904 = decoded.date1904, "decoded xlsx workbook");
        Ok(Workbook::from_sheets(FileFormat::Xlsx, decoded.sheets, decoded.date1904))
    }

    fn encode(&self, workbook: &Workbook) -> Result<Vec<u8>> {
        let package = writer::write_package(&workbook.sheets, workbook.date1904);
        debug!(sheets = workbook.sheets.len(), "encoded xlsx workbook");
        package.to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::common::detection::detect_file_format_from_bytes;
    use crate::sheet::{CellStyle, CellValue};

    #[test]
    fn test_round_trip_values_and_styles() {
        let mut workbook = Workbook::new(FileFormat::Xlsx).unwrap();
        let s = workbook.create_sheet(Some("Q&A <1>")).unwrap();
        workbook.write_row(s, 0, 0, &["name", "when", "ok"]).unwrap();
        workbook.write(s, 1, 0, "Zoë").unwrap();
        let when = NaiveDate::from_ymd_opt(2023, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        workbook.write_value(s, 1, 1, CellValue::from_datetime(when, false)).unwrap();
        workbook.write_value(s, 1, 2, false).unwrap();
        workbook.write_value(s, 1, 3, -0.125).unwrap();
        workbook.set_style(s, 0, 0, CellStyle::new().with_bold(true)).unwrap();
        workbook.update_cell_background_color(s, 0, 1, "ABCDEF").unwrap();
        workbook.create_sheet(None).unwrap();

        let bytes = XlsxCodec.encode(&workbook).unwrap();
        assert_eq!(detect_file_format_from_bytes(&bytes), Some(FileFormat::Xlsx));
        let decoded = XlsxCodec.decode(&bytes).unwrap();

        assert_eq!(decoded.sheet_count(), 2);
        assert_eq!(decoded.sheet_name(0).unwrap(), "Q&A <1>");
        assert_eq!(decoded.sheet_name(1).unwrap(), "Sheet2");
        assert_eq!(decoded.read_sheet(0).unwrap(), workbook.read_sheet(0).unwrap());
        assert_eq!(decoded.read_cell(0, 1, 1).unwrap().as_deref(), Some("2023/12/31 23:59:00"));
        assert_eq!(decoded.cell_value(0, 1, 3).unwrap(), Some(&CellValue::Float(-0.125)));
        assert_eq!(decoded.style(0, 0, 0).unwrap(), Some(&CellStyle::new().with_bold(true)));
        assert_eq!(
            decoded.style(0, 0, 1).unwrap(),
            Some(&CellStyle::new().with_fill_color("ABCDEF"))
        );
        assert_eq!(decoded.style(0, 1, 0).unwrap(), None);
    }

    #[test]
    fn test_date1904_survives() {
        let mut workbook = Workbook::new(FileFormat::Xlsx).unwrap();
        workbook.date1904 = true;
        workbook.create_sheet(None).unwrap();
        workbook.write_value(0, 0, 0, CellValue::DateTime(0.0)).unwrap();
        let decoded = XlsxCodec.decode(&XlsxCodec.encode(&workbook).unwrap()).unwrap();
        assert!(decoded.is_date1904());
        assert_eq!(decoded.read_cell(0, 0, 0).unwrap().as_deref(), Some("1904/01/01 00:00:00"));
    }

    #[test]
    fn test_not_a_package() {
        assert!(XlsxCodec.decode(b"plain text").is_err());
    }
}
