//! Legacy Excel 97-2003 (.xls) and WPS Spreadsheets (.et) reader.
//!
//! The BIFF8 `Workbook` stream is read in two passes: the globals substream
//! (shared strings, fonts, formats, XFs and the sheet directory), then one
//! substream per worksheet. Formula cells keep their cached results. Binary
//! workbooks are read-only: convert a workbook to XLSX to save it.

mod reader;
mod records;

#[cfg(test)]
pub(crate) mod fixture;

use std::io::Cursor;

use tracing::debug;

use crate::common::error::{Error, Result};
use crate::common::FileFormat;
use crate::ole::OleFile;
use crate::sheet::{Workbook, WorkbookCodec};

/// Codec for BIFF8 workbooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsCodec;

impl WorkbookCodec for XlsCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Workbook> {
        let mut ole = OleFile::open(Cursor::new(bytes))?;
        // Excel 5 files name the stream "Book"
        let stream = if ole.exists(&["Workbook"]) {
            ole.open_stream(&["Workbook"])?
        } else {
            ole.open_stream(&["Book"])?
        };
        let globals = reader::read_globals(&stream)?;
        let sheets = reader::read_sheets(&stream, &globals)?;
        debug!(
            bytes = stream.len(),
            sheets = sheets.len(),
            date1904 = globals.date1904,
            "decoded BIFF8 workbook"
        );
        Ok(Workbook::from_sheets(FileFormat::Xls, sheets, globals.date1904))
    }

    fn encode(&self, workbook: &Workbook) -> Result<Vec<u8>> {
        Err(Error::Unsupported(format!(
            "writing {} files; convert the workbook to xlsx to save it",
            workbook.format().extension()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::fixture::*;
    use super::records::FILEPASS;
    use super::*;
    use crate::sheet::{CellStyle, CellValue, MergedRegion};

    fn globals() -> Vec<Vec<u8>> {
        vec![
            font(false),
            font(true),
            number_format(164, "yyyy-mm-dd hh:mm"),
            xf(0, 0, None),
            xf(1, 0, Some(10)),
            xf(0, 14, None),
            xf(0, 164, None),
            sst(&["Name", "Total"]),
        ]
    }

    fn decode(bytes: &[u8]) -> Result<Workbook> {
        XlsCodec.decode(bytes)
    }

    #[test]
    fn test_decode_cell_values() {
        let sheet = FixtureSheet::worksheet(
            "Data",
            vec![
                row(0),
                labelsst(0, 0, 1, 0),
                label(0, 1, 0, "Жук"),
                rk_int(1, 0, 0, 42),
                number(1, 1, 0, 3.25),
                mulrk(2, 0, &[(0, 1), (0, 2), (0, 3)]),
                boolerr(3, 0, 1, false),
                boolerr(3, 1, 0x07, true),
                blank(3, 2, 1),
                formula(4, 0, 10.0, None),
                formula(4, 1, 0.0, Some((0, 0))),
                string_result("done"),
                formula(4, 2, 0.0, Some((1, 1))),
                merged(&[(5, 6, 0, 1)]),
            ],
        );
        let bytes = xls_file("Workbook", workbook_stream(&globals(), &[sheet]));
        let workbook = decode(&bytes).unwrap();

        assert_eq!(workbook.format(), FileFormat::Xls);
        assert_eq!(workbook.sheet_name(0).unwrap(), "Data");
        assert_eq!(
            workbook.read_row(0, 0, 0, None).unwrap(),
            vec![Some("Name".to_string()), Some("Жук".to_string())]
        );
        assert_eq!(workbook.cell_value(0, 1, 0).unwrap(), Some(&CellValue::Int(42)));
        assert_eq!(workbook.read_cell(0, 1, 1).unwrap().as_deref(), Some("3.25"));
        assert_eq!(
            workbook.read_row(0, 2, 0, None).unwrap(),
            vec![Some("1".to_string()), Some("2".to_string()), Some("3".to_string())]
        );
        assert_eq!(workbook.read_cell(0, 3, 0).unwrap().as_deref(), Some("true"));
        assert_eq!(
            workbook.cell_value(0, 3, 1).unwrap(),
            Some(&CellValue::Error("#DIV/0!".to_string()))
        );
        assert_eq!(workbook.cell_value(0, 3, 2).unwrap(), Some(&CellValue::Empty));
        assert_eq!(workbook.read_cell(0, 4, 0).unwrap().as_deref(), Some("10"));
        assert_eq!(workbook.read_cell(0, 4, 1).unwrap().as_deref(), Some("done"));
        assert_eq!(workbook.cell_value(0, 4, 2).unwrap(), Some(&CellValue::Bool(true)));
        assert_eq!(
            workbook.sheet(0).unwrap().merged_regions(),
            &[MergedRegion { first_row: 5, last_row: 6, first_col: 0, last_col: 1 }]
        );
    }

    #[test]
    fn test_decode_styles_and_dates() {
        let sheet = FixtureSheet::worksheet(
            "Styled",
            vec![
                labelsst(0, 0, 1, 1),
                rk_int(1, 0, 2, 45356),
                number(1, 1, 3, 45356.5),
                rk_int(1, 2, 0, 45356),
            ],
        );
        let bytes = xls_file("Workbook", workbook_stream(&globals(), &[sheet]));
        let workbook = decode(&bytes).unwrap();

        let expected = CellStyle::new().with_bold(true).with_fill_color("FF0000");
        assert_eq!(workbook.style(0, 0, 0).unwrap(), Some(&expected));
        assert_eq!(workbook.style(0, 1, 0).unwrap(), None);
        assert_eq!(workbook.read_cell(0, 1, 0).unwrap().as_deref(), Some("2024/03/05 00:00:00"));
        assert_eq!(workbook.read_cell(0, 1, 1).unwrap().as_deref(), Some("2024/03/05 12:00:00"));
        assert_eq!(workbook.read_cell(0, 1, 2).unwrap().as_deref(), Some("45356"));
    }

    #[test]
    fn test_date1904_flag() {
        let mut records = vec![datemode(true)];
        records.extend(globals());
        let bytes = xls_file("Workbook", workbook_stream(&records, &[FixtureSheet::worksheet("S", vec![])]));
        let workbook = decode(&bytes).unwrap();
        assert!(workbook.is_date1904());
        assert_eq!(workbook.row_count(0).unwrap(), 0);
    }

    #[test]
    fn test_chart_sheets_and_embedded_charts_skipped() {
        let sheets = [
            FixtureSheet::worksheet("First", vec![embedded_chart(), rk_int(0, 0, 0, 7)]),
            FixtureSheet { name: "Chart1", kind: 2, records: vec![] },
            FixtureSheet::worksheet("Last", vec![label(0, 0, 0, "x")]),
        ];
        let bytes = xls_file("Workbook", workbook_stream(&globals(), &sheets));
        let workbook = decode(&bytes).unwrap();
        assert_eq!(workbook.sheet_count(), 2);
        assert_eq!(workbook.sheet_index("last"), Some(1));
        assert_eq!(workbook.read_sheet(0).unwrap(), vec![vec![Some("7".to_string())]]);
    }

    #[test]
    fn test_book_stream_fallback() {
        let stream = workbook_stream(&globals(), &[FixtureSheet::worksheet("Old", vec![])]);
        let workbook = decode(&xls_file("Book", stream)).unwrap();
        assert_eq!(workbook.sheet_name(0).unwrap(), "Old");
    }

    #[test]
    fn test_encrypted_and_old_versions_rejected() {
        let encrypted = vec![record(FILEPASS, &[0, 0])];
        let bytes = xls_file("Workbook", workbook_stream(&encrypted, &[]));
        assert!(matches!(decode(&bytes), Err(Error::Unsupported(_))));

        let mut biff5 = bof(0x0500, 0x0005);
        biff5.extend(eof());
        assert!(matches!(decode(&xls_file("Workbook", biff5)), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_missing_shared_string_is_corrupt() {
        let sheet = FixtureSheet::worksheet("S", vec![labelsst(0, 0, 0, 9)]);
        let bytes = xls_file("Workbook", workbook_stream(&globals(), &[sheet]));
        assert!(matches!(decode(&bytes), Err(Error::CorruptedFile(_))));
    }

    #[test]
    fn test_not_ole_and_encode_rejected() {
        assert!(decode(b"PK\x03\x04 not a compound file").is_err());

        let workbook = Workbook::from_sheets(FileFormat::Xls, Vec::new(), false);
        let err = XlsCodec.encode(&workbook).unwrap_err();
        assert!(matches!(err, Error::Unsupported(ref msg) if msg.contains("xlsx")));
    }

    #[test]
    fn test_open_through_workbook_and_convert() {
        let sheet = FixtureSheet::worksheet("Data", vec![labelsst(0, 0, 0, 0), rk_int(0, 1, 0, 5)]);
        let bytes = xls_file("Workbook", workbook_stream(&globals(), &[sheet]));
        let mut workbook = Workbook::from_bytes(&bytes).unwrap();
        assert_eq!(workbook.format(), FileFormat::Xls);
        assert!(matches!(workbook.to_bytes(), Err(Error::Unsupported(_))));

        workbook.convert(FileFormat::Xlsx).unwrap();
        let reopened = Workbook::from_bytes(&workbook.to_bytes().unwrap()).unwrap();
        assert_eq!(reopened.format(), FileFormat::Xlsx);
        assert_eq!(
            reopened.read_row(0, 0, 0, None).unwrap(),
            vec![Some("Name".to_string()), Some("5".to_string())]
        );
    }
}
