//! BIFF8 workbooks for tests.
//!
//! Records are assembled by hand, the BOUNDSHEET offsets are patched in once
//! the globals length is known, and the stream is wrapped in a compound
//! file.

use super::records::*;
use crate::ole::builder::CompoundFileBuilder;

const SUBSTREAM_WORKSHEET: u16 = 0x0010;
const SUBSTREAM_CHART: u16 = 0x0020;

/// One sheet of a fixture workbook.
pub(crate) struct FixtureSheet {
    pub(crate) name: &'static str,
    /// BOUNDSHEET sheet type: 0 worksheet, 2 chart
    pub(crate) kind: u8,
    pub(crate) records: Vec<Vec<u8>>,
}

impl FixtureSheet {
    pub(crate) fn worksheet(name: &'static str, records: Vec<Vec<u8>>) -> Self {
        Self { name, kind: 0, records }
    }
}

/// A raw record with its four-byte header.
pub(crate) fn record(record_type: u16, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + data.len());
    out.extend_from_slice(&record_type.to_le_bytes());
    out.extend_from_slice(&(data.len() as u16).to_le_bytes());
    out.extend_from_slice(data);
    out
}

pub(crate) fn bof(version: u16, substream: u16) -> Vec<u8> {
    let mut data = vec![0u8; 16];
    data[0..2].copy_from_slice(&version.to_le_bytes());
    data[2..4].copy_from_slice(&substream.to_le_bytes());
    record(BOF, &data)
}

pub(crate) fn eof() -> Vec<u8> {
    record(EOF, &[])
}

/// Character count, option byte and characters; compressed when possible.
fn string_body(text: &str, wide_count: bool) -> Vec<u8> {
    let units: Vec<u16> = text.encode_utf16().collect();
    let mut out = Vec::new();
    if wide_count {
        out.extend_from_slice(&(units.len() as u16).to_le_bytes());
    } else {
        out.push(units.len() as u8);
    }
    if units.iter().all(|&u| u < 0x100) {
        out.push(0);
        out.extend(units.iter().map(|&u| u as u8));
    } else {
        out.push(1);
        for unit in units {
            out.extend_from_slice(&unit.to_le_bytes());
        }
    }
    out
}

pub(crate) fn datemode(date1904: bool) -> Vec<u8> {
    record(DATEMODE, &u16::from(date1904).to_le_bytes())
}

pub(crate) fn font(bold: bool) -> Vec<u8> {
    let mut data = vec![0u8; 14];
    data[0..2].copy_from_slice(&200u16.to_le_bytes());
    let weight: u16 = if bold { 700 } else { 400 };
    data[6..8].copy_from_slice(&weight.to_le_bytes());
    data.extend(string_body("Arial", false));
    record(FONT, &data)
}

pub(crate) fn number_format(id: u16, code: &str) -> Vec<u8> {
    let mut data = id.to_le_bytes().to_vec();
    data.extend(string_body(code, true));
    record(FORMAT, &data)
}

/// An XF with the given font, number format and optional solid fill color.
pub(crate) fn xf(font: u16, format: u16, fill: Option<u16>) -> Vec<u8> {
    let mut data = vec![0u8; 20];
    data[0..2].copy_from_slice(&font.to_le_bytes());
    data[2..4].copy_from_slice(&format.to_le_bytes());
    if let Some(color) = fill {
        data[14..18].copy_from_slice(&(1u32 << 26).to_le_bytes());
        data[18..20].copy_from_slice(&(color | (65 << 7)).to_le_bytes());
    }
    record(XF, &data)
}

/// SST holding `strings` in a single record.
pub(crate) fn sst(strings: &[&str]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&(strings.len() as u32).to_le_bytes());
    data.extend_from_slice(&(strings.len() as u32).to_le_bytes());
    for text in strings {
        data.extend(string_body(text, true));
    }
    record(SST, &data)
}

fn cell(row: u16, col: u16, xf: u16) -> Vec<u8> {
    let mut data = Vec::with_capacity(14);
    data.extend_from_slice(&row.to_le_bytes());
    data.extend_from_slice(&col.to_le_bytes());
    data.extend_from_slice(&xf.to_le_bytes());
    data
}

pub(crate) fn row(index: u16) -> Vec<u8> {
    let mut data = vec![0u8; 16];
    data[0..2].copy_from_slice(&index.to_le_bytes());
    record(ROW, &data)
}

pub(crate) fn number(row: u16, col: u16, xf: u16, value: f64) -> Vec<u8> {
    let mut data = cell(row, col, xf);
    data.extend_from_slice(&value.to_le_bytes());
    record(NUMBER, &data)
}

/// RK holding a 30-bit integer.
pub(crate) fn rk_int(row: u16, col: u16, xf: u16, value: i32) -> Vec<u8> {
    let mut data = cell(row, col, xf);
    data.extend_from_slice(&(((value << 2) | 0x02) as u32).to_le_bytes());
    record(RK, &data)
}

/// MULRK of integers starting at `first_col`.
pub(crate) fn mulrk(row: u16, first_col: u16, values: &[(u16, i32)]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&row.to_le_bytes());
    data.extend_from_slice(&first_col.to_le_bytes());
    for (xf, value) in values {
        data.extend_from_slice(&xf.to_le_bytes());
        data.extend_from_slice(&(((value << 2) | 0x02) as u32).to_le_bytes());
    }
    let last = first_col + values.len() as u16 - 1;
    data.extend_from_slice(&last.to_le_bytes());
    record(MULRK, &data)
}

pub(crate) fn labelsst(row: u16, col: u16, xf: u16, index: u32) -> Vec<u8> {
    let mut data = cell(row, col, xf);
    data.extend_from_slice(&index.to_le_bytes());
    record(LABELSST, &data)
}

pub(crate) fn label(row: u16, col: u16, xf: u16, text: &str) -> Vec<u8> {
    let mut data = cell(row, col, xf);
    data.extend(string_body(text, true));
    record(LABEL, &data)
}

pub(crate) fn boolerr(row: u16, col: u16, value: u8, is_error: bool) -> Vec<u8> {
    let mut data = cell(row, col, 0);
    data.push(value);
    data.push(u8::from(is_error));
    record(BOOLERR, &data)
}

pub(crate) fn blank(row: u16, col: u16, xf: u16) -> Vec<u8> {
    record(BLANK, &cell(row, col, xf))
}

/// FORMULA with a cached result; `special` is the type byte of a
/// non-numeric result and its payload byte.
pub(crate) fn formula(row: u16, col: u16, number: f64, special: Option<(u8, u8)>) -> Vec<u8> {
    let mut data = cell(row, col, 0);
    match special {
        Some((kind, payload)) => data.extend_from_slice(&[kind, 0, payload, 0, 0, 0, 0xFF, 0xFF]),
        None => data.extend_from_slice(&number.to_le_bytes()),
    }
    // Flags, chn and an empty parsed expression
    data.extend_from_slice(&[0u8; 8]);
    record(FORMULA, &data)
}

pub(crate) fn string_result(text: &str) -> Vec<u8> {
    record(STRING, &string_body(text, true))
}

pub(crate) fn merged(regions: &[(u16, u16, u16, u16)]) -> Vec<u8> {
    let mut data = (regions.len() as u16).to_le_bytes().to_vec();
    for (first_row, last_row, first_col, last_col) in regions {
        for v in [first_row, last_row, first_col, last_col] {
            data.extend_from_slice(&v.to_le_bytes());
        }
    }
    record(MERGEDCELLS, &data)
}

/// An embedded chart substream, as found inside worksheets.
pub(crate) fn embedded_chart() -> Vec<u8> {
    let mut out = bof(BIFF8, SUBSTREAM_CHART);
    out.extend(number(0, 0, 0, 99.0));
    out.extend(eof());
    out
}

fn boundsheet(offset: u32, kind: u8, name: &str) -> Vec<u8> {
    let mut data = offset.to_le_bytes().to_vec();
    data.push(0);
    data.push(kind);
    data.extend(string_body(name, false));
    record(BOUNDSHEET, &data)
}

/// A complete BIFF8 `Workbook` stream.
pub(crate) fn workbook_stream(globals: &[Vec<u8>], sheets: &[FixtureSheet]) -> Vec<u8> {
    let mut head = bof(BIFF8, 0x0005);
    for r in globals {
        head.extend_from_slice(r);
    }
    let bound_len: usize = sheets.iter().map(|s| boundsheet(0, s.kind, s.name).len()).sum();
    let globals_len = head.len() + bound_len + eof().len();

    let mut bodies = Vec::new();
    let mut offset = globals_len;
    for sheet in sheets {
        let substream = if sheet.kind == 0 { SUBSTREAM_WORKSHEET } else { SUBSTREAM_CHART };
        let mut body = bof(BIFF8, substream);
        for r in &sheet.records {
            body.extend_from_slice(r);
        }
        body.extend(eof());
        head.extend(boundsheet(offset as u32, sheet.kind, sheet.name));
        offset += body.len();
        bodies.push(body);
    }
    head.extend(eof());
    for body in bodies {
        head.extend(body);
    }
    head
}

/// Wrap a workbook stream in a compound file under `stream_name`.
pub(crate) fn xls_file(stream_name: &str, stream: Vec<u8>) -> Vec<u8> {
    CompoundFileBuilder::new().stream(stream_name, stream).build()
}
