//! Workbook globals and worksheet substreams of a BIFF8 `Workbook` stream.

use std::collections::HashMap;

use tracing::{debug, trace};

use super::records::*;
use crate::common::binary::{read_f64_le, read_u16_le};
use crate::common::error::{Error, Result};
use crate::sheet::format::{is_builtin_date_format, is_date_format_code};
use crate::sheet::{CellStyle, CellValue, MergedRegion, SheetCell, Worksheet};

/// Sheet type of a worksheet in BOUNDSHEET
const SHEET_TYPE_WORKSHEET: u8 = 0x00;
/// Substream type of the workbook globals in BOF
const SUBSTREAM_GLOBALS: u16 = 0x0005;
/// Font weight from which a font is bold
const BOLD_WEIGHT: u16 = 700;
/// Solid fill pattern
const FILL_SOLID: u32 = 1;

/// Standard colors for palette indices 8 to 63.
const DEFAULT_PALETTE: [u32; 56] = [
    0x000000, 0xFFFFFF, 0xFF0000, 0x00FF00, 0x0000FF, 0xFFFF00, 0xFF00FF, 0x00FFFF,
    0x800000, 0x008000, 0x000080, 0x808000, 0x800080, 0x008080, 0xC0C0C0, 0x808080,
    0x9999FF, 0x993366, 0xFFFFCC, 0xCCFFFF, 0x660066, 0xFF8080, 0x0066CC, 0xCCCCFF,
    0x000080, 0xFF00FF, 0xFFFF00, 0x00FFFF, 0x800080, 0x800000, 0x008080, 0x0000FF,
    0x00CCFF, 0xCCFFFF, 0xCCFFCC, 0xFFFF99, 0x99CCFF, 0xFF99CC, 0xCC99FF, 0xFFCC99,
    0x3366FF, 0x33CCCC, 0x99CC00, 0xFFCC00, 0xFF9900, 0xFF6600, 0x666699, 0x969696,
    0x003366, 0x339966, 0x003300, 0x333300, 0x993300, 0x993366, 0x333399, 0x333333,
];

/// An XF record reduced to what cells need.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct XfFormat {
    pub(crate) is_date: bool,
    pub(crate) style: Option<CellStyle>,
}

#[derive(Debug)]
struct BoundSheet {
    name: String,
    offset: usize,
    sheet_type: u8,
}

/// Everything the worksheet substreams refer to.
#[derive(Debug, Default)]
pub(crate) struct Globals {
    pub(crate) date1904: bool,
    sheets: Vec<BoundSheet>,
    strings: Vec<String>,
    formats: Vec<XfFormat>,
}

struct RawXf {
    font: usize,
    format: u16,
    pattern: u32,
    fore_color: u16,
}

pub(crate) fn read_globals(stream: &[u8]) -> Result<Globals> {
    let mut records = RecordIter::new(stream, 0);
    let bof = records
        .next()
        .transpose()?
        .filter(|r| r.record_type == BOF)
        .ok_or_else(|| Error::InvalidFormat("workbook stream does not start with BOF".to_string()))?;
    let version = read_u16_le(bof.data, 0)?;
    if version != BIFF8 {
        return Err(Error::Unsupported(format!("BIFF version 0x{:04X} workbooks", version)));
    }
    if read_u16_le(bof.data, 2)? != SUBSTREAM_GLOBALS {
        return Err(Error::CorruptedFile("first substream is not the workbook globals".to_string()));
    }

    let mut globals = Globals::default();
    let mut bold_fonts = Vec::new();
    let mut number_formats: HashMap<u16, String> = HashMap::new();
    let mut xfs = Vec::new();
    let mut palette: Vec<u32> = DEFAULT_PALETTE.to_vec();

    while let Some(record) = records.next() {
        let record = record?;
        let data = record.data;
        match record.record_type {
            EOF => break,
            FILEPASS => return Err(Error::Unsupported("encrypted workbooks".to_string())),
            DATEMODE => globals.date1904 = read_u16_le(data, 0)? == 1,
            FONT => bold_fonts.push(read_u16_le(data, 6)? >= BOLD_WEIGHT),
            FORMAT => {
                let id = read_u16_le(data, 0)?;
                let (code, _) = read_unicode_string(data, 2)?;
                number_formats.insert(id, code);
            },
            XF => xfs.push(RawXf {
                font: read_u16_le(data, 0)? as usize,
                format: read_u16_le(data, 2)?,
                pattern: u32_at(data, 14)? >> 26,
                fore_color: read_u16_le(data, 18)? & 0x7F,
            }),
            PALETTE => {
                let count = read_u16_le(data, 0)? as usize;
                for i in 0..count.min(palette.len()) {
                    let rgb = data
                        .get(2 + i * 4..5 + i * 4)
                        .ok_or_else(|| Error::CorruptedFile("short PALETTE record".to_string()))?;
                    palette[i] = u32::from_be_bytes([0, rgb[0], rgb[1], rgb[2]]);
                }
            },
            BOUNDSHEET => globals.sheets.push(BoundSheet {
                offset: u32_at(data, 0)? as usize,
                sheet_type: *data.get(5).unwrap_or(&0),
                name: read_short_unicode_string(data, 6)?,
            }),
            SST => {
                let mut fragments = vec![data];
                while records.peek_type() == Some(CONTINUE) {
                    let Some(next) = records.next() else { break };
                    fragments.push(next?.data);
                }
                globals.strings = read_sst(fragments)?;
            },
            _ => {},
        }
    }

    globals.formats = xfs
        .iter()
        .map(|xf| {
            // Font index 4 does not exist
            let font = if xf.font >= 4 { xf.font - 1 } else { xf.font };
            let style = CellStyle {
                bold: bold_fonts.get(font).copied().unwrap_or(false),
                fill_color: (xf.pattern == FILL_SOLID)
                    .then(|| palette_rgb(&palette, xf.fore_color))
                    .flatten(),
            };
            XfFormat {
                is_date: match number_formats.get(&xf.format) {
                    Some(code) => is_date_format_code(code),
                    None => is_builtin_date_format(xf.format),
                },
                style: (!style.is_plain()).then_some(style),
            }
        })
        .collect();
    debug!(
        sheets = globals.sheets.len(),
        strings = globals.strings.len(),
        formats = globals.formats.len(),
        "read workbook globals"
    );
    Ok(globals)
}

fn read_sst(fragments: Vec<&[u8]>) -> Result<Vec<String>> {
    let mut reader = ContinuedReader::new(fragments);
    let _total = reader.read_u32()?;
    let unique = reader.read_u32()? as usize;
    let mut strings = Vec::with_capacity(unique.min(65_536));
    for _ in 0..unique {
        strings.push(reader.read_rich_string()?);
    }
    Ok(strings)
}

fn palette_rgb(palette: &[u32], index: u16) -> Option<String> {
    let index = index as usize;
    // 0-7 repeat the first eight standard colors; 64 and up are system colors
    let slot = if index < 8 { index } else { index.checked_sub(8)? };
    palette.get(slot).map(|rgb| format!("{:06X}", rgb))
}

/// Read every worksheet. Chart, macro and module sheets are skipped.
pub(crate) fn read_sheets(stream: &[u8], globals: &Globals) -> Result<Vec<Worksheet>> {
    let mut sheets = Vec::with_capacity(globals.sheets.len());
    for bound in &globals.sheets {
        if bound.sheet_type != SHEET_TYPE_WORKSHEET {
            trace!(sheet = %bound.name, kind = bound.sheet_type, "skipping non-worksheet sheet");
            continue;
        }
        let mut sheet = Worksheet::new(&bound.name);
        read_sheet(stream, bound.offset, globals, &mut sheet)?;
        trace!(sheet = %bound.name, rows = sheet.row_count(), "read sheet");
        sheets.push(sheet);
    }
    Ok(sheets)
}

fn read_sheet(stream: &[u8], offset: usize, globals: &Globals, sheet: &mut Worksheet) -> Result<()> {
    let mut records = RecordIter::new(stream, offset);
    match records.next().transpose()? {
        Some(record) if record.record_type == BOF => {},
        _ => return Err(Error::CorruptedFile(format!("no BOF record at sheet offset {}", offset))),
    }

    // Nested substreams, such as embedded charts
    let mut depth = 0usize;
    while let Some(record) = records.next() {
        let record = record?;
        let data = record.data;
        match record.record_type {
            BOF => depth += 1,
            EOF if depth == 0 => break,
            EOF => depth -= 1,
            _ if depth > 0 => {},
            ROW => {
                sheet.row_or_create(read_u16_le(data, 0)? as usize);
            },
            NUMBER => {
                let (row, col, xf) = cell_header(data)?;
                let value = read_f64_le(data, 6)?;
                put(sheet, row, col, globals, xf, |date| number(value, date, false));
            },
            RK => {
                let (row, col, xf) = cell_header(data)?;
                let rk = u32_at(data, 6)?;
                put(sheet, row, col, globals, xf, |date| number(rk_to_f64(rk), date, rk_is_integer(rk)));
            },
            MULRK => {
                let row = read_u16_le(data, 0)? as usize;
                let first_col = read_u16_le(data, 2)? as usize;
                let count = data.len().saturating_sub(6) / 6;
                for i in 0..count {
                    let xf = read_u16_le(data, 4 + i * 6)? as usize;
                    let rk = u32_at(data, 6 + i * 6)?;
                    put(sheet, row, first_col + i, globals, xf, |date| {
                        number(rk_to_f64(rk), date, rk_is_integer(rk))
                    });
                }
            },
            LABELSST => {
                let (row, col, xf) = cell_header(data)?;
                let index = u32_at(data, 6)? as usize;
                let text = globals
                    .strings
                    .get(index)
                    .ok_or_else(|| Error::CorruptedFile(format!("shared string {} is missing", index)))?;
                put(sheet, row, col, globals, xf, |_| CellValue::String(text.clone()));
            },
            LABEL => {
                let (row, col, xf) = cell_header(data)?;
                let (text, _) = read_unicode_string(data, 6)?;
                put(sheet, row, col, globals, xf, |_| CellValue::String(text));
            },
            BOOLERR => {
                let (row, col, xf) = cell_header(data)?;
                let (value, is_error) = (data.get(6).copied(), data.get(7).copied());
                let value = match (value, is_error) {
                    (Some(code), Some(1)) => CellValue::Error(error_text(code).to_string()),
                    (Some(b), _) => CellValue::Bool(b != 0),
                    _ => return Err(Error::CorruptedFile("short BOOLERR record".to_string())),
                };
                put(sheet, row, col, globals, xf, |_| value);
            },
            BLANK => {
                let (row, col, xf) = cell_header(data)?;
                put(sheet, row, col, globals, xf, |_| CellValue::Empty);
            },
            MULBLANK => {
                let row = read_u16_le(data, 0)? as usize;
                let first_col = read_u16_le(data, 2)? as usize;
                let count = data.len().saturating_sub(6) / 2;
                for i in 0..count {
                    let xf = read_u16_le(data, 4 + i * 2)? as usize;
                    put(sheet, row, first_col + i, globals, xf, |_| CellValue::Empty);
                }
            },
            FORMULA => {
                let (row, col, xf) = cell_header(data)?;
                let value = formula_result(data, &mut records)?;
                put(sheet, row, col, globals, xf, |date| match value {
                    FormulaResult::Number(f) => number(f, date, false),
                    FormulaResult::Value(v) => v,
                });
            },
            MERGEDCELLS => {
                let count = read_u16_le(data, 0)? as usize;
                for i in 0..count {
                    let at = 2 + i * 8;
                    sheet.add_merged_region(MergedRegion {
                        first_row: read_u16_le(data, at)? as usize,
                        last_row: read_u16_le(data, at + 2)? as usize,
                        first_col: read_u16_le(data, at + 4)? as usize,
                        last_col: read_u16_le(data, at + 6)? as usize,
                    });
                }
            },
            _ => {},
        }
    }
    Ok(())
}

enum FormulaResult {
    Number(f64),
    Value(CellValue),
}

/// Cached result of a FORMULA record. String results live in the STRING
/// record that follows it.
fn formula_result(data: &[u8], records: &mut RecordIter<'_>) -> Result<FormulaResult> {
    let result = data
        .get(6..14)
        .ok_or_else(|| Error::CorruptedFile("short FORMULA record".to_string()))?;
    if result[6..8] != [0xFF, 0xFF] {
        return Ok(FormulaResult::Number(read_f64_le(result, 0)?));
    }
    let value = match result[0] {
        0 => {
            let mut text = String::new();
            if records.peek_type() == Some(STRING)
                && let Some(next) = records.next()
            {
                text = read_unicode_string(next?.data, 0)?.0;
            }
            CellValue::String(text)
        },
        1 => CellValue::Bool(result[2] != 0),
        2 => CellValue::Error(error_text(result[2]).to_string()),
        _ => CellValue::String(String::new()),
    };
    Ok(FormulaResult::Value(value))
}

fn number(value: f64, is_date: bool, integer: bool) -> CellValue {
    if is_date {
        CellValue::DateTime(value)
    } else if integer {
        CellValue::Int(value as i64)
    } else {
        CellValue::Float(value)
    }
}

fn put(sheet: &mut Worksheet, row: usize, col: usize, globals: &Globals, xf: usize, value: impl FnOnce(bool) -> CellValue) {
    let format = globals.formats.get(xf);
    let cell = SheetCell {
        value: value(format.is_some_and(|f| f.is_date)),
        style: format.and_then(|f| f.style.clone()),
    };
    sheet.row_or_create(row).set_cell(col, cell);
}
