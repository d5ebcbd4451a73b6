//! Decoding of a SpreadsheetML package into the workbook model.

use chrono::{NaiveDate, NaiveDateTime};
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, trace};

use super::cell_ref::{parse_cell_ref, parse_range};
use super::shared_strings::{SharedStrings, read_string_item};
use super::styles::{CellFormat, StyleSheet};
use crate::common::xml::span::unexpected_eof;
use crate::common::xml::{SpanReader, attribute};
use crate::common::{Error, Result};
use crate::ooxml::constants::relationship_type;
use crate::ooxml::package::{Package, part_dir, resolve_target};
use crate::sheet::{CellValue, SheetCell, Worksheet};

/// Workbook part used when the package relationships do not name one.
pub const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";

/// Sheets and settings read from the workbook part.
pub(crate) struct DecodedWorkbook {
    pub sheets: Vec<Worksheet>,
    pub date1904: bool,
}

struct SheetEntry {
    name: String,
    rel_id: Option<String>,
}

pub(crate) fn read_workbook(package: &Package) -> Result<DecodedWorkbook> {
    let workbook_part = package.main_part_name(DEFAULT_WORKBOOK_PART)?;
    let (entries, date1904) = read_workbook_part(package.require_part_str(&workbook_part)?)?;
    let rels = package.part_relationships(&workbook_part)?;
    let base = part_dir(&workbook_part);
    let target_of = |rel_type: &str| {
        rels.iter()
            .find(|r| r.rel_type == rel_type)
            .map(|r| resolve_target(base, &r.target))
    };

    let shared = match target_of(relationship_type::SHARED_STRINGS).and_then(|p| package.part_str(&p)) {
        Some(xml) => SharedStrings::parse(xml)?,
        None => SharedStrings::default(),
    };
    let styles = match target_of(relationship_type::STYLES).and_then(|p| package.part_str(&p)) {
        Some(xml) => StyleSheet::parse(xml)?,
        None => StyleSheet::default(),
    };
    debug!(strings = shared.len(), formats = styles.len(), sheets = entries.len(), "read workbook part");

    let mut sheets = Vec::with_capacity(entries.len());
    for (position, entry) in entries.into_iter().enumerate() {
        let part = entry
            .rel_id
            .as_deref()
            .and_then(|id| rels.iter().find(|r| r.id == id))
            .map(|r| resolve_target(base, &r.target))
            .unwrap_or_else(|| format!("{}/worksheets/sheet{}.xml", base, position + 1));
        let mut sheet = Worksheet::new(&entry.name);
        read_sheet(package.require_part_str(&part)?, &shared, &styles, &mut sheet)?;
        trace!(sheet = %entry.name, %part, rows = sheet.row_count(), "read sheet");
        sheets.push(sheet);
    }
    Ok(DecodedWorkbook { sheets, date1904 })
}

fn read_workbook_part(xml: &str) -> Result<(Vec<SheetEntry>, bool)> {
    let mut spans = SpanReader::new(xml);
    let mut entries = Vec::new();
    let mut date1904 = false;
    loop {
        match spans.next()?.0 {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"workbookPr" => {
                    date1904 = attribute(&e, b"date1904").is_some_and(|v| v == "1" || v == "true");
                },
                b"sheet" => entries.push(SheetEntry {
                    name: attribute(&e, b"name").unwrap_or_default(),
                    rel_id: attribute(&e, b"id"),
                }),
                _ => {},
            },
            Event::Eof => break,
            _ => {},
        }
    }
    Ok((entries, date1904))
}

/// Cursor over the cells of `sheetData`, for rows and cells that omit `r`.
#[derive(Default)]
struct Position {
    row: Option<usize>,
    col: Option<usize>,
}

fn read_sheet(xml: &str, shared: &SharedStrings, styles: &StyleSheet, sheet: &mut Worksheet) -> Result<()> {
    let mut spans = SpanReader::new(xml);
    let mut at = Position::default();
    loop {
        let (event, start, _) = spans.next()?;
        match event {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"row" => {
                let row = match attribute(&e, b"r") {
                    Some(r) => r
                        .trim()
                        .parse::<usize>()
                        .ok()
                        .and_then(|r| r.checked_sub(1))
                        .ok_or_else(|| Error::CorruptedFile(format!("invalid row number {:?}", r)))?,
                    None => at.row.map_or(0, |r| r + 1),
                };
                sheet.row_or_create(row);
                at = Position {
                    row: Some(row),
                    col: None,
                };
            },
            Event::Start(e) if e.local_name().as_ref() == b"c" => {
                let (row, col) = cell_position(&e, &mut at)?;
                let cell = read_cell(&mut spans, &e, shared, styles)?;
                sheet.row_or_create(row).set_cell(col, cell);
            },
            Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                let (row, col) = cell_position(&e, &mut at)?;
                let format = style_of(&e, styles);
                sheet.row_or_create(row).set_cell(col, SheetCell {
                    value: CellValue::Empty,
                    style: format.and_then(|f| f.style.clone()),
                });
            },
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"mergeCell" => {
                if let Some(range) = attribute(&e, b"ref") {
                    sheet.add_merged_region(parse_range(&range)?);
                }
            },
            Event::Start(e) if matches!(e.local_name().as_ref(), b"sheetPr" | b"cols" | b"extLst") => {
                spans.skip(&e, start)?;
            },
            Event::Eof => break,
            _ => {},
        }
    }
    Ok(())
}

fn cell_position(e: &BytesStart<'_>, at: &mut Position) -> Result<(usize, usize)> {
    let (row, col) = match attribute(e, b"r") {
        Some(reference) => parse_cell_ref(&reference)?,
        None => (at.row.unwrap_or(0), at.col.map_or(0, |c| c + 1)),
    };
    at.row = Some(row);
    at.col = Some(col);
    Ok((row, col))
}

fn style_of<'s>(e: &BytesStart<'_>, styles: &'s StyleSheet) -> Option<&'s CellFormat> {
    attribute(e, b"s")
        .and_then(|s| s.trim().parse::<usize>().ok())
        .and_then(|s| styles.get(s))
}

/// Read a `<c>` element whose start tag was just consumed.
fn read_cell(spans: &mut SpanReader<'_>, e: &BytesStart<'_>, shared: &SharedStrings, styles: &StyleSheet) -> Result<SheetCell> {
    let kind = attribute(e, b"t");
    let format = style_of(e, styles);
    let mut raw: Option<String> = None;
    let mut inline: Option<String> = None;
    loop {
        let (event, start, _) = spans.next()?;
        match event {
            Event::Start(child) => match child.local_name().as_ref() {
                b"v" => raw = Some(spans.read_text()?),
                b"is" => inline = Some(read_string_item(spans)?),
                _ => {
                    spans.skip(&child, start)?;
                },
            },
            Event::End(_) => break,
            Event::Eof => return Err(unexpected_eof()),
            _ => {},
        }
    }

    let is_date = format.is_some_and(|f| f.is_date);
    let value = match (kind.as_deref(), raw) {
        (Some("inlineStr"), _) => CellValue::String(inline.unwrap_or_default()),
        (_, None) => CellValue::Empty,
        (Some("s"), Some(v)) => {
            let index: usize = v
                .trim()
                .parse()
                .map_err(|_| Error::CorruptedFile(format!("invalid shared string index {:?}", v)))?;
            let text = shared
                .get(index)
                .ok_or_else(|| Error::CorruptedFile(format!("shared string {} is missing", index)))?;
            CellValue::String(text.to_string())
        },
        (Some("str"), Some(v)) => CellValue::String(v),
        (Some("b"), Some(v)) => CellValue::Bool(matches!(v.trim(), "1" | "true")),
        (Some("e"), Some(v)) => CellValue::Error(v),
        (Some("d"), Some(v)) => match parse_iso_datetime(v.trim()) {
            Some(dt) => CellValue::from_datetime(dt, false),
            None => CellValue::String(v),
        },
        (_, Some(v)) => number_value(v, is_date),
    };
    Ok(SheetCell {
        value,
        style: format.and_then(|f| f.style.clone()),
    })
}

fn number_value(text: String, is_date: bool) -> CellValue {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return CellValue::Empty;
    }
    if !is_date && let Ok(i) = trimmed.parse::<i64>() {
        return CellValue::Int(i);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if is_date => CellValue::DateTime(f),
        Ok(f) => CellValue::Float(f),
        Err(_) => CellValue::String(text),
    }
}

fn parse_iso_datetime(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
