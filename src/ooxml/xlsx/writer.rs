//! Encoding of the workbook model as a SpreadsheetML package.

use std::fmt::Write;

use super::cell_ref::{cell_name, range_name};
use super::reader::DEFAULT_WORKBOOK_PART;
use super::shared_strings::SharedStringsBuilder;
use super::styles::StylesBuilder;
use crate::common::xml::escape_xml;
use crate::ooxml::constants::{content_type, namespace, part_name, relationship_type};
use crate::ooxml::package::{ContentTypes, Package, RelationshipsWriter};
use crate::sheet::{CellValue, SheetCell, Worksheet};

const STYLES_PART: &str = "xl/styles.xml";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
/// Name given to the single sheet of a workbook saved without sheets
const PLACEHOLDER_SHEET: &str = "Sheet1";

pub(crate) fn write_package(sheets: &[Worksheet], date1904: bool) -> Package {
    let placeholder;
    let sheets = if sheets.is_empty() {
        placeholder = [Worksheet::new(PLACEHOLDER_SHEET)];
        &placeholder[..]
    } else {
        sheets
    };

    let mut strings = SharedStringsBuilder::new();
    let mut styles = StylesBuilder::new();
    let mut content_types = ContentTypes::new();
    let mut workbook_rels = RelationshipsWriter::new();
    let mut package = Package::new();

    let mut sheet_entries = String::new();
    let mut sheet_parts = Vec::with_capacity(sheets.len());
    for (i, sheet) in sheets.iter().enumerate() {
        let target = format!("worksheets/sheet{}.xml", i + 1);
        let rel_id = workbook_rels.add(relationship_type::WORKSHEET, &target);
        let _ = write!(
            sheet_entries,
            r#"<sheet name="{}" sheetId="{}" r:id="{}"/>"#,
            escape_xml(sheet.name()),
            i + 1,
            rel_id
        );
        let part = format!("xl/{}", target);
        content_types.add_override(&part, content_type::SML_WORKSHEET);
        sheet_parts.push((part, write_sheet(sheet, &mut strings, &mut styles)));
    }

    workbook_rels.add(relationship_type::STYLES, "styles.xml");
    content_types.add_override(STYLES_PART, content_type::SML_STYLES);
    if !strings.is_empty() {
        workbook_rels.add(relationship_type::SHARED_STRINGS, "sharedStrings.xml");
        content_types.add_override(SHARED_STRINGS_PART, content_type::SML_SHARED_STRINGS);
    }
    content_types.add_override(DEFAULT_WORKBOOK_PART, content_type::SML_SHEET_MAIN);
    let mut package_rels = RelationshipsWriter::new();
    package_rels.add(relationship_type::OFFICE_DOCUMENT, DEFAULT_WORKBOOK_PART);

    let mut workbook = String::with_capacity(512 + sheet_entries.len());
    workbook.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    workbook.push('\n');
    let _ = write!(
        workbook,
        r#"<workbook xmlns="{}" xmlns:r="{}">"#,
        namespace::SML_MAIN,
        namespace::OFC_RELATIONSHIPS
    );
    if date1904 {
        workbook.push_str(r#"<workbookPr date1904="1"/>"#);
    }
    workbook.push_str(r#"<bookViews><workbookView activeTab="0"/></bookViews>"#);
    let _ = write!(workbook, "<sheets>{}</sheets>", sheet_entries);
    workbook.push_str("</workbook>");

    package.set_part(part_name::CONTENT_TYPES, content_types.to_xml());
    package.set_part(part_name::PACKAGE_RELS, package_rels.to_xml());
    package.set_part(DEFAULT_WORKBOOK_PART, workbook);
    package.set_part("xl/_rels/workbook.xml.rels", workbook_rels.to_xml());
    for (part, xml) in sheet_parts {
        package.set_part(&part, xml);
    }
    package.set_part(STYLES_PART, styles.to_xml());
    if !strings.is_empty() {
        package.set_part(SHARED_STRINGS_PART, strings.to_xml());
    }
    package
}

fn write_sheet(sheet: &Worksheet, strings: &mut SharedStringsBuilder, styles: &mut StylesBuilder) -> String {
    let mut xml = String::with_capacity(1024);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    let _ = write!(
        xml,
        r#"<worksheet xmlns="{}" xmlns:r="{}">"#,
        namespace::SML_MAIN,
        namespace::OFC_RELATIONSHIPS
    );
    xml.push_str("<sheetData>");
    for (r, row) in sheet.rows() {
        if row.last_cell_num() == 0 {
            let _ = write!(xml, r#"<row r="{}"/>"#, r + 1);
            continue;
        }
        let _ = write!(xml, r#"<row r="{}">"#, r + 1);
        for (c, cell) in row.cells() {
            write_cell(&mut xml, &cell_name(r, c), cell, strings, styles);
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");

    let merges = sheet.merged_regions();
    if !merges.is_empty() {
        let _ = write!(xml, r#"<mergeCells count="{}">"#, merges.len());
        for region in merges {
            let _ = write!(xml, r#"<mergeCell ref="{}"/>"#, range_name(region));
        }
        xml.push_str("</mergeCells>");
    }
    xml.push_str("</worksheet>");
    xml
}

fn write_cell(xml: &mut String, reference: &str, cell: &SheetCell, strings: &mut SharedStringsBuilder, styles: &mut StylesBuilder) {
    let is_date = matches!(cell.value, CellValue::DateTime(_));
    let style = styles.add(cell.style.as_ref(), is_date);
    let _ = write!(xml, r#"<c r="{}""#, reference);
    if style != 0 {
        let _ = write!(xml, r#" s="{}""#, style);
    }
    match &cell.value {
        CellValue::Empty => xml.push_str("/>"),
        CellValue::String(s) => {
            let _ = write!(xml, r#" t="s"><v>{}</v></c>"#, strings.add(s));
        },
        CellValue::Int(i) => {
            let _ = write!(xml, "><v>{}</v></c>", i);
        },
        CellValue::Float(f) | CellValue::DateTime(f) if f.is_finite() => {
            let _ = write!(xml, "><v>{}</v></c>", f);
        },
        CellValue::Float(_) | CellValue::DateTime(_) => xml.push_str(r#" t="e"><v>#NUM!</v></c>"#),
        CellValue::Bool(b) => {
            let _ = write!(xml, r#" t="b"><v>{}</v></c>"#, u8::from(*b));
        },
        CellValue::Error(e) => {
            let _ = write!(xml, r#" t="e"><v>{}</v></c>"#, escape_xml(e));
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::CellStyle;

    #[test]
    fn test_sheet_xml() {
        let mut sheet = Worksheet::new("S");
        sheet.cell_or_create(0, 0).value = CellValue::from("a & b");
        sheet.cell_or_create(0, 2).value = CellValue::Float(1.5);
        sheet.cell_or_create(1, 27).value = CellValue::Bool(false);
        let styled = sheet.cell_or_create(2, 0);
        styled.style = Some(CellStyle::new().with_bold(true));
        sheet.create_row(4);

        let mut strings = SharedStringsBuilder::new();
        let mut styles = StylesBuilder::new();
        let xml = write_sheet(&sheet, &mut strings, &mut styles);
        assert!(xml.contains(r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="C1"><v>1.5</v></c></row>"#));
        assert!(xml.contains(r#"<c r="AB2" t="b"><v>0</v></c>"#));
        assert!(xml.contains(r#"<c r="A3" s="1"/>"#));
        assert!(xml.contains(r#"<row r="5"/>"#));
        assert!(strings.to_xml().contains("a &amp; b"));
    }

    #[test]
    fn test_empty_workbook_gets_a_sheet() {
        let package = write_package(&[], true);
        let workbook = package.part_str(DEFAULT_WORKBOOK_PART).unwrap();
        assert!(workbook.contains(r#"<sheet name="Sheet1" sheetId="1" r:id="rId1"/>"#));
        assert!(workbook.contains(r#"date1904="1""#));
        assert!(package.contains("xl/worksheets/sheet1.xml"));
        assert!(!package.contains(SHARED_STRINGS_PART));
    }
}
