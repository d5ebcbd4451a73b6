//! Encoding of the document model as WordprocessingML.

use std::fmt::Write;

use super::reader::closing_tag;
use crate::common::xml::escape_xml;
use crate::document::{BodyElement, Cell, Paragraph, ParagraphItem, Row, Run, RunContent, RunProperties, Table};
use crate::ooxml::constants::namespace;

/// Default column width for generated tables, in twentieths of a point.
const GRID_COL_WIDTH: u32 = 2000;

/// Markup before the body of a newly created document.
pub(crate) fn fresh_prefix() -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<w:document xmlns:w=\"{}\" xmlns:r=\"{}\"><w:body>",
        namespace::WML_MAIN,
        namespace::OFC_RELATIONSHIPS
    )
}

/// Markup after the body of a newly created document: A4 page, default margins.
pub(crate) const FRESH_SUFFIX: &str = concat!(
    r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/>"#,
    r#"<w:pgMar w:top="1440" w:right="1800" w:bottom="1440" w:left="1800" w:header="851" w:footer="992" w:gutter="0"/>"#,
    r#"</w:sectPr></w:body></w:document>"#
);

/// Append the markup of a sequence of block elements.
pub(crate) fn write_blocks(blocks: &[BodyElement], out: &mut String) {
    for block in blocks {
        match block {
            BodyElement::Paragraph(p) => write_paragraph(p, out),
            BodyElement::Table(t) => write_table(t, out),
            BodyElement::Raw(raw) => out.push_str(raw),
        }
    }
}

pub(crate) fn write_paragraph(paragraph: &Paragraph, out: &mut String) {
    let open = paragraph.open_tag.as_deref().unwrap_or("<w:p>");
    out.push_str(open);
    if let Some(props) = &paragraph.properties {
        out.push_str(props);
    }
    write_items(&paragraph.items, out);
    out.push_str(&closing_tag(open));
}

fn write_items(items: &[ParagraphItem], out: &mut String) {
    for item in items {
        match item {
            ParagraphItem::Run(run) => write_run(run, out),
            ParagraphItem::Group { open, close, items } => {
                out.push_str(open);
                write_items(items, out);
                out.push_str(close);
            },
            ParagraphItem::Raw(raw) => out.push_str(raw),
        }
    }
}

fn write_run(run: &Run, out: &mut String) {
    let open = run.open_tag.as_deref().unwrap_or("<w:r>");
    out.push_str(open);
    write_run_properties(&run.properties, out);
    for content in &run.content {
        match content {
            RunContent::Text(text) if text.is_empty() => {},
            RunContent::Text(text) => {
                let _ = write!(out, r#"<w:t xml:space="preserve">{}</w:t>"#, escape_xml(text));
            },
            RunContent::Tab => out.push_str("<w:tab/>"),
            RunContent::Break => out.push_str("<w:br/>"),
            RunContent::Raw(raw) => out.push_str(raw),
        }
    }
    out.push_str(&closing_tag(open));
}

/// Loaded properties are written back verbatim until a setter touches them.
fn write_run_properties(props: &RunProperties, out: &mut String) {
    if let Some(raw) = &props.raw {
        out.push_str(raw);
        return;
    }
    if props.is_empty() {
        return;
    }
    out.push_str("<w:rPr>");
    if let Some(font) = &props.font_name {
        let font = escape_xml(font);
        let _ = write!(
            out,
            r#"<w:rFonts w:ascii="{0}" w:hAnsi="{0}" w:eastAsia="{0}" w:cs="{0}"/>"#,
            font
        );
    }
    write_toggle(out, "b", props.bold);
    write_toggle(out, "i", props.italic);
    if let Some(color) = &props.color {
        let _ = write!(out, r#"<w:color w:val="{}"/>"#, escape_xml(color));
    }
    if let Some(size) = props.font_size {
        let _ = write!(out, r#"<w:sz w:val="{0}"/><w:szCs w:val="{0}"/>"#, size);
    }
    match props.underline {
        Some(true) => out.push_str(r#"<w:u w:val="single"/>"#),
        Some(false) => out.push_str(r#"<w:u w:val="none"/>"#),
        None => {},
    }
    out.push_str("</w:rPr>");
}

fn write_toggle(out: &mut String, name: &str, value: Option<bool>) {
    match value {
        Some(true) => {
            let _ = write!(out, "<w:{}/>", name);
        },
        Some(false) => {
            let _ = write!(out, r#"<w:{} w:val="0"/>"#, name);
        },
        None => {},
    }
}

fn write_table(table: &Table, out: &mut String) {
    let open = table.open_tag.as_deref().unwrap_or("<w:tbl>");
    out.push_str(open);
    if table.open_tag.is_none() && table.leading.is_empty() {
        write_default_table_properties(table.column_count(), out);
    } else {
        out.push_str(&table.leading);
    }
    for row in &table.rows {
        write_row(row, out);
    }
    out.push_str(&closing_tag(open));
}

fn write_default_table_properties(columns: usize, out: &mut String) {
    out.push_str(r#"<w:tblPr><w:tblW w:w="0" w:type="auto"/><w:tblBorders>"#);
    for edge in ["top", "left", "bottom", "right", "insideH", "insideV"] {
        let _ = write!(out, r#"<w:{} w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#, edge);
    }
    out.push_str("</w:tblBorders><w:tblLook w:val=\"04A0\"/></w:tblPr><w:tblGrid>");
    for _ in 0..columns {
        let _ = write!(out, r#"<w:gridCol w:w="{}"/>"#, GRID_COL_WIDTH);
    }
    out.push_str("</w:tblGrid>");
}

fn write_row(row: &Row, out: &mut String) {
    let open = row.open_tag.as_deref().unwrap_or("<w:tr>");
    out.push_str(open);
    out.push_str(&row.leading);
    for cell in &row.cells {
        write_cell(cell, out);
        out.push_str(&cell.trailing);
    }
    out.push_str(&closing_tag(open));
    out.push_str(&row.trailing);
}

fn write_cell(cell: &Cell, out: &mut String) {
    let open = cell.open_tag.as_deref().unwrap_or("<w:tc>");
    out.push_str(open);
    match &cell.properties {
        Some(props) => out.push_str(props),
        None if cell.open_tag.is_none() => {
            let _ = write!(out, r#"<w:tcPr><w:tcW w:w="{}" w:type="dxa"/></w:tcPr>"#, GRID_COL_WIDTH);
        },
        None => {},
    }
    write_blocks(&cell.elements, out);
    // A cell must end with a paragraph
    let needs_paragraph = !cell.elements.iter().any(BodyElement::is_paragraph)
        || matches!(cell.elements.last(), Some(BodyElement::Table(_)));
    if needs_paragraph {
        out.push_str("<w:p/>");
    }
    out.push_str(&closing_tag(open));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::docx::reader::read_document;

    fn body_xml(blocks: &[BodyElement]) -> String {
        let mut out = String::new();
        write_blocks(blocks, &mut out);
        out
    }

    #[test]
    fn test_new_paragraph_markup() {
        let mut paragraph = Paragraph::with_text("a < b\tc");
        paragraph.add_run("!").properties_mut().set_bold(true).set_font_size(24);
        let xml = body_xml(&[BodyElement::Paragraph(paragraph)]);
        assert_eq!(
            xml,
            concat!(
                r#"<w:p><w:r><w:t xml:space="preserve">a &lt; b</w:t><w:tab/><w:t xml:space="preserve">c</w:t></w:r>"#,
                r#"<w:r><w:rPr><w:b/><w:sz w:val="24"/><w:szCs w:val="24"/></w:rPr><w:t xml:space="preserve">!</w:t></w:r></w:p>"#
            )
        );
    }

    #[test]
    fn test_loaded_markup_survives_unchanged() {
        let body = concat!(
            r#"<w:p w14:paraId="01"><w:pPr><w:jc w:val="right"/></w:pPr>"#,
            r#"<w:hyperlink r:id="rId3"><w:r><w:rPr><w:i/></w:rPr><w:t xml:space="preserve">x</w:t></w:r></w:hyperlink>"#,
            r#"<w:bookmarkStart w:id="0" w:name="b"/></w:p>"#,
            r#"<w:tbl><w:tblPr/><w:tr><w:tc><w:tcPr/><w:p><w:r><w:t xml:space="preserve">c</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
            r#"<w:sectPr/>"#
        );
        let xml = format!(
            r#"<w:document xmlns:w="{}"><w:body>{}</w:body></w:document>"#,
            namespace::WML_MAIN,
            body
        );
        let decoded = read_document(&xml).unwrap();
        assert_eq!(body_xml(&decoded.body), body);
    }

    #[test]
    fn test_new_table_has_grid_and_cell_paragraphs() {
        let mut table = Table::new(1, 2);
        table.cell_mut(0, 1).unwrap().set_text("v");
        table.cell_mut(0, 0).unwrap().elements.clear();
        let xml = body_xml(&[BodyElement::Table(table)]);
        assert_eq!(xml.matches("<w:gridCol ").count(), 2);
        assert_eq!(xml.matches("<w:tc>").count(), 2);
        assert!(xml.contains(r#"<w:tcW w:w="2000" w:type="dxa"/></w:tcPr><w:p/></w:tc>"#));
        assert!(xml.contains(">v</w:t>"));
    }

    #[test]
    fn test_edited_properties_are_regenerated() {
        let xml = r#"<w:document><w:body><w:p><w:r><w:rPr><w:b/><w:lang w:val="fr"/></w:rPr><w:t>t</w:t></w:r></w:p></w:body></w:document>"#;
        let mut decoded = read_document(xml).unwrap();
        if let BodyElement::Paragraph(p) = &mut decoded.body[0] {
            p.runs_mut()[0].properties_mut().set_italic(true);
        }
        let out = body_xml(&decoded.body);
        assert!(out.contains("<w:rPr><w:b/><w:i/></w:rPr>"));
        assert!(!out.contains("w:lang"));
    }
}
