//! Assembly of decoded Word 97-2003 text into paragraphs and tables.
//!
//! Paragraphs end with `\r`; table cells end with `\x07`. Each row is closed
//! by an extra `\x07` mark flagged as a row end. Field instructions are
//! dropped and only field results are kept.

use super::papx::{PapxIndex, ParagraphFlags};
use super::piece_table::TextChar;
use crate::document::{BodyElement, Cell, Paragraph, Row, Table};

const PARAGRAPH_END: char = '\r';
const CELL_END: char = '\u{07}';
const PAGE_BREAK: char = '\u{0C}';
const LINE_BREAK: char = '\u{0B}';
const FIELD_BEGIN: char = '\u{13}';
const FIELD_SEPARATOR: char = '\u{14}';
const FIELD_END: char = '\u{15}';
const NON_BREAKING_HYPHEN: char = '\u{1E}';
const SOFT_HYPHEN: char = '\u{1F}';

/// Build the body blocks from the main document text.
///
/// Without paragraph properties, a cell mark directly after another cell
/// mark is taken as the row end.
pub(crate) fn read_body(text: &[TextChar], papx: Option<&PapxIndex>) -> Vec<BodyElement> {
    let mut builder = BodyBuilder::default();
    let mut current = String::new();
    // One entry per open field: true while in its instruction part
    let mut fields: Vec<bool> = Vec::new();
    let mut after_cell_mark = false;

    for &TextChar { ch, fc } in text {
        match ch {
            FIELD_BEGIN => {
                fields.push(true);
                continue;
            },
            FIELD_SEPARATOR => {
                if let Some(top) = fields.last_mut() {
                    *top = false;
                }
                continue;
            },
            FIELD_END => {
                fields.pop();
                continue;
            },
            _ => {},
        }
        if fields.contains(&true) {
            continue;
        }

        match ch {
            PARAGRAPH_END | PAGE_BREAK => {
                let flags = papx.map(|p| p.flags_at(fc)).unwrap_or_default();
                builder.end_paragraph(std::mem::take(&mut current), flags.in_table);
                after_cell_mark = false;
            },
            CELL_END => {
                let flags = match papx {
                    Some(p) => p.flags_at(fc),
                    None => ParagraphFlags {
                        in_table: true,
                        row_end: after_cell_mark && current.is_empty(),
                    },
                };
                builder.end_cell_mark(std::mem::take(&mut current), flags.row_end);
                after_cell_mark = !flags.row_end;
            },
            LINE_BREAK => current.push('\n'),
            NON_BREAKING_HYPHEN => current.push('-'),
            SOFT_HYPHEN => {},
            // Object anchors and note references
            c if (c as u32) < 0x09 => {},
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        builder.end_paragraph(current, false);
    }
    builder.finish()
}

#[derive(Default)]
struct BodyBuilder {
    body: Vec<BodyElement>,
    table: Option<Table>,
    cells: Vec<Cell>,
    paragraphs: Vec<Paragraph>,
}

impl BodyBuilder {
    fn end_paragraph(&mut self, text: String, in_table: bool) {
        let paragraph = Paragraph::with_text(&text);
        if in_table {
            self.paragraphs.push(paragraph);
        } else {
            self.flush_table();
            self.body.push(BodyElement::Paragraph(paragraph));
        }
    }

    fn end_cell_mark(&mut self, text: String, row_end: bool) {
        if row_end {
            self.end_row();
            return;
        }
        self.paragraphs.push(Paragraph::with_text(&text));
        let elements = self.paragraphs.drain(..).map(BodyElement::Paragraph).collect();
        self.cells.push(Cell {
            elements,
            ..Cell::default()
        });
    }

    fn end_row(&mut self) {
        if self.cells.is_empty() && self.paragraphs.is_empty() {
            return;
        }
        if !self.paragraphs.is_empty() {
            let elements = self.paragraphs.drain(..).map(BodyElement::Paragraph).collect();
            self.cells.push(Cell {
                elements,
                ..Cell::default()
            });
        }
        let row = Row {
            cells: std::mem::take(&mut self.cells),
            ..Row::default()
        };
        self.table.get_or_insert_with(Table::default).rows.push(row);
    }

    fn flush_table(&mut self) {
        self.end_row();
        if let Some(table) = self.table.take() {
            self.body.push(BodyElement::Table(table));
        }
    }

    fn finish(mut self) -> Vec<BodyElement> {
        self.flush_table();
        self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<TextChar> {
        s.chars()
            .enumerate()
            .map(|(i, ch)| TextChar { ch, fc: i as u32 })
            .collect()
    }

    fn texts(body: &[BodyElement]) -> Vec<String> {
        body.iter()
            .map(|e| match e {
                BodyElement::Paragraph(p) => p.text(),
                BodyElement::Table(t) => format!("[table {}x{}]", t.row_count(), t.column_count()),
                BodyElement::Raw(_) => String::new(),
            })
            .collect()
    }

    #[test]
    fn test_paragraphs_and_fields() {
        let body = read_body(
            &chars("Hello ${name}\rPage \u{13} PAGE \u{14}3\u{15}\rline\u{0B}two\u{1E}x\r\u{01}\r"),
            None,
        );
        assert_eq!(texts(&body), vec!["Hello ${name}", "Page 3", "line\ntwo-x", ""]);
    }

    #[test]
    fn test_nested_field_instructions_are_dropped() {
        let body = read_body(&chars("a\u{13}IF \u{13}REF x\u{14}1\u{15}\u{14}yes\u{15}b\r"), None);
        assert_eq!(texts(&body), vec!["ayesb"]);
    }

    #[test]
    fn test_table_without_paragraph_properties() {
        let body = read_body(&chars("before\ra\u{07}b\u{07}\u{07}c\u{07}d\u{07}\u{07}after\r"), None);
        assert_eq!(texts(&body), vec!["before", "[table 2x2]", "after"]);
        let table = body[1].as_table().unwrap();
        assert_eq!(table.cell(1, 0).unwrap().text(), "c");
    }

    #[test]
    fn test_table_with_paragraph_properties() {
        // Cell "x\ry" holds two paragraphs; "" is an empty cell before the row end
        let text = "x\ry\u{07}\u{07}\u{07}";
        let flags = [
            (0, 2, true, false),
            (2, 4, true, false),
            (4, 5, true, false),
            (5, 6, true, true),
        ];
        let index = PapxIndex::from_flags(&flags);
        let body = read_body(&chars(text), Some(&index));
        let table = body[0].as_table().unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.rows()[0].cell_count(), 2);
        assert_eq!(table.cell(0, 0).unwrap().texts(), vec!["x", "y"]);
        assert_eq!(table.cell(0, 1).unwrap().text(), "");
    }
}
