//! Word-processing documents.
//!
//! A [`Document`] is an ordered list of body blocks (paragraphs, tables and
//! preserved markup) decoded from a `.docx`, `.doc` or `.wps` file. The model
//! is the same for every format; only the codec behind `open`/`save` differs.
//!
//! # Example
//!
//! ```no_run
//! use std::collections::HashMap;
//! use officekit::Document;
//!
//! let mut doc = Document::open("letter.docx")?;
//! let bindings = HashMap::from([("name".to_string(), "Alice".to_string())]);
//! let resolved = doc.substitute_everywhere(&bindings);
//! println!("resolved {} labels", resolved.len());
//! doc.save_as("letter-out.docx")?;
//! # Ok::<(), officekit::Error>(())
//! ```

mod codec;
mod element;
mod paragraph;
pub mod substitute;
mod table;

#[cfg(test)]
mod tests;

pub use codec::{DocumentCodec, codec_for};
pub use element::BodyElement;
pub use paragraph::{Paragraph, ParagraphItem, Run, RunContent, RunProperties};
pub use substitute::LabelSubstituter;
pub use table::{Cell, Row, Table};

use std::fmt;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::common::detection::functions::{detect_file_format_from_bytes, resolve_format};
use crate::common::{Error, FileFormat, Result};
use crate::matcher::{Bindings, Substitutions};
use crate::ooxml::docx::DocxContainer;

/// A word-processing document.
#[derive(Debug, Clone)]
pub struct Document {
    format: FileFormat,
    source: Option<PathBuf>,
    pub(crate) body: Vec<BodyElement>,
    /// Package the document was decoded from, reused when saving as DOCX
    pub(crate) container: Option<DocxContainer>,
}

impl Document {
    /// Create an empty document that will be saved as `format`.
    pub fn new(format: FileFormat) -> Result<Self> {
        ensure_word(format)?;
        Ok(Self::from_body(format, Vec::new()))
    }

    pub(crate) fn from_body(format: FileFormat, body: Vec<BodyElement>) -> Self {
        Self {
            format,
            source: None,
            body,
            container: None,
        }
    }

    /// Open a document, detecting the format from its content.
    ///
    /// The extension must be `.doc`, `.docx` or `.wps`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let format = resolve_format(path, &bytes)?;
        let mut document = decode(format, &bytes)?;
        document.source = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), %format, "opened document");
        Ok(document)
    }

    /// Decode a document held in memory, detecting the format.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let format = detect_file_format_from_bytes(bytes).ok_or(Error::NotOfficeFile)?;
        decode(format, bytes)
    }

    /// Decode a document of a known format from a reader.
    pub fn from_reader<R: Read>(mut reader: R, format: FileFormat) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        decode(format, &bytes)
    }

    #[inline]
    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// Path the document was opened from.
    #[inline]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Change the format used by the next save.
    ///
    /// This is how a legacy `.doc` is turned into a `.docx`.
    pub fn convert(&mut self, format: FileFormat) -> Result<()> {
        ensure_word(format)?;
        self.format = format;
        Ok(())
    }

    /// Write back to the path the document was opened from.
    pub fn save(&self) -> Result<()> {
        let path = self.source.as_deref().ok_or(Error::NoSourcePath)?;
        self.save_as(path)
    }

    pub fn save_as<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        fs::write(path.as_ref(), bytes)?;
        tracing::debug!(path = %path.as_ref().display(), "saved document");
        Ok(())
    }

    pub fn save_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.to_bytes()?)?;
        Ok(())
    }

    /// Encode in the current format.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        codec_for(self.format)?.encode(self)
    }

    /// Body blocks in document order.
    #[inline]
    pub fn elements(&self) -> &[BodyElement] {
        &self.body
    }

    /// Body paragraphs in document order. Table paragraphs are not included.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.body.iter().filter_map(BodyElement::as_paragraph)
    }

    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.body.iter_mut().filter_map(|e| match e {
            BodyElement::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Top-level tables in document order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.body.iter().filter_map(BodyElement::as_table)
    }

    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.body.iter_mut().filter_map(|e| match e {
            BodyElement::Table(t) => Some(t),
            _ => None,
        })
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs().count()
    }

    pub fn paragraph(&self, pos: usize) -> Result<&Paragraph> {
        let count = self.paragraph_count();
        self.paragraphs()
            .nth(pos)
            .ok_or(Error::out_of_range("paragraph", pos, count))
    }

    pub fn paragraph_mut(&mut self, pos: usize) -> Result<&mut Paragraph> {
        let count = self.paragraph_count();
        self.paragraphs_mut()
            .nth(pos)
            .ok_or(Error::out_of_range("paragraph", pos, count))
    }

    /// Text of the paragraph at `pos`.
    pub fn read_paragraph(&self, pos: usize) -> Result<String> {
        self.paragraph(pos).map(Paragraph::text)
    }

    /// Text of every body paragraph, concatenated without separators.
    pub fn read_paragraphs(&self) -> String {
        self.paragraphs().map(Paragraph::text).collect()
    }

    /// Text of every body paragraph, one entry each.
    pub fn read_paragraphs_to_list(&self) -> Vec<String> {
        self.paragraphs().map(Paragraph::text).collect()
    }

    pub fn table_count(&self) -> usize {
        self.tables().count()
    }

    pub fn table(&self, pos: usize) -> Result<&Table> {
        let count = self.table_count();
        self.tables()
            .nth(pos)
            .ok_or(Error::out_of_range("table", pos, count))
    }

    pub fn table_mut(&mut self, pos: usize) -> Result<&mut Table> {
        let count = self.table_count();
        self.tables_mut()
            .nth(pos)
            .ok_or(Error::out_of_range("table", pos, count))
    }

    /// Every cell of a table as its list of paragraph texts.
    pub fn read_table(&self, pos: usize) -> Result<Vec<Vec<Vec<String>>>> {
        Ok(self
            .table(pos)?
            .rows()
            .iter()
            .map(|row| row.cells().iter().map(Cell::texts).collect())
            .collect())
    }

    /// Cells of one table row.
    pub fn read_table_row(&self, table: usize, row: usize) -> Result<Vec<Vec<String>>> {
        let t = self.table(table)?;
        let r = t
            .row(row)
            .ok_or(Error::out_of_range("row", row, t.row_count()))?;
        Ok(r.cells().iter().map(Cell::texts).collect())
    }

    /// Cells of one table column, top to bottom. Rows too short to have the
    /// column are skipped.
    pub fn read_table_column(&self, table: usize, column: usize) -> Result<Vec<Vec<String>>> {
        Ok(self
            .table(table)?
            .rows()
            .iter()
            .filter_map(|r| r.cells().get(column))
            .map(Cell::texts)
            .collect())
    }

    /// Paragraph texts of one table cell.
    pub fn read_table_cell(&self, table: usize, row: usize, column: usize) -> Result<Vec<String>> {
        let t = self.table(table)?;
        let r = t
            .row(row)
            .ok_or(Error::out_of_range("row", row, t.row_count()))?;
        let cell = r
            .cells()
            .get(column)
            .ok_or(Error::out_of_range("column", column, r.cell_count()))?;
        Ok(cell.texts())
    }

    /// Append a paragraph holding `text` to the body.
    ///
    /// The paragraph goes before the trailing section properties, if any.
    pub fn add_paragraph(&mut self, text: &str) -> &mut Paragraph {
        let at = self.append_position();
        self.body
            .insert(at, BodyElement::Paragraph(Paragraph::with_text(text)));
        match &mut self.body[at] {
            BodyElement::Paragraph(p) => p,
            _ => unreachable!("a paragraph was just inserted"),
        }
    }

    /// Append an empty `rows` x `cols` table to the body.
    pub fn add_table(&mut self, rows: usize, cols: usize) -> &mut Table {
        let at = self.append_position();
        self.body
            .insert(at, BodyElement::Table(Table::new(rows, cols)));
        match &mut self.body[at] {
            BodyElement::Table(t) => t,
            _ => unreachable!("a table was just inserted"),
        }
    }

    fn append_position(&self) -> usize {
        match self.body.last() {
            Some(BodyElement::Raw(xml)) if xml.contains("sectPr") => self.body.len() - 1,
            _ => self.body.len(),
        }
    }

    /// Substitute labels in the body paragraph at `pos` using the default
    /// `${name}` engine.
    pub fn substitute_in_paragraph_at(&mut self, pos: usize, bindings: &Bindings) -> Result<Substitutions> {
        let paragraph = self.paragraph_mut(pos)?;
        Ok(LabelSubstituter::default().substitute_in_paragraph(paragraph, bindings))
    }

    /// Substitute labels in the table at `pos` using the default engine.
    pub fn substitute_in_table_at(&mut self, pos: usize, bindings: &Bindings) -> Result<Substitutions> {
        let table = self.table_mut(pos)?;
        Ok(LabelSubstituter::default().substitute_in_table(table, bindings))
    }

    /// Substitute labels in every body paragraph using the default engine.
    pub fn substitute_in_all_paragraphs(&mut self, bindings: &Bindings) -> Substitutions {
        LabelSubstituter::default().substitute_in_all_paragraphs(self, bindings)
    }

    /// Substitute labels in every table using the default engine.
    pub fn substitute_in_all_tables(&mut self, bindings: &Bindings) -> Substitutions {
        LabelSubstituter::default().substitute_in_all_tables(self, bindings)
    }

    /// Substitute labels in body paragraphs and tables using the default
    /// engine.
    pub fn substitute_everywhere(&mut self, bindings: &Bindings) -> Substitutions {
        LabelSubstituter::default().substitute_everywhere(self, bindings)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} document: {} paragraphs, {} tables",
            self.format,
            self.paragraph_count(),
            self.table_count()
        )
    }
}

fn ensure_word(format: FileFormat) -> Result<()> {
    if format.is_word() {
        Ok(())
    } else {
        Err(Error::InvalidFormat(format!(
            "{} is not a word-processing format",
            format
        )))
    }
}

fn decode(format: FileFormat, bytes: &[u8]) -> Result<Document> {
    let mut document = codec_for(format)?.decode(bytes)?;
    document.format = format;
    Ok(document)
}
