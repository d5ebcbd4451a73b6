//! Decoding of the main document part into the document model.
//!
//! Paragraphs, runs and tables are decoded; every other element is kept as
//! its original markup so that a save reproduces it byte for byte.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::common::error::{Error, Result};
use crate::common::xml::span::unexpected_eof;
use crate::common::xml::{SpanReader, attribute};
use crate::document::{
    BodyElement, Cell, Paragraph, ParagraphItem, Row, Run, RunContent, RunProperties, Table,
};

/// Inline wrappers whose runs count as paragraph text.
const INLINE_GROUPS: &[&[u8]] = &[
    b"hyperlink",
    b"ins",
    b"moveTo",
    b"smartTag",
    b"fldSimple",
    b"customXml",
    b"dir",
    b"bdo",
    b"sdt",
    b"sdtContent",
];

/// Body content of a document part, with the markup around it.
#[derive(Debug)]
pub(crate) struct DecodedBody {
    /// Everything up to and including the body start tag
    pub(crate) prefix: String,
    pub(crate) body: Vec<BodyElement>,
    /// Everything from the body end tag on
    pub(crate) suffix: String,
}

/// Decode a `w:document` part.
pub(crate) fn read_document(xml: &str) -> Result<DecodedBody> {
    let mut reader = BodyReader::new(xml);
    loop {
        let (event, start, end) = reader.next()?;
        match event {
            Event::Start(ref e) if e.local_name().as_ref() == b"body" => {
                let (body, close) = reader.read_blocks(None)?;
                return Ok(DecodedBody {
                    prefix: xml[..end].to_string(),
                    body,
                    suffix: xml[close..].to_string(),
                });
            },
            Event::Empty(ref e) if e.local_name().as_ref() == b"body" => {
                let open = open_from_empty(&xml[start..end]);
                return Ok(DecodedBody {
                    prefix: format!("{}{}", &xml[..start], open),
                    body: Vec::new(),
                    suffix: format!("{}{}", closing_tag(&open), &xml[end..]),
                });
            },
            Event::Eof => {
                return Err(Error::CorruptedFile("document part has no body".to_string()));
            },
            _ => {},
        }
    }
}

/// Parse the children of a `w:rPr` element.
pub(crate) fn read_run_properties(raw: &str) -> Result<RunProperties> {
    let mut props = RunProperties {
        raw: Some(raw.to_string()),
        ..RunProperties::default()
    };
    let mut reader = Reader::from_str(raw);
    loop {
        match reader.read_event()? {
            Event::Start(ref e) | Event::Empty(ref e) => match e.local_name().as_ref() {
                b"b" => props.bold = Some(on_off(e)),
                b"i" => props.italic = Some(on_off(e)),
                b"u" => props.underline = Some(attribute(e, b"val").is_none_or(|v| v != "none")),
                b"sz" => props.font_size = attribute(e, b"val").and_then(|v| v.parse().ok()),
                b"rFonts" => props.font_name = attribute(e, b"ascii").or_else(|| attribute(e, b"eastAsia")),
                b"color" => props.color = attribute(e, b"val"),
                _ => {},
            },
            Event::Eof => break,
            _ => {},
        }
    }
    Ok(props)
}

/// OOXML on/off property: absent `val` means on.
fn on_off(e: &BytesStart<'_>) -> bool {
    !matches!(attribute(e, b"val").as_deref(), Some("0" | "false" | "off"))
}

/// `<w:p/>` becomes `<w:p>`.
pub(crate) fn open_from_empty(raw: &str) -> String {
    let tag = raw.trim_end_matches('>').trim_end().trim_end_matches('/');
    format!("{}>", tag.trim_end())
}

/// End tag matching a start tag, e.g. `</w:p>` for `<w:p w14:paraId="1">`.
pub(crate) fn closing_tag(open: &str) -> String {
    let name: String = open
        .trim_start_matches('<')
        .chars()
        .take_while(|c| !c.is_whitespace() && *c != '>' && *c != '/')
        .collect();
    format!("</{}>", name)
}

fn is_blank(raw: &str) -> bool {
    raw.trim().is_empty()
}

struct BodyReader<'x> {
    spans: SpanReader<'x>,
}

impl<'x> BodyReader<'x> {
    fn new(xml: &'x str) -> Self {
        Self {
            spans: SpanReader::new(xml),
        }
    }

    #[inline]
    fn next(&mut self) -> Result<(Event<'x>, usize, usize)> {
        self.spans.next()
    }

    #[inline]
    fn slice(&self, start: usize, end: usize) -> &'x str {
        self.spans.slice(start, end)
    }

    #[inline]
    fn raw(&self, start: usize, end: usize) -> String {
        self.spans.slice(start, end).to_string()
    }

    #[inline]
    fn skip(&mut self, e: &BytesStart<'x>, start: usize) -> Result<String> {
        Ok(self.spans.skip(e, start)?.to_string())
    }

    /// Read block content up to the container's end tag.
    ///
    /// Returns the blocks and the offset where the end tag starts. With
    /// `cell_properties`, a `tcPr` child is stored there instead.
    fn read_blocks(
        &mut self,
        mut cell_properties: Option<&mut Option<String>>,
    ) -> Result<(Vec<BodyElement>, usize)> {
        let mut blocks = Vec::new();
        loop {
            let (event, start, end) = self.next()?;
            match event {
                Event::Start(ref e) => match e.local_name().as_ref() {
                    b"p" => {
                        let open = self.raw(start, end);
                        blocks.push(BodyElement::Paragraph(self.read_paragraph(open)?));
                    },
                    b"tbl" => {
                        let open = self.raw(start, end);
                        blocks.push(BodyElement::Table(self.read_table(open)?));
                    },
                    b"tcPr" if cell_properties.is_some() => {
                        let raw = self.skip(e, start)?;
                        if let Some(slot) = cell_properties.as_deref_mut() {
                            *slot = Some(raw);
                        }
                    },
                    _ => blocks.push(BodyElement::Raw(self.skip(e, start)?)),
                },
                Event::Empty(ref e) => {
                    let raw = self.raw(start, end);
                    match e.local_name().as_ref() {
                        b"p" => blocks.push(BodyElement::Paragraph(Paragraph {
                            open_tag: Some(open_from_empty(&raw)),
                            ..Paragraph::default()
                        })),
                        b"tcPr" if cell_properties.is_some() => {
                            if let Some(slot) = cell_properties.as_deref_mut() {
                                *slot = Some(raw);
                            }
                        },
                        _ => blocks.push(BodyElement::Raw(raw)),
                    }
                },
                Event::End(_) => return Ok((blocks, start)),
                Event::Text(_) if is_blank(self.slice(start, end)) => {},
                Event::Eof => return Err(unexpected_eof()),
                _ => blocks.push(BodyElement::Raw(self.raw(start, end))),
            }
        }
    }

    fn read_paragraph(&mut self, open: String) -> Result<Paragraph> {
        let mut paragraph = Paragraph {
            open_tag: Some(open),
            ..Paragraph::default()
        };
        paragraph.items = self.read_inline(Some(&mut paragraph.properties))?;
        Ok(paragraph)
    }

    /// Read inline content up to the enclosing end tag.
    fn read_inline(
        &mut self,
        mut properties: Option<&mut Option<String>>,
    ) -> Result<Vec<ParagraphItem>> {
        let mut items = Vec::new();
        loop {
            let (event, start, end) = self.next()?;
            match event {
                Event::Start(ref e) => {
                    let local = e.local_name();
                    match local.as_ref() {
                        b"pPr" if properties.is_some() => {
                            let raw = self.skip(e, start)?;
                            if let Some(slot) = properties.as_deref_mut() {
                                *slot = Some(raw);
                            }
                        },
                        b"r" => {
                            let open = self.raw(start, end);
                            items.push(ParagraphItem::Run(self.read_run(open)?));
                        },
                        name if INLINE_GROUPS.contains(&name) => {
                            let open = self.raw(start, end);
                            let close = closing_tag(&open);
                            let inner = self.read_inline(None)?;
                            items.push(ParagraphItem::Group {
                                open,
                                close,
                                items: inner,
                            });
                        },
                        _ => items.push(ParagraphItem::Raw(self.skip(e, start)?)),
                    }
                },
                Event::Empty(ref e) => {
                    let raw = self.raw(start, end);
                    match e.local_name().as_ref() {
                        b"pPr" if properties.is_some() => {
                            if let Some(slot) = properties.as_deref_mut() {
                                *slot = Some(raw);
                            }
                        },
                        b"r" => items.push(ParagraphItem::Run(Run {
                            open_tag: Some(open_from_empty(&raw)),
                            ..Run::default()
                        })),
                        _ => items.push(ParagraphItem::Raw(raw)),
                    }
                },
                Event::End(_) => return Ok(items),
                Event::Text(_) if is_blank(self.slice(start, end)) => {},
                Event::Eof => return Err(unexpected_eof()),
                _ => items.push(ParagraphItem::Raw(self.raw(start, end))),
            }
        }
    }

    fn read_run(&mut self, open: String) -> Result<Run> {
        let mut run = Run {
            open_tag: Some(open),
            ..Run::default()
        };
        loop {
            let (event, start, end) = self.next()?;
            match event {
                Event::Start(ref e) => match e.local_name().as_ref() {
                    b"rPr" => {
                        let raw = self.skip(e, start)?;
                        run.properties = read_run_properties(&raw)?;
                    },
                    b"t" => {
                        let text = self.read_text()?;
                        run.content.push(RunContent::Text(text));
                    },
                    _ => run.content.push(RunContent::Raw(self.skip(e, start)?)),
                },
                Event::Empty(ref e) => {
                    let raw = self.raw(start, end);
                    match e.local_name().as_ref() {
                        b"rPr" => run.properties = read_run_properties(&raw)?,
                        b"t" => {},
                        b"tab" => run.content.push(RunContent::Tab),
                        b"cr" => run.content.push(RunContent::Break),
                        b"br" if attribute(e, b"type").is_none_or(|t| t == "textWrapping") => {
                            run.content.push(RunContent::Break)
                        },
                        _ => run.content.push(RunContent::Raw(raw)),
                    }
                },
                Event::End(_) => return Ok(run),
                Event::Text(_) if is_blank(self.slice(start, end)) => {},
                Event::Eof => return Err(unexpected_eof()),
                _ => run.content.push(RunContent::Raw(self.raw(start, end))),
            }
        }
    }

    /// Text of a `w:t` element, entities resolved.
    fn read_text(&mut self) -> Result<String> {
        self.spans.read_text()
    }

    fn read_table(&mut self, open: String) -> Result<Table> {
        let mut table = Table {
            open_tag: Some(open),
            ..Table::default()
        };
        loop {
            let (event, start, end) = self.next()?;
            let raw = match event {
                Event::Start(ref e) if e.local_name().as_ref() == b"tr" => {
                    let open = self.raw(start, end);
                    table.rows.push(self.read_row(open)?);
                    continue;
                },
                Event::Empty(ref e) if e.local_name().as_ref() == b"tr" => {
                    table.rows.push(Row {
                        open_tag: Some(open_from_empty(self.slice(start, end))),
                        ..Row::default()
                    });
                    continue;
                },
                Event::Start(ref e) => self.skip(e, start)?,
                Event::End(_) => return Ok(table),
                Event::Text(_) if is_blank(self.slice(start, end)) => continue,
                Event::Eof => return Err(unexpected_eof()),
                _ => self.raw(start, end),
            };
            match table.rows.last_mut() {
                Some(row) => row.trailing.push_str(&raw),
                None => table.leading.push_str(&raw),
            }
        }
    }

    fn read_row(&mut self, open: String) -> Result<Row> {
        let mut row = Row {
            open_tag: Some(open),
            ..Row::default()
        };
        loop {
            let (event, start, end) = self.next()?;
            let raw = match event {
                Event::Start(ref e) if e.local_name().as_ref() == b"tc" => {
                    let open = self.raw(start, end);
                    row.cells.push(self.read_cell(open)?);
                    continue;
                },
                Event::Empty(ref e) if e.local_name().as_ref() == b"tc" => {
                    row.cells.push(Cell {
                        open_tag: Some(open_from_empty(self.slice(start, end))),
                        ..Cell::default()
                    });
                    continue;
                },
                Event::Start(ref e) => self.skip(e, start)?,
                Event::End(_) => return Ok(row),
                Event::Text(_) if is_blank(self.slice(start, end)) => continue,
                Event::Eof => return Err(unexpected_eof()),
                _ => self.raw(start, end),
            };
            match row.cells.last_mut() {
                Some(cell) => cell.trailing.push_str(&raw),
                None => row.leading.push_str(&raw),
            }
        }
    }

    fn read_cell(&mut self, open: String) -> Result<Cell> {
        let mut cell = Cell {
            open_tag: Some(open),
            ..Cell::default()
        };
        let (elements, _) = self.read_blocks(Some(&mut cell.properties))?;
        cell.elements = elements;
        Ok(cell)
    }
}
