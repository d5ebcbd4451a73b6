//! Shared strings table (`xl/sharedStrings.xml`).

use std::collections::HashMap;
use std::fmt::Write;

use quick_xml::events::Event;

use crate::common::Result;
use crate::common::xml::span::unexpected_eof;
use crate::common::xml::{SpanReader, escape_xml};
use crate::ooxml::constants::namespace;

/// Strings referenced by index from `t="s"` cells.
#[derive(Debug, Default)]
pub struct SharedStrings {
    strings: Vec<String>,
}

impl SharedStrings {
    pub fn parse(xml: &str) -> Result<Self> {
        let mut spans = SpanReader::new(xml);
        let mut strings = Vec::new();
        loop {
            match spans.next()?.0 {
                Event::Start(e) if e.local_name().as_ref() == b"si" => {
                    strings.push(read_string_item(&mut spans)?);
                },
                Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
                Event::Eof => break,
                _ => {},
            }
        }
        Ok(Self { strings })
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// Text of an `<si>` or `<is>` element whose start tag was just read.
///
/// Rich text runs are concatenated; phonetic runs (`rPh`) are left out.
pub(crate) fn read_string_item(spans: &mut SpanReader<'_>) -> Result<String> {
    let mut text = String::new();
    let mut depth = 0usize;
    loop {
        let (event, start, _) = spans.next()?;
        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"t" => text.push_str(&spans.read_text()?),
                b"rPh" | b"rPr" => {
                    spans.skip(&e, start)?;
                },
                _ => depth += 1,
            },
            Event::End(_) if depth == 0 => return Ok(text),
            Event::End(_) => depth -= 1,
            Event::Eof => return Err(unexpected_eof()),
            _ => {},
        }
    }
}

/// Deduplicating table built while writing sheets.
#[derive(Debug, Default)]
pub struct SharedStringsBuilder {
    strings: Vec<String>,
    index: HashMap<String, usize>,
    /// Number of references, including repeats
    count: usize,
}

impl SharedStringsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `s`, adding it on first use.
    pub fn add(&mut self, s: &str) -> usize {
        self.count += 1;
        if let Some(&index) = self.index.get(s) {
            return index;
        }
        let index = self.strings.len();
        self.strings.push(s.to_string());
        self.index.insert(s.to_string(), index);
        index
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.strings.iter().map(|s| s.len() + 40).sum::<usize>());
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        let _ = write!(
            xml,
            r#"<sst xmlns="{}" count="{}" uniqueCount="{}">"#,
            namespace::SML_MAIN,
            self.count,
            self.strings.len()
        );
        for s in &self.strings {
            let _ = write!(xml, r#"<si><t xml:space="preserve">{}</t></si>"#, escape_xml(s));
        }
        xml.push_str("</sst>");
        xml
    }
}
