//! Event reader that keeps the source markup of every event.
//!
//! Codecs that re-emit unknown elements byte for byte need the exact input
//! span of each event, not a reconstruction from the parsed parts.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::escape::unescape_xml;
use crate::common::error::{Error, Result};

pub(crate) struct SpanReader<'x> {
    xml: &'x str,
    reader: Reader<&'x [u8]>,
}

impl<'x> SpanReader<'x> {
    pub(crate) fn new(xml: &'x str) -> Self {
        Self {
            xml,
            reader: Reader::from_str(xml),
        }
    }

    #[inline]
    pub(crate) fn position(&self) -> usize {
        self.reader.buffer_position() as usize
    }

    /// Next event with the byte range of its markup.
    pub(crate) fn next(&mut self) -> Result<(Event<'x>, usize, usize)> {
        let start = self.position();
        let event = self.reader.read_event()?;
        Ok((event, start, self.position()))
    }

    #[inline]
    pub(crate) fn slice(&self, start: usize, end: usize) -> &'x str {
        &self.xml[start..end]
    }

    /// Consume the rest of an element whose start tag began at `start` and
    /// return the whole element's markup.
    pub(crate) fn skip(&mut self, e: &BytesStart<'x>, start: usize) -> Result<&'x str> {
        self.reader.read_to_end(e.name())?;
        Ok(&self.xml[start..self.position()])
    }

    /// Character content up to the current element's end tag, entities
    /// resolved. Nested elements contribute their text.
    pub(crate) fn read_text(&mut self) -> Result<String> {
        let mut text = String::new();
        let mut depth = 0usize;
        loop {
            let (event, start, end) = self.next()?;
            match event {
                Event::Text(_) | Event::GeneralRef(_) => text.push_str(&unescape_xml(&self.xml[start..end])),
                Event::CData(ref c) => text.push_str(&String::from_utf8_lossy(c)),
                Event::Start(_) => depth += 1,
                Event::End(_) if depth == 0 => return Ok(text),
                Event::End(_) => depth -= 1,
                Event::Eof => return Err(unexpected_eof()),
                _ => {},
            }
        }
    }
}

/// Value of the attribute with local name `name`, entities resolved.
pub(crate) fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .map(|a| unescape_xml(&String::from_utf8_lossy(&a.value)))
}

pub(crate) fn unexpected_eof() -> Error {
    Error::CorruptedFile("unexpected end of XML part".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spans_cover_markup() {
        let xml = r#"<a x="1"><b>t &amp; u</b><c/></a>"#;
        let mut spans = SpanReader::new(xml);
        let (event, start, end) = spans.next().unwrap();
        assert!(matches!(event, Event::Start(_)));
        assert_eq!(spans.slice(start, end), r#"<a x="1">"#);

        let (event, start, _) = spans.next().unwrap();
        let Event::Start(b) = event else { panic!("expected <b>") };
        assert_eq!(spans.skip(&b, start).unwrap(), "<b>t &amp; u</b>");
        let (_, start, end) = spans.next().unwrap();
        assert_eq!(spans.slice(start, end), "<c/>");
    }

    #[test]
    fn test_read_text_resolves_entities_and_nesting() {
        let xml = "<t>a &lt; <r>b</r>&#36;<![CDATA[<c>]]></t>";
        let mut spans = SpanReader::new(xml);
        spans.next().unwrap();
        assert_eq!(spans.read_text().unwrap(), "a < b$<c>");
    }

    #[test]
    fn test_attribute_by_local_name() {
        let mut reader = Reader::from_str(r#"<w:c w:val="a&amp;b" r="A1"/>"#);
        let Event::Empty(e) = reader.read_event().unwrap() else { panic!("expected empty element") };
        assert_eq!(attribute(&e, b"val").as_deref(), Some("a&b"));
        assert_eq!(attribute(&e, b"r").as_deref(), Some("A1"));
        assert_eq!(attribute(&e, b"t"), None);
    }
}
