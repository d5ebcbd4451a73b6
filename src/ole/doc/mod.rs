//! Legacy Word 97-2003 (.doc) and WPS text reader.
//!
//! The main document text is located through the FIB and the piece table,
//! then split into paragraphs and tables using the paragraph marks and the
//! table flags of the PAPX pages. Formatting is not decoded. Binary Word
//! files are read-only: convert a document to DOCX to save it.

mod fib;
mod papx;
mod piece_table;
mod reader;

#[cfg(test)]
pub(crate) mod fixture;

use std::io::Cursor;

use tracing::debug;

use self::fib::Fib;
use self::papx::PapxIndex;
use crate::common::error::{Error, Result};
use crate::common::FileFormat;
use crate::document::{Document, DocumentCodec};
use crate::ole::OleFile;

/// Codec for Word binary files.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocCodec;

impl DocumentCodec for DocCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Document> {
        let mut ole = OleFile::open(Cursor::new(bytes))?;
        let word = ole.open_stream(&["WordDocument"])?;
        let fib = Fib::parse(&word)?;
        let table = ole.open_stream(&[fib.table_stream])?;

        let pieces = piece_table::parse_clx(fib.clx.slice(&table, "Clx")?)?;
        let text = piece_table::decode_text(&word, &pieces, fib.ccp_text)?;
        let papx = if fib.plcf_bte_papx.lcb > 0 {
            Some(PapxIndex::parse(&word, fib.plcf_bte_papx.slice(&table, "PlcBtePapx")?)?)
        } else {
            None
        };

        let body = reader::read_body(&text, papx.as_ref());
        debug!(
            pieces = pieces.len(),
            chars = text.len(),
            blocks = body.len(),
            "decoded Word binary text"
        );
        Ok(Document::from_body(FileFormat::Doc, body))
    }

    fn encode(&self, document: &Document) -> Result<Vec<u8>> {
        Err(Error::Unsupported(format!(
            "writing {} files; convert the document to docx to save it",
            document.format().extension()
        )))
    }
}
