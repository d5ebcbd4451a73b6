//! Format-family dispatch for word-processing documents.

use super::Document;
use crate::common::{Error, FileFormat, Result};
use crate::ole::doc::DocCodec;
use crate::ooxml::docx::DocxCodec;

/// Decoder and encoder for one container family.
pub trait DocumentCodec {
    /// Decode a whole file held in memory.
    fn decode(&self, bytes: &[u8]) -> Result<Document>;

    /// Encode `document` into this codec's container.
    fn encode(&self, document: &Document) -> Result<Vec<u8>>;
}

/// Codec handling `format`.
pub fn codec_for(format: FileFormat) -> Result<&'static dyn DocumentCodec> {
    match format {
        FileFormat::Docx => Ok(&DocxCodec),
        FileFormat::Doc | FileFormat::Wps => Ok(&DocCodec),
        other => Err(Error::InvalidFormat(format!(
            "{} is not a word-processing format",
            other
        ))),
    }
}
