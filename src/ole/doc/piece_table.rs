//! Piece table: maps character positions of the document text to byte
//! offsets in the `WordDocument` stream.
//!
//! Each piece stores its text either as UTF-16LE or, when flagged as
//! compressed, as one Windows-1252 byte per character.

use crate::common::binary::{read_u16_le, read_u32_le};
use crate::common::error::{Error, Result};

const CLX_PRC: u8 = 0x01;
const CLX_PCDT: u8 = 0x02;
const PCD_SIZE: usize = 8;
const FC_COMPRESSED: u32 = 0x4000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Piece {
    pub(crate) cp_start: u32,
    pub(crate) cp_end: u32,
    /// Byte offset of the first character
    pub(crate) fc: u32,
    pub(crate) compressed: bool,
}

/// A character of the main text and the byte offset it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TextChar {
    pub(crate) ch: char,
    pub(crate) fc: u32,
}

/// Parse the pieces out of a Clx structure.
pub(crate) fn parse_clx(clx: &[u8]) -> Result<Vec<Piece>> {
    let mut offset = 0;
    while clx.get(offset) == Some(&CLX_PRC) {
        let size = read_u16_le(clx, offset + 1)? as usize;
        offset += 3 + size;
    }
    if clx.get(offset) != Some(&CLX_PCDT) {
        return Err(Error::CorruptedFile("piece table not found in Clx".to_string()));
    }
    let lcb = read_u32_le(clx, offset + 1)? as usize;
    let plc = clx
        .get(offset + 5..offset + 5 + lcb)
        .ok_or_else(|| Error::CorruptedFile("truncated piece table".to_string()))?;
    if lcb < 4 || (lcb - 4) % (4 + PCD_SIZE) != 0 {
        return Err(Error::CorruptedFile(format!("bad piece table size {}", lcb)));
    }

    let count = (lcb - 4) / (4 + PCD_SIZE);
    let descriptors = 4 * (count + 1);
    let mut pieces = Vec::with_capacity(count);
    for i in 0..count {
        let raw_fc = read_u32_le(plc, descriptors + i * PCD_SIZE + 2)?;
        let compressed = raw_fc & FC_COMPRESSED != 0;
        pieces.push(Piece {
            cp_start: read_u32_le(plc, i * 4)?,
            cp_end: read_u32_le(plc, (i + 1) * 4)?,
            fc: if compressed { (raw_fc & !FC_COMPRESSED) / 2 } else { raw_fc },
            compressed,
        });
    }
    Ok(pieces)
}

/// Decode the first `ccp_text` characters: the main document story.
pub(crate) fn decode_text(word_document: &[u8], pieces: &[Piece], ccp_text: u32) -> Result<Vec<TextChar>> {
    let mut text = Vec::with_capacity(ccp_text as usize);
    for piece in pieces {
        if piece.cp_start >= ccp_text || piece.cp_end <= piece.cp_start {
            continue;
        }
        let count = (piece.cp_end.min(ccp_text) - piece.cp_start) as usize;
        let start = piece.fc as usize;
        let width = if piece.compressed { 1 } else { 2 };
        let bytes = word_document
            .get(start..start + count * width)
            .ok_or_else(|| Error::CorruptedFile("text piece lies outside WordDocument".to_string()))?;

        if piece.compressed {
            let (decoded, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes);
            for (i, ch) in decoded.chars().enumerate() {
                text.push(TextChar {
                    ch,
                    fc: piece.fc + i as u32,
                });
            }
        } else {
            let units = bytes.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]]));
            let mut unit_index = 0u32;
            for decoded in char::decode_utf16(units) {
                let (ch, len) = match decoded {
                    Ok(ch) => (ch, ch.len_utf16() as u32),
                    Err(_) => (char::REPLACEMENT_CHARACTER, 1),
                };
                text.push(TextChar {
                    ch,
                    fc: piece.fc + unit_index * 2,
                });
                unit_index += len;
            }
        }
    }
    Ok(text)
}
