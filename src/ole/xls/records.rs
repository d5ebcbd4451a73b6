//! BIFF8 record framing and the string encodings records use.

use crate::common::binary::{read_u16_le, read_u32_le};
use crate::common::error::{Error, Result};

pub(crate) const BOF: u16 = 0x0809;
pub(crate) const EOF: u16 = 0x000A;
pub(crate) const FILEPASS: u16 = 0x002F;
pub(crate) const DATEMODE: u16 = 0x0022;
pub(crate) const CONTINUE: u16 = 0x003C;
pub(crate) const FONT: u16 = 0x0031;
pub(crate) const FORMAT: u16 = 0x041E;
pub(crate) const XF: u16 = 0x00E0;
pub(crate) const PALETTE: u16 = 0x0092;
pub(crate) const BOUNDSHEET: u16 = 0x0085;
pub(crate) const SST: u16 = 0x00FC;
pub(crate) const ROW: u16 = 0x0208;
pub(crate) const BLANK: u16 = 0x0201;
pub(crate) const MULBLANK: u16 = 0x00BE;
pub(crate) const NUMBER: u16 = 0x0203;
pub(crate) const LABEL: u16 = 0x0204;
pub(crate) const BOOLERR: u16 = 0x0205;
pub(crate) const RK: u16 = 0x027E;
pub(crate) const MULRK: u16 = 0x00BD;
pub(crate) const LABELSST: u16 = 0x00FD;
pub(crate) const FORMULA: u16 = 0x0006;
pub(crate) const STRING: u16 = 0x0207;
pub(crate) const MERGEDCELLS: u16 = 0x00E5;

/// BIFF8 version number in the BOF record
pub(crate) const BIFF8: u16 = 0x0600;

/// A record borrowed from the workbook stream.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Record<'a> {
    pub(crate) record_type: u16,
    pub(crate) data: &'a [u8],
}

/// Iterator over the records of a stream, starting at a byte offset.
pub(crate) struct RecordIter<'a> {
    stream: &'a [u8],
    pos: usize,
}

impl<'a> RecordIter<'a> {
    pub(crate) fn new(stream: &'a [u8], pos: usize) -> Self {
        Self { stream, pos }
    }

    /// Type of the next record, without consuming it.
    pub(crate) fn peek_type(&self) -> Option<u16> {
        read_u16_le(self.stream, self.pos).ok()
    }
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = Result<Record<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos + 4 > self.stream.len() {
            return None;
        }
        let record_type = read_u16_le(self.stream, self.pos).ok()?;
        let len = read_u16_le(self.stream, self.pos + 2).ok()? as usize;
        let start = self.pos + 4;
        let Some(data) = self.stream.get(start..start + len) else {
            self.pos = self.stream.len();
            return Some(Err(Error::CorruptedFile(format!(
                "record 0x{:04X} at offset {} runs past the end of the stream",
                record_type, self.pos
            ))));
        };
        self.pos = start + len;
        Some(Ok(Record { record_type, data }))
    }
}

/// Reader over a record and its CONTINUE records.
///
/// Character data split across a record boundary resumes with a fresh
/// option byte giving the width of the remaining characters.
pub(crate) struct ContinuedReader<'a> {
    fragments: Vec<&'a [u8]>,
    fragment: usize,
    pos: usize,
}

impl<'a> ContinuedReader<'a> {
    pub(crate) fn new(fragments: Vec<&'a [u8]>) -> Self {
        Self {
            fragments,
            fragment: 0,
            pos: 0,
        }
    }

    fn current(&mut self) -> Result<&'a [u8]> {
        while let Some(&fragment) = self.fragments.get(self.fragment) {
            if self.pos < fragment.len() {
                return Ok(&fragment[self.pos..]);
            }
            self.fragment += 1;
            self.pos = 0;
        }
        Err(truncated())
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        let byte = self.current()?[0];
        self.pos += 1;
        Ok(byte)
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes([self.read_u8()?, self.read_u8()?]))
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes([
            self.read_u8()?,
            self.read_u8()?,
            self.read_u8()?,
            self.read_u8()?,
        ]))
    }

    pub(crate) fn skip(&mut self, mut n: usize) -> Result<()> {
        while n > 0 {
            let available = self.current()?.len().min(n);
            self.pos += available;
            n -= available;
        }
        Ok(())
    }

    /// `cch` characters, starting `wide` (UTF-16) or compressed (Latin-1).
    fn read_chars(&mut self, cch: usize, mut wide: bool) -> Result<String> {
        let mut units = Vec::with_capacity(cch);
        while units.len() < cch {
            let in_fragment = self
                .fragments
                .get(self.fragment)
                .map_or(0, |f| f.len().saturating_sub(self.pos));
            if in_fragment == 0 {
                self.fragment += 1;
                self.pos = 0;
                if self.fragment >= self.fragments.len() {
                    return Err(truncated());
                }
                wide = self.read_u8()? & 0x01 != 0;
                continue;
            }
            if wide {
                units.push(self.read_u16()?);
            } else {
                units.push(self.read_u8()? as u16);
            }
        }
        Ok(String::from_utf16_lossy(&units))
    }

    /// An XLUnicodeRichExtendedString, as stored in the SST.
    pub(crate) fn read_rich_string(&mut self) -> Result<String> {
        let cch = self.read_u16()? as usize;
        let flags = self.read_u8()?;
        let runs = if flags & 0x08 != 0 { self.read_u16()? as usize } else { 0 };
        let phonetic = if flags & 0x04 != 0 { self.read_u32()? as usize } else { 0 };
        let text = self.read_chars(cch, flags & 0x01 != 0)?;
        self.skip(runs * 4 + phonetic)?;
        Ok(text)
    }
}

fn truncated() -> Error {
    Error::CorruptedFile("string runs past the end of its record".to_string())
}

/// An XLUnicodeString (16-bit length) at `offset`; returns the text and the
/// bytes consumed.
pub(crate) fn read_unicode_string(data: &[u8], offset: usize) -> Result<(String, usize)> {
    let cch = read_u16_le(data, offset)? as usize;
    let (text, used) = read_flagged_chars(data, offset + 2, cch)?;
    Ok((text, 2 + used))
}

/// A ShortXLUnicodeString (8-bit length) at `offset`.
pub(crate) fn read_short_unicode_string(data: &[u8], offset: usize) -> Result<String> {
    let cch = *data.get(offset).ok_or_else(truncated)? as usize;
    Ok(read_flagged_chars(data, offset + 1, cch)?.0)
}

fn read_flagged_chars(data: &[u8], offset: usize, cch: usize) -> Result<(String, usize)> {
    let flags = *data.get(offset).ok_or_else(truncated)?;
    let start = offset + 1;
    if flags & 0x01 != 0 {
        let bytes = data.get(start..start + cch * 2).ok_or_else(truncated)?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        Ok((String::from_utf16_lossy(&units), 1 + cch * 2))
    } else {
        let bytes = data.get(start..start + cch).ok_or_else(truncated)?;
        Ok((bytes.iter().map(|&b| b as char).collect(), 1 + cch))
    }
}

/// Decode an RK number: a 30-bit integer or the high 30 bits of a double,
/// optionally divided by 100.
pub(crate) fn rk_to_f64(rk: u32) -> f64 {
    let value = if rk & 0x02 != 0 {
        ((rk as i32) >> 2) as f64
    } else {
        f64::from_bits(((rk & 0xFFFF_FFFC) as u64) << 32)
    };
    if rk & 0x01 != 0 { value / 100.0 } else { value }
}

/// Whether an RK number holds an integer before any division.
pub(crate) fn rk_is_integer(rk: u32) -> bool {
    rk & 0x03 == 0x02
}

/// Display text of a BIFF error code.
pub(crate) fn error_text(code: u8) -> &'static str {
    match code {
        0x00 => "#NULL!",
        0x07 => "#DIV/0!",
        0x0F => "#VALUE!",
        0x17 => "#REF!",
        0x1D => "#NAME?",
        0x24 => "#NUM!",
        0x2A => "#N/A",
        _ => "#ERR!",
    }
}

/// Row, column and XF index that start every cell record.
pub(crate) fn cell_header(data: &[u8]) -> Result<(usize, usize, usize)> {
    Ok((
        read_u16_le(data, 0)? as usize,
        read_u16_le(data, 2)? as usize,
        read_u16_le(data, 4)? as usize,
    ))
}

/// Read a u32 at `offset` of a record body.
#[inline]
pub(crate) fn u32_at(data: &[u8], offset: usize) -> Result<u32> {
    Ok(read_u32_le(data, offset)?)
}
