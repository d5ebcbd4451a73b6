//! Little-endian readers and string decoders for the legacy binary formats.
//!
//! Shared by the OLE2 container, the Word 97-2003 piece table and the
//! BIFF8 record parser.

use encoding_rs::Encoding;
use zerocopy::{F64, FromBytes, LE, U16, U32};

/// Binary parsing error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryError {
    /// Not enough data to read the requested type
    InsufficientData { expected: usize, available: usize },
}

impl std::fmt::Display for BinaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryError::InsufficientData {
                expected,
                available,
            } => write!(
                f,
                "Insufficient data: expected {}, got {}",
                expected, available
            ),
        }
    }
}

impl std::error::Error for BinaryError {}

/// Result type for binary operations
pub type BinaryResult<T> = Result<T, BinaryError>;

#[inline]
fn window(data: &[u8], offset: usize, len: usize) -> BinaryResult<&[u8]> {
    data.get(offset..offset.saturating_add(len))
        .ok_or(BinaryError::InsufficientData {
            expected: offset.saturating_add(len),
            available: data.len(),
        })
}

/// Read a little-endian u16 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use officekit::common::binary::read_u16_le;
/// let data = [0x34, 0x12, 0x78, 0x56];
/// assert_eq!(read_u16_le(&data, 2).unwrap(), 0x5678);
/// assert!(read_u16_le(&data, 3).is_err());
/// ```
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> BinaryResult<u16> {
    let bytes = window(data, offset, 2)?;
    Ok(U16::<LE>::read_from_bytes(bytes).map(|v| v.get()).unwrap_or_default())
}

/// Read a little-endian u32 from a byte slice at the given offset.
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> BinaryResult<u32> {
    let bytes = window(data, offset, 4)?;
    Ok(U32::<LE>::read_from_bytes(bytes).map(|v| v.get()).unwrap_or_default())
}

/// Read a little-endian IEEE 754 double from a byte slice at the given offset.
#[inline]
pub fn read_f64_le(data: &[u8], offset: usize) -> BinaryResult<f64> {
    let bytes = window(data, offset, 8)?;
    Ok(F64::<LE>::read_from_bytes(bytes).map(|v| v.get()).unwrap_or_default())
}

/// Decode `char_count` UTF-16LE code units starting at `offset`.
///
/// Unpaired surrogates become U+FFFD. Returns an error if the slice is short.
pub fn read_utf16le(data: &[u8], offset: usize, char_count: usize) -> BinaryResult<String> {
    let bytes = window(data, offset, char_count * 2)?;
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    Ok(String::from_utf16_lossy(&units))
}

/// Map a Windows codepage number to an encoding.
///
/// Returns `None` for codepages with no `encoding_rs` counterpart.
pub fn codepage_to_encoding(codepage: u16) -> Option<&'static Encoding> {
    match codepage {
        437 | 850 | 1252 | 0x8001 => Some(encoding_rs::WINDOWS_1252),
        874 => Some(encoding_rs::WINDOWS_874),
        932 => Some(encoding_rs::SHIFT_JIS),
        936 => Some(encoding_rs::GBK),
        949 => Some(encoding_rs::EUC_KR),
        950 => Some(encoding_rs::BIG5),
        1200 => Some(encoding_rs::UTF_16LE),
        1250 => Some(encoding_rs::WINDOWS_1250),
        1251 => Some(encoding_rs::WINDOWS_1251),
        1253 => Some(encoding_rs::WINDOWS_1253),
        1254 => Some(encoding_rs::WINDOWS_1254),
        1255 => Some(encoding_rs::WINDOWS_1255),
        1256 => Some(encoding_rs::WINDOWS_1256),
        1257 => Some(encoding_rs::WINDOWS_1257),
        1258 => Some(encoding_rs::WINDOWS_1258),
        10000 => Some(encoding_rs::MACINTOSH),
        65001 => Some(encoding_rs::UTF_8),
        _ => None,
    }
}

/// Decode 8-bit text in the given codepage, falling back to Windows-1252.
///
/// # Examples
///
/// ```
/// use officekit::common::binary::decode_codepage;
/// assert_eq!(decode_codepage(b"caf\xe9", 1252), "café");
/// assert_eq!(decode_codepage(b"abc", 9999), "abc");
/// ```
pub fn decode_codepage(data: &[u8], codepage: u16) -> String {
    let encoding = codepage_to_encoding(codepage).unwrap_or(encoding_rs::WINDOWS_1252);
    let (text, _, _) = encoding.decode(data);
    text.into_owned()
}
