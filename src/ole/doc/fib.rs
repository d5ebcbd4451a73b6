//! File Information Block at the start of the `WordDocument` stream.
//!
//! Only the fields needed to locate the main text and its paragraph
//! properties are read. The FIB is variable length: each section is prefixed
//! by its own count, so offsets are computed rather than fixed.

use crate::common::binary::{read_u16_le, read_u32_le};
use crate::common::error::{Error, Result};

const WORD97_MAGIC: u16 = 0xA5EC;
const WORD95_MAGIC: u16 = 0xA5DC;

const FLAG_ENCRYPTED: u16 = 0x0100;
const FLAG_WHICH_TABLE: u16 = 0x0200;

/// Size of FibBase
const FIB_BASE_SIZE: usize = 32;
/// ccpText index in FibRgLw97
const LW_CCP_TEXT: usize = 3;
/// fcPlcfBtePapx index in FibRgFcLcb97
const FC_PLCF_BTE_PAPX: usize = 13;
/// fcClx index in FibRgFcLcb97
const FC_CLX: usize = 33;

/// Offset and size of a structure in the table stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct FcLcb {
    pub(crate) fc: u32,
    pub(crate) lcb: u32,
}

impl FcLcb {
    /// The bytes this entry points at inside `stream`.
    pub(crate) fn slice<'a>(&self, stream: &'a [u8], what: &str) -> Result<&'a [u8]> {
        let start = self.fc as usize;
        stream
            .get(start..start + self.lcb as usize)
            .ok_or_else(|| Error::CorruptedFile(format!("{} lies outside the table stream", what)))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Fib {
    /// `0Table` or `1Table`
    pub(crate) table_stream: &'static str,
    /// Characters in the main document text
    pub(crate) ccp_text: u32,
    pub(crate) clx: FcLcb,
    pub(crate) plcf_bte_papx: FcLcb,
}

impl Fib {
    pub(crate) fn parse(data: &[u8]) -> Result<Self> {
        match read_u16_le(data, 0)? {
            WORD97_MAGIC => {},
            WORD95_MAGIC => {
                return Err(Error::Unsupported("Word 95 and earlier documents".to_string()));
            },
            magic => {
                return Err(Error::InvalidFormat(format!("invalid FIB magic number 0x{:04X}", magic)));
            },
        }
        let flags = read_u16_le(data, 0x0A)?;
        if flags & FLAG_ENCRYPTED != 0 {
            return Err(Error::Unsupported("encrypted Word documents".to_string()));
        }

        let csw = read_u16_le(data, FIB_BASE_SIZE)? as usize;
        let cslw_at = FIB_BASE_SIZE + 2 + csw * 2;
        let cslw = read_u16_le(data, cslw_at)? as usize;
        if cslw <= LW_CCP_TEXT {
            return Err(Error::CorruptedFile("FIB has no text length".to_string()));
        }
        let rg_lw = cslw_at + 2;
        let ccp_text = read_u32_le(data, rg_lw + LW_CCP_TEXT * 4)?;

        let cb_at = rg_lw + cslw * 4;
        let cb_rg_fc_lcb = read_u16_le(data, cb_at)? as usize;
        if cb_rg_fc_lcb <= FC_CLX {
            return Err(Error::CorruptedFile("FIB has no piece table location".to_string()));
        }
        let rg_fc_lcb = cb_at + 2;
        let pair = |index: usize| -> Result<FcLcb> {
            let at = rg_fc_lcb + index * 8;
            Ok(FcLcb {
                fc: read_u32_le(data, at)?,
                lcb: read_u32_le(data, at + 4)?,
            })
        };

        Ok(Self {
            table_stream: if flags & FLAG_WHICH_TABLE != 0 { "1Table" } else { "0Table" },
            ccp_text,
            clx: pair(FC_CLX)?,
            plcf_bte_papx: pair(FC_PLCF_BTE_PAPX)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::doc::fixture;

    #[test]
    fn test_parse_fixture_fib() {
        let word = fixture::fib(42, FcLcb { fc: 5, lcb: 21 }, FcLcb { fc: 26, lcb: 12 });
        let fib = Fib::parse(&word).unwrap();
        assert_eq!(fib.table_stream, "1Table");
        assert_eq!(fib.ccp_text, 42);
        assert_eq!(fib.clx, FcLcb { fc: 5, lcb: 21 });
        assert_eq!(fib.plcf_bte_papx, FcLcb { fc: 26, lcb: 12 });
    }

    #[test]
    fn test_rejects_other_versions_and_encryption() {
        let mut word = fixture::fib(0, FcLcb::default(), FcLcb::default());
        word[0x0A..0x0C].copy_from_slice(&FLAG_ENCRYPTED.to_le_bytes());
        assert!(matches!(Fib::parse(&word), Err(Error::Unsupported(_))));

        word[0..2].copy_from_slice(&WORD95_MAGIC.to_le_bytes());
        assert!(matches!(Fib::parse(&word), Err(Error::Unsupported(_))));

        word[0..2].copy_from_slice(&[0, 0]);
        assert!(matches!(Fib::parse(&word), Err(Error::InvalidFormat(_))));
        assert!(Fib::parse(&[0xEC, 0xA5]).is_err());
    }

    #[test]
    fn test_slice_bounds() {
        let stream = [1u8, 2, 3, 4];
        assert_eq!(FcLcb { fc: 1, lcb: 2 }.slice(&stream, "clx").unwrap(), &[2, 3]);
        assert!(FcLcb { fc: 3, lcb: 2 }.slice(&stream, "clx").is_err());
    }
}
