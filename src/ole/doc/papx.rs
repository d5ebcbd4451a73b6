//! Paragraph table flags from the PAPX formatted disk pages.
//!
//! A paragraph mark's file offset is looked up in the bin table to find its
//! FKP page, and the page's PAPX is scanned for the in-table and
//! table-row-end sprms.

use crate::common::binary::{read_u16_le, read_u32_le};
use crate::common::error::{Error, Result};

const FKP_PAGE_SIZE: usize = 512;
const BX_PAP_SIZE: usize = 13;

/// sprmPFInTable
const SPRM_IN_TABLE: u16 = 0x2416;
/// sprmPFTtp
const SPRM_ROW_END: u16 = 0x2417;
/// sprmTDefTable
const SPRM_TABLE_DEFINITION: u16 = 0xD608;
/// sprmPChgTabs
const SPRM_CHANGE_TABS: u16 = 0xC615;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ParagraphFlags {
    pub(crate) in_table: bool,
    pub(crate) row_end: bool,
}

#[derive(Debug, Clone, Copy)]
struct FlagRun {
    fc_start: u32,
    fc_end: u32,
    flags: ParagraphFlags,
}

/// Table flags for every paragraph run of the document.
#[derive(Debug, Clone, Default)]
pub(crate) struct PapxIndex {
    runs: Vec<FlagRun>,
}

impl PapxIndex {
    /// Read the PlcBtePapx bin table and every FKP page it names.
    pub(crate) fn parse(word_document: &[u8], plcf: &[u8]) -> Result<Self> {
        if plcf.len() < 4 || (plcf.len() - 4) % 8 != 0 {
            return Err(Error::CorruptedFile(format!("bad PAPX bin table size {}", plcf.len())));
        }
        let pages = (plcf.len() - 4) / 8;
        let mut runs = Vec::new();
        for i in 0..pages {
            let pn = (read_u32_le(plcf, 4 * (pages + 1) + i * 4)? & 0x003F_FFFF) as usize;
            let page = word_document
                .get(pn * FKP_PAGE_SIZE..(pn + 1) * FKP_PAGE_SIZE)
                .ok_or_else(|| Error::CorruptedFile(format!("PAPX page {} out of range", pn)))?;
            read_page(page, &mut runs)?;
        }
        runs.sort_by_key(|r| r.fc_start);
        Ok(Self { runs })
    }

    /// Flags of the paragraph whose mark is at byte offset `fc`.
    pub(crate) fn flags_at(&self, fc: u32) -> ParagraphFlags {
        let index = self.runs.partition_point(|r| r.fc_end <= fc);
        match self.runs.get(index) {
            Some(run) if run.fc_start <= fc => run.flags,
            _ => ParagraphFlags::default(),
        }
    }
}

fn read_page(page: &[u8], runs: &mut Vec<FlagRun>) -> Result<()> {
    let crun = page[FKP_PAGE_SIZE - 1] as usize;
    let rgbx = 4 * (crun + 1);
    if rgbx + crun * BX_PAP_SIZE > FKP_PAGE_SIZE - 1 {
        return Err(Error::CorruptedFile(format!("PAPX page claims {} runs", crun)));
    }
    for k in 0..crun {
        let b_offset = page[rgbx + k * BX_PAP_SIZE] as usize * 2;
        let flags = if b_offset == 0 {
            ParagraphFlags::default()
        } else {
            papx_flags(&page[b_offset..])
        };
        runs.push(FlagRun {
            fc_start: read_u32_le(page, k * 4)?,
            fc_end: read_u32_le(page, (k + 1) * 4)?,
            flags,
        });
    }
    Ok(())
}

/// Scan a PapxInFkp for the table sprms.
fn papx_flags(data: &[u8]) -> ParagraphFlags {
    let (start, len) = match data.first() {
        Some(0) => (2, data.get(1).map_or(0, |&b| b as usize * 2)),
        Some(&cb) => (1, cb as usize * 2 - 1),
        None => return ParagraphFlags::default(),
    };
    let end = (start + len).min(data.len());
    // Skip the style index
    let grpprl = data.get(start + 2..end).unwrap_or_default();

    let mut flags = ParagraphFlags::default();
    let mut offset = 0;
    while let Ok(opcode) = read_u16_le(grpprl, offset) {
        offset += 2;
        let Some(size) = operand_size(opcode, grpprl, offset) else {
            break;
        };
        let operand = grpprl.get(offset).copied().unwrap_or(0);
        match opcode {
            SPRM_IN_TABLE => flags.in_table = operand != 0,
            SPRM_ROW_END => flags.row_end = operand != 0,
            _ => {},
        }
        offset += size;
    }
    flags
}

/// Operand length in bytes, from the size code in the opcode's top bits.
fn operand_size(opcode: u16, grpprl: &[u8], offset: usize) -> Option<usize> {
    match opcode >> 13 {
        0 | 1 => Some(1),
        2 | 4 | 5 => Some(2),
        3 => Some(4),
        7 => Some(3),
        _ => match opcode {
            SPRM_TABLE_DEFINITION => read_u16_le(grpprl, offset).ok().map(|cb| cb as usize + 1),
            SPRM_CHANGE_TABS => grpprl.get(offset).map(|&cb| cb as usize + 1),
            _ => grpprl.get(offset).map(|&cb| cb as usize + 1),
        },
    }
}


#[cfg(test)]
impl PapxIndex {
    /// Index from `(fc_start, fc_end, in_table, row_end)` runs.
    pub(crate) fn from_flags(runs: &[(u32, u32, bool, bool)]) -> Self {
        Self {
            runs: runs
                .iter()
                .map(|&(fc_start, fc_end, in_table, row_end)| FlagRun {
                    fc_start,
                    fc_end,
                    flags: ParagraphFlags { in_table, row_end },
                })
                .collect(),
        }
    }
}
