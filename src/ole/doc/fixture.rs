//! Word 97-2003 files for tests.
//!
//! Builds a `WordDocument` stream holding a FIB, one PAPX page and the text
//! as a single UTF-16 piece, plus a `1Table` stream with the Clx and the
//! PAPX bin table.

use super::fib::FcLcb;
use crate::ole::builder::CompoundFileBuilder;

const FIB_SIZE: usize = 1024;
const PAPX_PAGE: u32 = 2;
const TEXT_FC: u32 = 1536;

/// How a paragraph of fixture text ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mark {
    Paragraph,
    /// Paragraph inside a cell that is not the cell's last
    TableParagraph,
    Cell,
    RowEnd,
}

/// A FIB with the given text length and table stream pointers.
pub(crate) fn fib(ccp_text: u32, clx: FcLcb, plcf_bte_papx: FcLcb) -> Vec<u8> {
    let mut fib = vec![0u8; FIB_SIZE];
    put_u16(&mut fib, 0, 0xA5EC);
    put_u16(&mut fib, 2, 0x00C1);
    put_u16(&mut fib, 0x0A, 0x0200);
    put_u16(&mut fib, 32, 14);
    put_u16(&mut fib, 62, 22);
    put_u32(&mut fib, 76, ccp_text);
    put_u16(&mut fib, 152, 93);
    put_u32(&mut fib, 154 + 13 * 8, plcf_bte_papx.fc);
    put_u32(&mut fib, 158 + 13 * 8, plcf_bte_papx.lcb);
    put_u32(&mut fib, 154 + 33 * 8, clx.fc);
    put_u32(&mut fib, 158 + 33 * 8, clx.lcb);
    fib
}

/// A complete .doc file with one paragraph per entry.
pub(crate) fn word_file(paragraphs: &[(&str, Mark)]) -> Vec<u8> {
    let mut text = String::new();
    let mut runs = Vec::new();
    for (content, mark) in paragraphs {
        let start = text.encode_utf16().count() as u32;
        text.push_str(content);
        text.push(if matches!(mark, Mark::Paragraph | Mark::TableParagraph) { '\r' } else { '\u{07}' });
        let end = text.encode_utf16().count() as u32;
        runs.push((TEXT_FC + start * 2, TEXT_FC + end * 2, *mark));
    }
    let ccp = text.encode_utf16().count() as u32;

    // Table stream: Prc, Pcdt with one piece, then the PAPX bin table
    let mut table = vec![0x01, 2, 0, 0xAA, 0xBB, 0x02];
    table.extend_from_slice(&16u32.to_le_bytes());
    table.extend_from_slice(&0u32.to_le_bytes());
    table.extend_from_slice(&ccp.to_le_bytes());
    table.extend_from_slice(&0u16.to_le_bytes());
    table.extend_from_slice(&TEXT_FC.to_le_bytes());
    table.extend_from_slice(&0u16.to_le_bytes());
    let clx = FcLcb {
        fc: 0,
        lcb: table.len() as u32,
    };
    let papx = FcLcb {
        fc: table.len() as u32,
        lcb: 12,
    };
    table.extend_from_slice(&TEXT_FC.to_le_bytes());
    table.extend_from_slice(&(TEXT_FC + ccp * 2).to_le_bytes());
    table.extend_from_slice(&PAPX_PAGE.to_le_bytes());

    let mut word = fib(ccp, clx, papx);
    word.extend_from_slice(&papx_page(&runs));
    for unit in text.encode_utf16() {
        word.extend_from_slice(&unit.to_le_bytes());
    }

    CompoundFileBuilder::new()
        .stream("WordDocument", word)
        .stream("1Table", table)
        .build()
}

fn papx_page(runs: &[(u32, u32, Mark)]) -> Vec<u8> {
    // In-table PAPX (short form) at 480, row-end PAPX (long form) at 490
    const IN_TABLE: usize = 480;
    const ROW_END: usize = 490;
    let mut page = vec![0u8; 512];
    assert!(4 * (runs.len() + 1) + 13 * runs.len() < IN_TABLE);

    for (k, (start, end, mark)) in runs.iter().enumerate() {
        put_u32(&mut page, k * 4, *start);
        put_u32(&mut page, (k + 1) * 4, *end);
        let bx = 4 * (runs.len() + 1) + 13 * k;
        page[bx] = match mark {
            Mark::Paragraph => 0,
            Mark::TableParagraph | Mark::Cell => (IN_TABLE / 2) as u8,
            Mark::RowEnd => (ROW_END / 2) as u8,
        };
    }
    page[IN_TABLE..IN_TABLE + 6].copy_from_slice(&[3, 0, 0, 0x16, 0x24, 1]);
    page[ROW_END..ROW_END + 10].copy_from_slice(&[0, 4, 0, 0, 0x16, 0x24, 1, 0x17, 0x24, 1]);
    page[511] = runs.len() as u8;
    page
}

fn put_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}
