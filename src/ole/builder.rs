//! Minimal compound file writer for building legacy fixtures in tests.
//!
//! Produces version 3 files (512-byte sectors) with every stream in a flat
//! root storage. The mini stream cutoff is written as zero so all streams
//! live in regular sectors.

use super::consts::*;

const SECTOR: usize = 512;

#[derive(Default)]
pub(crate) struct CompoundFileBuilder {
    streams: Vec<(String, Vec<u8>)>,
}

impl CompoundFileBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn stream(mut self, name: &str, data: Vec<u8>) -> Self {
        self.streams.push((name.to_string(), data));
        self
    }

    pub(crate) fn build(self) -> Vec<u8> {
        let dir_entries = self.streams.len() + 1;
        let dir_sectors = dir_entries.div_ceil(SECTOR / DIRENTRY_SIZE);
        let stream_sectors: Vec<usize> = self
            .streams
            .iter()
            .map(|(_, data)| data.len().div_ceil(SECTOR).max(1))
            .collect();
        let total_sectors = 1 + dir_sectors + stream_sectors.iter().sum::<usize>();
        assert!(total_sectors <= SECTOR / 4, "fixture too large for one FAT sector");

        // FAT: sector 0 is the FAT itself, then the directory, then streams
        let mut fat = vec![FREESECT; SECTOR / 4];
        fat[0] = FATSECT;
        let mut next = 1usize;
        let mut chain = |len: usize, fat: &mut Vec<u32>| {
            let start = next;
            for i in 0..len {
                fat[start + i] = if i + 1 == len {
                    ENDOFCHAIN
                } else {
                    (start + i + 1) as u32
                };
            }
            next += len;
            start as u32
        };
        let dir_start = chain(dir_sectors, &mut fat);
        let starts: Vec<u32> = stream_sectors.iter().map(|&n| chain(n, &mut fat)).collect();

        let mut out = vec![0u8; SECTOR];
        out[0..8].copy_from_slice(MAGIC);
        put_u16(&mut out, 0x18, 0x003E);
        put_u16(&mut out, 0x1A, 3);
        put_u16(&mut out, 0x1C, 0xFFFE);
        put_u16(&mut out, 0x1E, 9);
        put_u16(&mut out, 0x20, 6);
        put_u32(&mut out, 0x2C, 1);
        put_u32(&mut out, 0x30, dir_start);
        put_u32(&mut out, 0x38, 0);
        put_u32(&mut out, 0x3C, ENDOFCHAIN);
        put_u32(&mut out, 0x44, ENDOFCHAIN);
        put_u32(&mut out, 0x4C, 0);
        for i in 1..109 {
            put_u32(&mut out, 0x4C + i * 4, FREESECT);
        }

        for entry in &fat {
            out.extend_from_slice(&entry.to_le_bytes());
        }

        let mut dir = vec![0u8; dir_sectors * SECTOR];
        let child = if self.streams.is_empty() { NOSTREAM } else { 1 };
        write_entry(&mut dir[0..DIRENTRY_SIZE], "Root Entry", STGTY_ROOT, NOSTREAM, child, ENDOFCHAIN, 0);
        for (i, (name, data)) in self.streams.iter().enumerate() {
            let sid = i + 1;
            let right = if sid < self.streams.len() { (sid + 1) as u32 } else { NOSTREAM };
            let offset = sid * DIRENTRY_SIZE;
            write_entry(
                &mut dir[offset..offset + DIRENTRY_SIZE],
                name,
                STGTY_STREAM,
                right,
                NOSTREAM,
                starts[i],
                data.len() as u64,
            );
        }
        // Unused directory slots
        for sid in dir_entries..dir_sectors * (SECTOR / DIRENTRY_SIZE) {
            let offset = sid * DIRENTRY_SIZE;
            put_u32(&mut dir, offset + 0x44, NOSTREAM);
            put_u32(&mut dir, offset + 0x48, NOSTREAM);
            put_u32(&mut dir, offset + 0x4C, NOSTREAM);
        }
        out.extend_from_slice(&dir);

        for ((_, data), sectors) in self.streams.iter().zip(&stream_sectors) {
            let mut padded = data.clone();
            padded.resize(sectors * SECTOR, 0);
            out.extend_from_slice(&padded);
        }
        out
    }
}

fn write_entry(
    slot: &mut [u8],
    name: &str,
    entry_type: u8,
    right: u32,
    child: u32,
    start: u32,
    size: u64,
) {
    let units: Vec<u16> = name.encode_utf16().take(31).collect();
    for (i, unit) in units.iter().enumerate() {
        put_u16(slot, i * 2, *unit);
    }
    put_u16(slot, 0x40, ((units.len() + 1) * 2) as u16);
    slot[0x42] = entry_type;
    slot[0x43] = 1;
    put_u32(slot, 0x44, NOSTREAM);
    put_u32(slot, 0x48, right);
    put_u32(slot, 0x4C, child);
    put_u32(slot, 0x74, start);
    slot[0x78..0x80].copy_from_slice(&size.to_le_bytes());
}

fn put_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}
