use super::consts::*;
use std::io::{self, Read, Seek, SeekFrom};
use zerocopy::{FromBytes, LE, U16, U32, U64};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// Raw OLE directory entry structure (128 bytes)
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
#[allow(dead_code)]
struct RawDirectoryEntry {
    /// Entry name in UTF-16LE (64 bytes, null-padded)
    name: [u8; 64],
    /// Length of name in bytes (including null terminator)
    name_len: U16<LE>,
    /// Entry type (1 = storage, 2 = stream, 5 = root)
    entry_type: u8,
    /// Node color (0 = red, 1 = black)
    node_color: u8,
    sid_left: U32<LE>,
    sid_right: U32<LE>,
    sid_child: U32<LE>,
    clsid: [u8; 16],
    state_bits: U32<LE>,
    creation_time: U64<LE>,
    modified_time: U64<LE>,
    start_sector: U32<LE>,
    stream_size: U64<LE>,
}

/// Read-only view of an OLE2 structured storage file.
///
/// Only what the legacy Word and Excel readers need is exposed: stream
/// lookup by path and whole-stream reads.
#[derive(Debug)]
pub struct OleFile<R: Read + Seek> {
    reader: R,
    /// Sector size (512 or 4096 bytes)
    sector_size: usize,
    /// Mini sector size (typically 64 bytes)
    mini_sector_size: usize,
    /// Streams smaller than this live in the mini stream
    mini_stream_cutoff: u32,
    /// File Allocation Table, maps sector to next sector in chain
    fat: Vec<u32>,
    /// Mini FAT, for streams smaller than the cutoff
    minifat: Vec<u32>,
    first_dir_sector: u32,
    root: Option<DirectoryEntry>,
    /// All directory entries indexed by SID
    dir_entries: Vec<Option<DirectoryEntry>>,
    /// Mini stream data, loaded on first small-stream read
    ministream: Option<Vec<u8>>,
}

/// A stream or storage entry of the directory tree.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    /// Storage ID (index in directory)
    pub sid: u32,
    /// Entry name
    pub name: String,
    /// Entry type (stream, storage, root)
    pub entry_type: u8,
    pub sid_left: u32,
    pub sid_right: u32,
    pub sid_child: u32,
    /// First sector of the stream
    pub start_sector: u32,
    /// Size of the stream in bytes
    pub size: u64,
    /// Whether this stream is stored in the mini stream
    pub is_minifat: bool,
}

/// Error types for OLE file parsing
#[derive(Debug)]
pub enum OleError {
    Io(io::Error),
    InvalidFormat(String),
    InvalidData(String),
    NotOleFile,
    CorruptedFile(String),
    StreamNotFound(String),
}

impl From<io::Error> for OleError {
    fn from(err: io::Error) -> Self {
        OleError::Io(err)
    }
}

impl From<crate::common::binary::BinaryError> for OleError {
    fn from(err: crate::common::binary::BinaryError) -> Self {
        OleError::InvalidData(err.to_string())
    }
}

impl std::fmt::Display for OleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OleError::Io(e) => write!(f, "IO error: {}", e),
            OleError::InvalidFormat(s) => write!(f, "Invalid format: {}", s),
            OleError::InvalidData(s) => write!(f, "Invalid data: {}", s),
            OleError::NotOleFile => write!(f, "Not an OLE file"),
            OleError::CorruptedFile(s) => write!(f, "Corrupted file: {}", s),
            OleError::StreamNotFound(s) => write!(f, "Stream not found: {}", s),
        }
    }
}

impl std::error::Error for OleError {}

#[inline]
fn u16_at(data: &[u8], offset: usize) -> u16 {
    data.get(offset..offset + 2)
        .and_then(|b| U16::<LE>::read_from_bytes(b).ok())
        .map(|v| v.get())
        .unwrap_or(0)
}

#[inline]
fn u32_at(data: &[u8], offset: usize) -> u32 {
    data.get(offset..offset + 4)
        .and_then(|b| U32::<LE>::read_from_bytes(b).ok())
        .map(|v| v.get())
        .unwrap_or(0)
}

impl<R: Read + Seek> OleFile<R> {
    /// Open and parse a compound file from a reader.
    pub fn open(mut reader: R) -> Result<Self, OleError> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        if file_size < MINIMAL_OLEFILE_SIZE as u64 {
            return Err(OleError::NotOleFile);
        }

        let mut header = [0u8; 512];
        reader.read_exact(&mut header)?;
        if &header[0..8] != MAGIC {
            return Err(OleError::NotOleFile);
        }

        let dll_version = u16_at(&header, 0x1A);
        let byte_order = u16_at(&header, 0x1C);
        let sector_shift = u16_at(&header, 0x1E);
        let mini_sector_shift = u16_at(&header, 0x20);
        let first_dir_sector = u32_at(&header, 0x30);
        let mini_stream_cutoff = u32_at(&header, 0x38);
        let first_minifat_sector = u32_at(&header, 0x3C);
        let num_minifat_sectors = u32_at(&header, 0x40);
        let first_difat_sector = u32_at(&header, 0x44);
        let num_difat_sectors = u32_at(&header, 0x48);

        if byte_order != 0xFFFE {
            return Err(OleError::InvalidFormat("Invalid byte order".to_string()));
        }
        if !(7..=16).contains(&sector_shift) || mini_sector_shift > sector_shift {
            return Err(OleError::InvalidFormat("Invalid sector shift".to_string()));
        }

        let sector_size = 1usize << sector_shift;
        let mini_sector_size = 1usize << mini_sector_shift;
        if (dll_version == 3 && sector_size != 512) || (dll_version == 4 && sector_size != 4096) {
            return Err(OleError::InvalidFormat("Sector size mismatch".to_string()));
        }

        let mut ole = OleFile {
            reader,
            sector_size,
            mini_sector_size,
            mini_stream_cutoff,
            fat: Vec::new(),
            minifat: Vec::new(),
            first_dir_sector,
            root: None,
            dir_entries: Vec::new(),
            ministream: None,
        };

        ole.load_fat(&header, first_difat_sector, num_difat_sectors)?;
        ole.load_directory()?;
        if num_minifat_sectors > 0 {
            ole.load_minifat(first_minifat_sector)?;
        }

        Ok(ole)
    }

    /// Load the FAT. The first 109 FAT sector indexes sit in the header,
    /// the rest in the DIFAT chain.
    fn load_fat(
        &mut self,
        header: &[u8; 512],
        first_difat_sector: u32,
        num_difat_sectors: u32,
    ) -> Result<(), OleError> {
        let mut fat_sectors = Vec::new();
        for i in 0..109 {
            let sector = u32_at(header, 0x4C + i * 4);
            if sector == FREESECT || sector == ENDOFCHAIN {
                break;
            }
            fat_sectors.push(sector);
        }

        let mut difat_sector = first_difat_sector;
        let entries_per_sector = (self.sector_size / 4) - 1;
        for _ in 0..num_difat_sectors {
            if difat_sector == ENDOFCHAIN || difat_sector == FREESECT {
                break;
            }
            let sector_data = self.read_sector(difat_sector)?;
            for i in 0..entries_per_sector {
                let sector = u32_at(&sector_data, i * 4);
                if sector == FREESECT || sector == ENDOFCHAIN {
                    break;
                }
                fat_sectors.push(sector);
            }
            difat_sector = u32_at(&sector_data, entries_per_sector * 4);
        }

        let entries_per_sector = self.sector_size / 4;
        self.fat.reserve(fat_sectors.len() * entries_per_sector);
        for &sector_id in &fat_sectors {
            let sector_data = self.read_sector(sector_id)?;
            self.fat
                .extend((0..entries_per_sector).map(|i| u32_at(&sector_data, i * 4)));
        }

        Ok(())
    }

    fn load_minifat(&mut self, first_minifat_sector: u32) -> Result<(), OleError> {
        let minifat_data = self.read_stream_from_fat(first_minifat_sector)?;
        self.minifat = minifat_data
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(())
    }

    fn load_directory(&mut self) -> Result<(), OleError> {
        let dir_data = self.read_stream_from_fat(self.first_dir_sector)?;
        let num_entries = dir_data.len() / DIRENTRY_SIZE;
        self.dir_entries = vec![None; num_entries];

        if num_entries > 0 {
            let root = self.parse_directory_entry(&dir_data[0..DIRENTRY_SIZE], 0)?;
            let root_child_sid = root.sid_child;
            self.root = Some(root);
            self.build_storage_tree(root_child_sid, &dir_data, 0)?;
        }

        Ok(())
    }

    fn parse_directory_entry(&self, data: &[u8], sid: u32) -> Result<DirectoryEntry, OleError> {
        let raw = RawDirectoryEntry::read_from_bytes(data)
            .map_err(|_| OleError::InvalidFormat("Failed to parse directory entry".to_string()))?;

        let name_len = (raw.name_len.get() as usize).saturating_sub(2).min(64);
        let name = decode_utf16le(&raw.name[..name_len]);

        // 512-byte sector files only use the low 32 bits of the size
        let size = if self.sector_size == 512 {
            raw.stream_size.get() & 0xFFFF_FFFF
        } else {
            raw.stream_size.get()
        };
        let is_minifat = size < self.mini_stream_cutoff as u64 && raw.entry_type == STGTY_STREAM;

        Ok(DirectoryEntry {
            sid,
            name,
            entry_type: raw.entry_type,
            sid_left: raw.sid_left.get(),
            sid_right: raw.sid_right.get(),
            sid_child: raw.sid_child.get(),
            start_sector: raw.start_sector.get(),
            size,
            is_minifat,
        })
    }

    fn build_storage_tree(
        &mut self,
        sid: u32,
        dir_data: &[u8],
        depth: usize,
    ) -> Result<(), OleError> {
        if sid == NOSTREAM {
            return Ok(());
        }
        let index = sid as usize;
        if index >= self.dir_entries.len() || depth > self.dir_entries.len() {
            return Err(OleError::CorruptedFile(
                "Invalid directory entry index".to_string(),
            ));
        }
        // Already visited, the tree is cyclic
        if self.dir_entries[index].is_some() {
            return Ok(());
        }

        let offset = index * DIRENTRY_SIZE;
        let entry = self.parse_directory_entry(&dir_data[offset..offset + DIRENTRY_SIZE], sid)?;
        let (left, right, child) = (entry.sid_left, entry.sid_right, entry.sid_child);
        self.dir_entries[index] = Some(entry);

        self.build_storage_tree(left, dir_data, depth + 1)?;
        self.build_storage_tree(right, dir_data, depth + 1)?;
        self.build_storage_tree(child, dir_data, depth + 1)
    }

    fn read_sector(&mut self, sector_id: u32) -> Result<Vec<u8>, OleError> {
        // Sector 0 starts right after the header
        let position = ((sector_id as u64) + 1) * (self.sector_size as u64);
        self.reader.seek(SeekFrom::Start(position))?;

        let mut buffer = vec![0u8; self.sector_size];
        self.reader.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    fn read_stream_from_fat(&mut self, start_sector: u32) -> Result<Vec<u8>, OleError> {
        let mut data = Vec::new();
        let mut sector = start_sector;
        let mut remaining = self.fat.len();

        while sector != ENDOFCHAIN {
            if sector as usize >= self.fat.len() || remaining == 0 {
                return Err(OleError::CorruptedFile(
                    "Invalid sector chain in FAT".to_string(),
                ));
            }
            data.extend_from_slice(&self.read_sector(sector)?);
            sector = self.fat[sector as usize];
            remaining -= 1;
        }

        Ok(data)
    }

    fn read_stream_from_minifat(
        &mut self,
        start_sector: u32,
        size: u64,
    ) -> Result<Vec<u8>, OleError> {
        if self.ministream.is_none() {
            let root_start = self
                .root
                .as_ref()
                .map(|r| r.start_sector)
                .ok_or_else(|| OleError::CorruptedFile("No root entry".to_string()))?;
            self.ministream = Some(self.read_stream_from_fat(root_start)?);
        }
        let ministream = self.ministream.as_deref().unwrap_or_default();

        let mut data = Vec::with_capacity(size as usize);
        let mut sector = start_sector;
        let mut remaining = self.minifat.len();

        while sector != ENDOFCHAIN {
            if sector as usize >= self.minifat.len() || remaining == 0 {
                return Err(OleError::CorruptedFile(
                    "Invalid sector chain in MiniFAT".to_string(),
                ));
            }
            let position = (sector as usize) * self.mini_sector_size;
            let chunk = ministream
                .get(position..position + self.mini_sector_size)
                .ok_or_else(|| OleError::CorruptedFile("Mini sector out of bounds".to_string()))?;
            data.extend_from_slice(chunk);
            sector = self.minifat[sector as usize];
            remaining -= 1;
        }

        data.truncate(size as usize);
        Ok(data)
    }

    /// Read the whole stream at `path`, e.g. `&["WordDocument"]`.
    pub fn open_stream(&mut self, path: &[&str]) -> Result<Vec<u8>, OleError> {
        let entry = self.find_entry(path)?;
        if entry.entry_type != STGTY_STREAM {
            return Err(OleError::InvalidFormat(format!(
                "{} is not a stream",
                path.join("/")
            )));
        }

        if entry.is_minifat {
            self.read_stream_from_minifat(entry.start_sector, entry.size)
        } else {
            let mut data = self.read_stream_from_fat(entry.start_sector)?;
            data.truncate(entry.size as usize);
            Ok(data)
        }
    }

    /// Names of the streams and storages directly under the root.
    pub fn root_entries(&self) -> Vec<&str> {
        let mut names = Vec::new();
        if let Some(root) = &self.root {
            self.collect_children(root.sid_child, &mut names, 0);
        }
        names
    }

    fn collect_children<'a>(&'a self, sid: u32, names: &mut Vec<&'a str>, depth: usize) {
        if depth > self.dir_entries.len() {
            return;
        }
        if let Some(Some(entry)) = self.dir_entries.get(sid as usize) {
            self.collect_children(entry.sid_left, names, depth + 1);
            names.push(entry.name.as_str());
            self.collect_children(entry.sid_right, names, depth + 1);
        }
    }

    fn find_entry(&self, path: &[&str]) -> Result<DirectoryEntry, OleError> {
        let not_found = || OleError::StreamNotFound(path.join("/"));
        let root = self.root.as_ref().ok_or_else(not_found)?;
        let Some((last, parents)) = path.split_last() else {
            return Ok(root.clone());
        };

        let mut current_sid = root.sid_child;
        for name in parents {
            current_sid = self
                .find_child_by_name(current_sid, name, 0)
                .ok_or_else(not_found)?
                .sid_child;
        }
        self.find_child_by_name(current_sid, last, 0)
            .cloned()
            .ok_or_else(not_found)
    }

    /// Search one sibling tree, comparing names case-insensitively.
    fn find_child_by_name(&self, sid: u32, name: &str, depth: usize) -> Option<&DirectoryEntry> {
        if depth > self.dir_entries.len() {
            return None;
        }
        let entry = self.dir_entries.get(sid as usize)?.as_ref()?;
        if entry.name.eq_ignore_ascii_case(name) {
            return Some(entry);
        }
        self.find_child_by_name(entry.sid_left, name, depth + 1)
            .or_else(|| self.find_child_by_name(entry.sid_right, name, depth + 1))
    }

    /// Check if a stream or storage exists.
    pub fn exists(&self, path: &[&str]) -> bool {
        self.find_entry(path).is_ok()
    }
}

fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16_lossy(&units)
        .trim_end_matches('\0')
        .to_string()
}

/// Check the magic bytes of an in-memory file.
pub fn is_ole_file(data: &[u8]) -> bool {
    data.len() >= MINIMAL_OLEFILE_SIZE && &data[0..8] == MAGIC
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::builder::CompoundFileBuilder;
    use std::io::Cursor;

    #[test]
    fn test_open_and_read_streams() {
        let big: Vec<u8> = (0..1500u32).map(|i| (i % 251) as u8).collect();
        let bytes = CompoundFileBuilder::new()
            .stream("WordDocument", big.clone())
            .stream("1Table", b"table".to_vec())
            .build();

        assert!(is_ole_file(&bytes));
        let mut ole = OleFile::open(Cursor::new(bytes)).unwrap();
        assert!(ole.exists(&["worddocument"]));
        assert!(!ole.exists(&["Workbook"]));
        assert_eq!(ole.open_stream(&["WordDocument"]).unwrap(), big);
        assert_eq!(ole.open_stream(&["1Table"]).unwrap(), b"table");
        assert_eq!(ole.root_entries(), vec!["WordDocument", "1Table"]);
    }

    #[test]
    fn test_missing_stream_reports_path() {
        let bytes = CompoundFileBuilder::new()
            .stream("Workbook", vec![0; 16])
            .build();
        let mut ole = OleFile::open(Cursor::new(bytes)).unwrap();
        match ole.open_stream(&["WordDocument"]) {
            Err(OleError::StreamNotFound(name)) => assert_eq!(name, "WordDocument"),
            other => panic!("unexpected result: {:?}", other.map(|d| d.len())),
        }
    }

    #[test]
    fn test_rejects_non_ole() {
        let data = vec![0u8; 2048];
        assert!(matches!(
            OleFile::open(Cursor::new(data)),
            Err(OleError::NotOleFile)
        ));
    }
}
