//! Binary codec for the archive header and entry table
//!
//! Both layouts share the 32-byte entry record:
//!
//! ```text
//! offset: u32 LE (blocks) | size: u32 LE (blocks) | name: 24 bytes NUL-padded
//! ```
//!
//! The unified layout prefixes the table with a `VER2` tag and a
//! little-endian entry count. The split layout stores bare records in the
//! index buffer, the count being implied by its length.

use crate::constants::{NAME_FIELD_SIZE, RECORD_SIZE, UNIFIED_HEADER_SIZE, VER2_MAGIC};
use crate::entry::Entry;
use crate::error::{ArchiveError, ArchiveResult};
use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};

/// Unified layout header
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct UnifiedHeader {
    /// Magic tag, always "VER2"
    #[br(assert(magic == VER2_MAGIC, "Invalid archive magic: expected 'VER2', got {:?}", magic))]
    pub magic: [u8; 4],

    /// Number of records following the header
    pub entry_count: u32,
}

impl UnifiedHeader {
    /// Create a header for `entry_count` records
    pub fn new(entry_count: u32) -> Self {
        Self {
            magic: VER2_MAGIC,
            entry_count,
        }
    }
}

/// One 32-byte table record
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct EntryRecord {
    /// Payload offset in blocks
    pub offset: u32,
    /// Payload size in blocks
    pub size: u32,
    /// NUL-padded name field
    pub name: [u8; NAME_FIELD_SIZE],
}

impl From<&Entry> for EntryRecord {
    fn from(entry: &Entry) -> Self {
        Self {
            offset: entry.offset,
            size: entry.size,
            name: *entry.name_field(),
        }
    }
}

impl From<EntryRecord> for Entry {
    fn from(record: EntryRecord) -> Self {
        Self::from_raw(record.offset, record.size, record.name)
    }
}

/// Read the 8-byte unified header at the start of `data`
pub fn read_unified_header(data: &[u8]) -> ArchiveResult<UnifiedHeader> {
    if data.len() < UNIFIED_HEADER_SIZE {
        return Err(ArchiveError::MalformedHeader(format!(
            "header needs {UNIFIED_HEADER_SIZE} bytes, buffer holds {}",
            data.len()
        )));
    }
    Ok(UnifiedHeader::read(&mut Cursor::new(data))?)
}

/// Read up to `limit` whole records from `data`
///
/// Reading stops at the first incomplete record, so a trailing partial
/// record is ignored.
pub fn read_records(data: &[u8], limit: usize) -> ArchiveResult<Vec<EntryRecord>> {
    let count = limit.min(data.len() / RECORD_SIZE);
    let mut cursor = Cursor::new(data);
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        records.push(EntryRecord::read(&mut cursor)?);
    }
    Ok(records)
}

/// Encode the entry table as bare records (split index layout)
pub fn encode_records(entries: &[Entry]) -> ArchiveResult<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::with_capacity(entries.len() * RECORD_SIZE));
    for entry in entries {
        EntryRecord::from(entry).write(&mut cursor)?;
    }
    Ok(cursor.into_inner())
}

/// Encode the `VER2` tag, entry count and records (unified layout)
pub fn encode_unified_header(entries: &[Entry]) -> ArchiveResult<Vec<u8>> {
    let count = u32::try_from(entries.len()).map_err(|_| {
        ArchiveError::DuplicateReservation(format!("{} entries exceed the count field", entries.len()))
    })?;

    let mut cursor = Cursor::new(Vec::with_capacity(
        UNIFIED_HEADER_SIZE + entries.len() * RECORD_SIZE,
    ));
    UnifiedHeader::new(count).write(&mut cursor)?;
    for entry in entries {
        EntryRecord::from(entry).write(&mut cursor)?;
    }
    Ok(cursor.into_inner())
}
