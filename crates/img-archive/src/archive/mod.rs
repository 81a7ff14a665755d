//! In-memory archive: parsing, queries and serialization
//!
//! An [`Archive`] owns its byte buffers, the ordered entry table and a
//! lowercase-name index into that table. Mutations edit all three in memory
//! and mark the archive dirty; [`Archive::sync`] writes the table back into
//! the buffers.
//!
//! ```text
//! Unified:  [VER2][count][record * count][pad] [payload] [payload] ...
//!           '------ header_reserved_blocks ---'
//!
//! Split:    index: [record * count]
//!           data:  [payload] [payload] ...
//! ```
//!
//! # Example
//!
//! ```rust
//! use img_archive::{Archive, Layout};
//!
//! let mut archive = Archive::create(Layout::Unified);
//! archive.add("player.dff", b"model data")?;
//! archive.sync()?;
//!
//! let reopened = Archive::parse(archive.data().to_vec(), None)?;
//! let entry = reopened.lookup("PLAYER.DFF").expect("entry exists");
//! assert_eq!(&reopened.read_payload(entry)?[..10], b"model data");
//! # Ok::<(), img_archive::ArchiveError>(())
//! ```

mod mutate;
mod pack;

use crate::constants::{BLOCK_SIZE, UNIFIED_HEADER_SIZE, VER2_MAGIC};
use crate::entry::{Entry, blocks_for, blocks_to_bytes, lookup_key};
use crate::error::{ArchiveError, ArchiveResult};
use crate::header::{encode_records, encode_unified_header, read_records, read_unified_header};
use crate::layout::{AccessMode, ArchiveOptions, Layout};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// Raw buffers handed back to the caller for writing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveBuffers {
    /// Unified file, or the payload file of a split pair
    pub data: Vec<u8>,
    /// Index file of a split pair
    pub index: Option<Vec<u8>>,
}

/// Block archive held in memory
pub struct Archive {
    layout: Layout,
    mode: AccessMode,
    data: Vec<u8>,
    index: Option<Vec<u8>>,
    entries: Vec<Entry>,
    positions: HashMap<String, usize>,
    /// Header blocks reserved while the table is empty
    reserved_blocks: u32,
    /// Length of the table bytes last written to the front of `data`
    written_table_len: usize,
    dirty: bool,
}

impl Archive {
    /// Create an empty archive
    ///
    /// The unified layout starts as an 8-byte buffer holding the tag and a
    /// zero count; the split layout starts with two empty buffers.
    pub fn create(layout: Layout) -> Self {
        let (data, index, written_table_len) = match layout {
            Layout::Unified => {
                let mut data = Vec::with_capacity(UNIFIED_HEADER_SIZE);
                data.extend_from_slice(&VER2_MAGIC);
                data.extend_from_slice(&0u32.to_le_bytes());
                (data, None, UNIFIED_HEADER_SIZE)
            }
            Layout::Split => (Vec::new(), Some(Vec::new()), 0),
        };

        Self {
            layout,
            mode: AccessMode::ReadWrite,
            data,
            index,
            entries: Vec::new(),
            positions: HashMap::new(),
            reserved_blocks: layout.header_blocks(0) as u32,
            written_table_len,
            dirty: false,
        }
    }

    /// Parse an archive with default options
    ///
    /// `index` is the separate index buffer of a split pair. It is ignored
    /// when `data` starts with a `VER2` tag.
    pub fn parse(data: Vec<u8>, index: Option<Vec<u8>>) -> ArchiveResult<Self> {
        Self::parse_with_options(data, index, ArchiveOptions::default())
    }

    /// Parse an archive with explicit options
    pub fn parse_with_options(
        data: Vec<u8>,
        index: Option<Vec<u8>>,
        options: ArchiveOptions,
    ) -> ArchiveResult<Self> {
        let layout = Layout::guess(&data);

        let (entries, index, written_table_len) = match layout {
            Layout::Unified => {
                let entries = Self::read_unified_table(&data, options.strict)?;
                let written = layout.table_size(entries.len()) as usize;
                (entries, None, written.min(data.len()))
            }
            Layout::Split => {
                let entries = match &index {
                    Some(index) => read_records(index, usize::MAX)?
                        .into_iter()
                        .map(Entry::from)
                        .collect(),
                    None => {
                        debug!("No index buffer supplied, archive has no entries");
                        Vec::new()
                    }
                };
                (entries, Some(index.unwrap_or_default()), 0)
            }
        };

        let mut archive = Self {
            layout,
            mode: options.mode,
            data,
            index,
            entries,
            positions: HashMap::new(),
            reserved_blocks: layout.header_blocks(0) as u32,
            written_table_len,
            dirty: false,
        };
        archive.normalize_order();
        archive.rebuild_positions();

        debug!(
            "Parsed {} archive: {} entries, {} data bytes",
            layout,
            archive.entries.len(),
            archive.data.len()
        );

        Ok(archive)
    }

    fn read_unified_table(data: &[u8], strict: bool) -> ArchiveResult<Vec<Entry>> {
        let header = match read_unified_header(data) {
            Ok(header) => header,
            Err(e) if !strict => {
                warn!("Treating archive as empty: {e}");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let declared = header.entry_count as usize;
        let table = &data[UNIFIED_HEADER_SIZE..];
        let records = read_records(table, declared)?;

        if records.len() < declared {
            let message = format!(
                "header declares {declared} entries, buffer holds {}",
                records.len()
            );
            if strict {
                return Err(ArchiveError::MalformedHeader(message));
            }
            warn!("Truncated entry table: {message}");
        }

        Ok(records.into_iter().map(Entry::from).collect())
    }

    /// Stable-sort the table by offset if any entry precedes its predecessor
    fn normalize_order(&mut self) {
        let sorted = self
            .entries
            .windows(2)
            .all(|pair| pair[0].offset <= pair[1].offset);
        if !sorted {
            warn!("Entry table is not ordered by offset, sorting");
            self.entries.sort_by_key(|entry| entry.offset);
        }
    }

    /// Rebuild the name index from the table
    fn rebuild_positions(&mut self) {
        self.positions.clear();
        self.positions.reserve(self.entries.len());
        for (position, entry) in self.entries.iter().enumerate() {
            if self.positions.insert(entry.key(), position).is_some() {
                warn!("Duplicate entry name '{}', later entry wins", entry.name());
            }
        }
    }

    /// Layout of this archive
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Access mode of this archive
    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Entries in table order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the archive has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if in-memory state differs from the last serialized form
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Data buffer: the whole unified file, or the split payload file
    ///
    /// The table is only current after [`Archive::sync`].
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Index buffer of a split archive
    pub fn index_data(&self) -> Option<&[u8]> {
        self.index.as_deref()
    }

    /// Consume the archive and return its buffers
    pub fn into_buffers(self) -> ArchiveBuffers {
        ArchiveBuffers {
            data: self.data,
            index: self.index,
        }
    }

    /// Find an entry by name, ignoring case
    pub fn lookup(&self, name: &str) -> Option<&Entry> {
        self.position(name).map(|position| &self.entries[position])
    }

    /// Check if an entry exists, ignoring case
    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(&lookup_key(name))
    }

    /// Table position of an entry, ignoring case
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(&lookup_key(name)).copied()
    }

    /// Entries whose name contains `pattern`, ignoring case
    pub fn find<'a>(&'a self, pattern: &str) -> impl Iterator<Item = &'a Entry> + use<'a> {
        let pattern = lookup_key(pattern);
        self.entries
            .iter()
            .filter(move |entry| entry.key().contains(&pattern))
    }

    /// Block-padded payload of an entry
    pub fn read_payload(&self, entry: &Entry) -> ArchiveResult<&[u8]> {
        let range = entry.byte_range();
        if range.end > self.data.len() as u64 {
            return Err(ArchiveError::OutOfBounds {
                start: range.start,
                end: range.end,
                len: self.data.len() as u64,
            });
        }
        Ok(&self.data[range.start as usize..range.end as usize])
    }

    /// Block-padded payload of the named entry, if present
    pub fn read_payload_by_name(&self, name: &str) -> ArchiveResult<Option<&[u8]>> {
        self.lookup(name)
            .map(|entry| self.read_payload(entry))
            .transpose()
    }

    /// Every entry with its payload, in table order
    pub fn payloads(&self) -> impl Iterator<Item = ArchiveResult<(&Entry, &[u8])>> {
        self.entries
            .iter()
            .map(|entry| self.read_payload(entry).map(|payload| (entry, payload)))
    }

    /// Blocks in front of the first payload reserved for the header
    ///
    /// Unified archives reserve up to the lowest entry offset, or a minimum
    /// of one block while empty. Split archives keep their table outside the
    /// data buffer and reserve nothing.
    pub fn header_reserved_blocks(&self) -> u32 {
        match self.layout {
            Layout::Split => 0,
            Layout::Unified => self
                .lowest_offset()
                .unwrap_or(self.reserved_blocks),
        }
    }

    /// First block after the last payload
    pub fn data_end_offset(&self) -> u64 {
        self.entries
            .iter()
            .map(Entry::end_block)
            .max()
            .unwrap_or_else(|| u64::from(self.header_reserved_blocks()))
    }

    /// Total archive size in blocks, counting a split index file
    pub fn total_blocks(&self) -> u64 {
        match self.layout {
            Layout::Unified => self.data_end_offset(),
            Layout::Split => {
                self.data_end_offset() + blocks_for(self.layout.table_size(self.entries.len()))
            }
        }
    }

    fn lowest_offset(&self) -> Option<u32> {
        self.entries.iter().map(|entry| entry.offset).min()
    }

    /// Grow the data buffer to at least `blocks` blocks, keeping its contents
    fn ensure_data_blocks(&mut self, blocks: u64) {
        let target = blocks_to_bytes(blocks) as usize;
        if self.data.len() < target {
            self.data.resize(target, 0);
        }
    }

    fn ensure_writable(&self) -> ArchiveResult<()> {
        if self.mode.is_writable() {
            Ok(())
        } else {
            Err(ArchiveError::ReadOnly)
        }
    }

    /// Write the entry table back into the buffers and clear the dirty flag
    ///
    /// Does nothing on a read-only archive.
    pub fn sync(&mut self) -> ArchiveResult<()> {
        if !self.mode.is_writable() {
            debug!("Skipping sync of read-only archive");
            return Ok(());
        }

        match self.layout {
            Layout::Unified => self.sync_unified()?,
            Layout::Split => {
                self.index = Some(encode_records(&self.entries)?);
            }
        }

        debug!("Synced {} entries", self.entries.len());
        self.dirty = false;
        Ok(())
    }

    fn sync_unified(&mut self) -> ArchiveResult<()> {
        let header = encode_unified_header(&self.entries)?;

        if self.data.len() < header.len() {
            self.ensure_data_blocks(blocks_for(header.len() as u64));
        }
        self.data[..header.len()].copy_from_slice(&header);

        // Clear records left over from a longer table, without reaching payloads
        let payload_start = self
            .lowest_offset()
            .map_or(self.data.len(), |offset| offset as usize * BLOCK_SIZE);
        let stale_end = self.written_table_len.min(payload_start).min(self.data.len());
        if stale_end > header.len() {
            self.data[header.len()..stale_end].fill(0);
        }

        self.written_table_len = header.len();
        Ok(())
    }
}

impl fmt::Debug for Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archive")
            .field("layout", &self.layout)
            .field("mode", &self.mode)
            .field("entries", &self.entries.len())
            .field("data_len", &self.data.len())
            .field("index_len", &self.index.as_ref().map(Vec::len))
            .field("header_reserved_blocks", &self.header_reserved_blocks())
            .field("dirty", &self.dirty)
            .finish()
    }
}
