//! Header reservation and compaction
//!
//! The unified layout keeps its table in the blocks in front of the lowest
//! payload. When the table outgrows that space every payload is moved
//! forward by the missing number of blocks, keeping their relative order.
//! [`Archive::pack`] rebuilds the data region from scratch, laying payloads
//! out back to back in table order and dropping holes left by removals.

use super::Archive;
use super::mutate::to_block_field;
use crate::entry::blocks_to_bytes;
use crate::error::ArchiveResult;
use crate::layout::Layout;
use tracing::info;

impl Archive {
    /// Blocks every payload must move forward so a table of `count` records fits
    pub(super) fn header_shift_for(&self, count: usize) -> u64 {
        let required = self.layout.header_blocks(count);
        match self.lowest_offset() {
            Some(lowest) if u64::from(lowest) < required => required - u64::from(lowest),
            _ => 0,
        }
    }

    /// Where the next payload goes once the header holds `count` records
    pub(super) fn planned_data_end(&self, count: usize, shift: u64) -> u64 {
        if self.entries.is_empty() {
            self.layout.header_blocks(count)
        } else {
            self.data_end_offset() + shift
        }
    }

    /// Reserve header space for `count` records, moving payloads by `shift` blocks
    pub(super) fn grow_header(&mut self, count: usize, shift: u64) {
        if self.entries.is_empty() {
            self.reserved_blocks = self.layout.header_blocks(count) as u32;
            return;
        }
        if shift == 0 {
            return;
        }

        let lowest = self.lowest_offset().map_or(0, u64::from);
        let end = self.data_end_offset();
        let start_byte = blocks_to_bytes(lowest) as usize;
        let end_byte = (blocks_to_bytes(end) as usize).min(self.data.len());
        let shift_bytes = blocks_to_bytes(shift) as usize;

        self.ensure_data_blocks(end + shift);
        if end_byte > start_byte {
            self.data
                .copy_within(start_byte..end_byte, start_byte + shift_bytes);
        }
        self.data[start_byte..start_byte + shift_bytes].fill(0);

        for entry in &mut self.entries {
            // Planned end was checked against the 32-bit field by the caller
            entry.offset += shift as u32;
        }
        self.dirty = true;

        info!(
            "Header grew to {} blocks, moved {} entries forward by {} blocks",
            self.layout.header_blocks(count),
            self.entries.len(),
            shift
        );
    }

    /// Rewrite the data region without gaps
    ///
    /// Payloads are laid out contiguously in table order right after a header
    /// sized for the current entry count. Returns the new total size in
    /// blocks. An empty archive is left untouched and reports its reserved
    /// header size.
    pub fn pack(&mut self) -> ArchiveResult<u64> {
        self.ensure_writable()?;
        if self.entries.is_empty() {
            return Ok(u64::from(self.header_reserved_blocks()));
        }

        let header_blocks = self.layout.header_blocks(self.entries.len());

        let mut offsets = Vec::with_capacity(self.entries.len());
        let mut cursor = header_blocks;
        for entry in &self.entries {
            offsets.push(to_block_field(cursor, "entry offset")?);
            cursor += u64::from(entry.size);
        }
        to_block_field(cursor, "archive size")?;

        let mut packed = vec![0u8; blocks_to_bytes(cursor) as usize];
        for (entry, &offset) in self.entries.iter().zip(&offsets) {
            let payload = self.read_payload(entry)?;
            let start = blocks_to_bytes(u64::from(offset)) as usize;
            packed[start..start + payload.len()].copy_from_slice(payload);
        }

        let before = self.data.len();
        for (entry, offset) in self.entries.iter_mut().zip(offsets) {
            entry.offset = offset;
        }
        self.data = packed;
        self.rebuild_positions();
        self.reserved_blocks = header_blocks as u32;
        self.written_table_len = 0;
        self.dirty = true;

        info!(
            "Packed {} entries: {} -> {} data bytes",
            self.entries.len(),
            before,
            self.data.len()
        );

        Ok(self.total_blocks())
    }

    /// Bytes of the data buffer not referenced by any entry or the header
    pub fn wasted_bytes(&self) -> u64 {
        let header = match self.layout {
            Layout::Unified => blocks_to_bytes(self.layout.header_blocks(self.entries.len())),
            Layout::Split => 0,
        };
        let used: u64 = self.entries.iter().map(|entry| entry.size_in_bytes()).sum();
        (self.data.len() as u64).saturating_sub(header + used)
    }
}
