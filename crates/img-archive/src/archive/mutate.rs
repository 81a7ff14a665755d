//! Table edits: add, overwrite, remove, rename and replace

use super::Archive;
use crate::entry::{Entry, blocks_for, validate_name};
use crate::error::{ArchiveError, ArchiveResult};
use tracing::debug;

/// Convert a block count into the 32-bit table field
pub(super) fn to_block_field(blocks: u64, what: &str) -> ArchiveResult<u32> {
    u32::try_from(blocks).map_err(|_| {
        ArchiveError::DuplicateReservation(format!("{what} of {blocks} blocks exceeds the table field"))
    })
}

impl Archive {
    /// Append a new entry holding `data`
    ///
    /// The payload is placed at the current end of the data region and
    /// zero-padded to a whole block. Unified archives grow their header
    /// reservation first, relocating payloads if the larger table would
    /// overlap them.
    pub fn add(&mut self, name: &str, data: &[u8]) -> ArchiveResult<Entry> {
        self.ensure_writable()?;
        validate_name(name)?;
        if self.contains(name) {
            return Err(ArchiveError::DuplicateName(name.to_string()));
        }

        let size = to_block_field(blocks_for(data.len() as u64), "entry size")?;

        // Plan header growth and placement before touching any state
        let count = self.entries.len() + 1;
        let shift = self.header_shift_for(count);
        let offset = self.planned_data_end(count, shift);
        to_block_field(offset + u64::from(size), "archive size")?;
        let offset = to_block_field(offset, "entry offset")?;

        self.grow_header(count, shift);

        let entry = Entry::new(name, offset, size)?;
        self.ensure_data_blocks(entry.end_block());
        self.fill_payload(&entry, data);

        self.positions.insert(entry.key(), self.entries.len());
        self.entries.push(entry.clone());
        self.dirty = true;

        debug!("Added {entry}");
        Ok(entry)
    }

    /// Overwrite an entry's payload in place
    ///
    /// The entry keeps its blocks; data longer than them is rejected and
    /// shorter data is zero-padded.
    pub fn write_payload(&mut self, name: &str, data: &[u8]) -> ArchiveResult<()> {
        self.ensure_writable()?;
        let position = self
            .position(name)
            .ok_or_else(|| ArchiveError::NotFound(name.to_string()))?;
        let entry = self.entries[position].clone();

        let capacity = entry.size_in_bytes();
        if data.len() as u64 > capacity {
            return Err(ArchiveError::TooLarge {
                size: data.len() as u64,
                capacity,
            });
        }

        // Ensures the range lies inside the buffer
        self.read_payload(&entry)?;
        self.fill_payload(&entry, data);
        self.dirty = true;
        Ok(())
    }

    /// Remove an entry from the table
    ///
    /// Returns `false` when no entry has that name. The payload bytes are
    /// left in place as an unreferenced hole until [`Archive::pack`].
    pub fn remove(&mut self, name: &str) -> ArchiveResult<bool> {
        self.ensure_writable()?;
        let Some(position) = self.position(name) else {
            return Ok(false);
        };

        let entry = self.entries.remove(position);
        self.rebuild_positions();
        self.dirty = true;

        debug!("Removed {entry}");
        Ok(true)
    }

    /// Rename an entry
    ///
    /// Changing only the case of a name is allowed.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> ArchiveResult<()> {
        self.ensure_writable()?;
        validate_name(new_name)?;
        let position = self
            .position(old_name)
            .ok_or_else(|| ArchiveError::NotFound(old_name.to_string()))?;
        if self.position(new_name).is_some_and(|other| other != position) {
            return Err(ArchiveError::DuplicateName(new_name.to_string()));
        }

        self.entries[position].set_name(new_name)?;
        // A case-insensitive twin from a parsed table may still own the old key
        self.rebuild_positions();
        self.dirty = true;

        debug!("Renamed '{old_name}' to '{new_name}'");
        Ok(())
    }

    /// Replace the contents of an existing entry
    ///
    /// Data that needs the same number of blocks is written in place.
    /// Otherwise the entry is removed and added again at the end of the data
    /// region, leaving its old blocks as a hole until [`Archive::pack`].
    pub fn replace(&mut self, name: &str, data: &[u8]) -> ArchiveResult<Entry> {
        self.ensure_writable()?;
        let position = self
            .position(name)
            .ok_or_else(|| ArchiveError::NotFound(name.to_string()))?;

        if u64::from(self.entries[position].size) == blocks_for(data.len() as u64) {
            self.write_payload(name, data)?;
            return Ok(self.entries[position].clone());
        }

        let stored_name = self.entries[position].name().to_string();
        let previous = self.entries.remove(position);
        self.rebuild_positions();

        match self.add(&stored_name, data) {
            Ok(entry) => Ok(entry),
            Err(e) => {
                self.entries.insert(position, previous);
                self.rebuild_positions();
                Err(e)
            }
        }
    }

    /// Replace the named entry if it exists, otherwise add it
    pub fn add_or_replace(&mut self, name: &str, data: &[u8]) -> ArchiveResult<Entry> {
        if self.contains(name) {
            self.replace(name, data)
        } else {
            self.add(name, data)
        }
    }

    /// Copy `data` to the entry's blocks and zero the rest of them
    ///
    /// The caller has checked that the blocks lie inside the buffer and that
    /// `data` fits.
    fn fill_payload(&mut self, entry: &Entry, data: &[u8]) {
        let start = entry.offset_in_bytes() as usize;
        let end = start + entry.size_in_bytes() as usize;
        self.data[start..start + data.len()].copy_from_slice(data);
        self.data[start + data.len()..end].fill(0);
    }
}
