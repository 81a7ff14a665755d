//! Test utilities for building raw archive buffers
//!
//! Tests describe tables as `(offset, size, name)` triples and get back the
//! exact bytes a game tool would have written.

use crate::constants::{BLOCK_SIZE, VER2_MAGIC};
use crate::entry::name_to_bytes;

/// Encode bare 32-byte records
pub fn records(table: &[(u32, u32, &str)]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(table.len() * 32);
    for &(offset, size, name) in table {
        bytes.extend_from_slice(&offset.to_le_bytes());
        bytes.extend_from_slice(&size.to_le_bytes());
        bytes.extend_from_slice(&name_to_bytes(name));
    }
    bytes
}

/// Build a unified archive of `total_blocks` blocks with the given table
///
/// Each entry's blocks are filled with a byte derived from its position so
/// tests can tell payloads apart.
pub fn unified_archive(table: &[(u32, u32, &str)], total_blocks: usize) -> Vec<u8> {
    let mut data = vec![0u8; total_blocks * BLOCK_SIZE];
    data[..4].copy_from_slice(&VER2_MAGIC);
    data[4..8].copy_from_slice(&(table.len() as u32).to_le_bytes());
    let table_bytes = records(table);
    data[8..8 + table_bytes.len()].copy_from_slice(&table_bytes);
    fill_payloads(&mut data, table);
    data
}

/// Build the data half of a split archive
pub fn split_data(table: &[(u32, u32, &str)], total_blocks: usize) -> Vec<u8> {
    let mut data = vec![0u8; total_blocks * BLOCK_SIZE];
    fill_payloads(&mut data, table);
    data
}

/// Marker byte written into the payload of the entry at `position`
pub fn marker(position: usize) -> u8 {
    (position as u8).wrapping_mul(37).wrapping_add(1)
}

fn fill_payloads(data: &mut [u8], table: &[(u32, u32, &str)]) {
    for (position, &(offset, size, _)) in table.iter().enumerate() {
        let start = offset as usize * BLOCK_SIZE;
        let end = start + size as usize * BLOCK_SIZE;
        data[start..end].fill(marker(position));
    }
}

/// Deterministic payload of `len` bytes
pub fn payload(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed) | 1)
        .collect()
}
