//! Archive entry value type and block/name conversions

use crate::constants::{BLOCK_SIZE, MAX_NAME_LENGTH, NAME_FIELD_SIZE};
use crate::error::{ArchiveError, ArchiveResult};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt;
use std::ops::Range;

/// One stored file: a name plus the block range holding its payload
///
/// Offsets and sizes are counted in 2048-byte blocks. The raw 24-byte name
/// field is kept alongside the decoded name so that an unmodified entry is
/// written back byte for byte, including whatever follows the NUL terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Position of the payload start, in blocks
    pub offset: u32,
    /// Payload length rounded up to whole blocks
    pub size: u32,
    name: String,
    name_field: [u8; NAME_FIELD_SIZE],
}

impl Entry {
    /// Create a new entry, validating the name
    pub fn new(name: &str, offset: u32, size: u32) -> ArchiveResult<Self> {
        validate_name(name)?;
        Ok(Self {
            offset,
            size,
            name: name.to_string(),
            name_field: name_to_bytes(name),
        })
    }

    /// Build an entry from a raw table record
    pub(crate) fn from_raw(offset: u32, size: u32, name_field: [u8; NAME_FIELD_SIZE]) -> Self {
        Self {
            offset,
            size,
            name: bytes_to_name(&name_field),
            name_field,
        }
    }

    /// Name as stored, case preserved
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw 24-byte name field as it will be serialized
    pub fn name_field(&self) -> &[u8; NAME_FIELD_SIZE] {
        &self.name_field
    }

    /// Lowercase lookup key for this entry
    pub fn key(&self) -> String {
        lookup_key(&self.name)
    }

    pub(crate) fn set_name(&mut self, name: &str) -> ArchiveResult<()> {
        validate_name(name)?;
        self.name = name.to_string();
        self.name_field = name_to_bytes(name);
        Ok(())
    }

    /// Payload start in bytes
    pub fn offset_in_bytes(&self) -> u64 {
        blocks_to_bytes(u64::from(self.offset))
    }

    /// Reserved payload length in bytes
    pub fn size_in_bytes(&self) -> u64 {
        blocks_to_bytes(u64::from(self.size))
    }

    /// First block past the payload
    pub fn end_block(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.size)
    }

    /// Byte range occupied by the payload
    pub fn byte_range(&self) -> Range<u64> {
        self.offset_in_bytes()..self.offset_in_bytes() + self.size_in_bytes()
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Offset: {}, Size: {} blocks)",
            self.name, self.offset, self.size
        )
    }
}

impl Serialize for Entry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Entry", 4)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("offset", &self.offset)?;
        state.serialize_field("size", &self.size)?;
        state.serialize_field("sizeInBytes", &self.size_in_bytes())?;
        state.end()
    }
}

/// Encode a name into the fixed 24-byte field
///
/// Names longer than 23 bytes are truncated so the field always keeps a NUL
/// terminator. Callers that must not truncate check with [`validate_name`].
pub fn name_to_bytes(name: &str) -> [u8; NAME_FIELD_SIZE] {
    let mut field = [0u8; NAME_FIELD_SIZE];
    let bytes = name.as_bytes();
    let len = bytes.len().min(MAX_NAME_LENGTH);
    field[..len].copy_from_slice(&bytes[..len]);
    field
}

/// Decode a name field up to the first NUL (or the end of the field)
pub fn bytes_to_name(field: &[u8]) -> String {
    let len = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..len]).into_owned()
}

/// Number of blocks needed to hold `byte_len` bytes
pub fn blocks_for(byte_len: u64) -> u64 {
    byte_len.div_ceil(BLOCK_SIZE as u64)
}

/// Byte length of `blocks` blocks
pub fn blocks_to_bytes(blocks: u64) -> u64 {
    blocks * BLOCK_SIZE as u64
}

/// Check that a name fits the name field without truncation
pub fn validate_name(name: &str) -> ArchiveResult<()> {
    if name.is_empty() {
        return Err(ArchiveError::InvalidName {
            name: name.to_string(),
            reason: "name is empty",
        });
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(ArchiveError::NameTooLong {
            name: name.to_string(),
            len: name.len(),
            max: MAX_NAME_LENGTH,
        });
    }
    if !name.is_ascii() {
        return Err(ArchiveError::InvalidName {
            name: name.to_string(),
            reason: "name must be ASCII",
        });
    }
    if name.contains('\0') {
        return Err(ArchiveError::InvalidName {
            name: name.to_string(),
            reason: "name contains a NUL byte",
        });
    }
    Ok(())
}

/// Case-insensitive lookup key
pub(crate) fn lookup_key(name: &str) -> String {
    name.to_ascii_lowercase()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_for() {
        assert_eq!(blocks_for(0), 0);
        assert_eq!(blocks_for(1), 1);
        assert_eq!(blocks_for(2048), 1);
        assert_eq!(blocks_for(2049), 2);
        assert_eq!(blocks_for(5000), 3);
        assert_eq!(blocks_to_bytes(3), 6144);
    }

    #[test]
    fn test_name_field_encoding() {
        let field = name_to_bytes("player.dff");
        assert_eq!(&field[..10], b"player.dff");
        assert!(field[10..].iter().all(|&b| b == 0));
        assert_eq!(bytes_to_name(&field), "player.dff");
    }

    #[test]
    fn test_name_truncation_keeps_terminator() {
        let long = "abcdefghijklmnopqrstuvwxyz";
        let field = name_to_bytes(long);
        assert_eq!(field[23], 0);
        assert_eq!(bytes_to_name(&field), &long[..23]);
    }

    #[test]
    fn test_name_without_terminator() {
        let field = [b'x'; NAME_FIELD_SIZE];
        assert_eq!(bytes_to_name(&field), "x".repeat(24));
    }

    #[test]
    fn test_garbage_after_terminator_is_preserved() {
        let mut field = name_to_bytes("a.txd");
        field[10] = 0xCD;
        let entry = Entry::from_raw(1, 1, field);
        assert_eq!(entry.name(), "a.txd");
        assert_eq!(entry.name_field()[10], 0xCD);
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("a.dff").is_ok());
        assert!(validate_name(&"a".repeat(23)).is_ok());
        assert!(matches!(
            validate_name(&"a".repeat(24)),
            Err(ArchiveError::NameTooLong { len: 24, max: 23, .. })
        ));
        assert!(matches!(
            validate_name(""),
            Err(ArchiveError::InvalidName { .. })
        ));
        assert!(matches!(
            validate_name("caf\u{e9}.txd"),
            Err(ArchiveError::InvalidName { .. })
        ));
        assert!(matches!(
            validate_name("a\0b"),
            Err(ArchiveError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_entry_units() {
        let entry = Entry::new("Vehicle.TXD", 4, 3).unwrap();
        assert_eq!(entry.offset_in_bytes(), 8192);
        assert_eq!(entry.size_in_bytes(), 6144);
        assert_eq!(entry.end_block(), 7);
        assert_eq!(entry.byte_range(), 8192..14336);
        assert_eq!(entry.key(), "vehicle.txd");
        assert_eq!(
            entry.to_string(),
            "Vehicle.TXD (Offset: 4, Size: 3 blocks)"
        );
    }

    #[test]
    fn test_entry_serializes_listing_shape() {
        let entry = Entry::new("a.col", 1, 2).unwrap();
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["name"], "a.col");
        assert_eq!(json["offset"], 1);
        assert_eq!(json["size"], 2);
        assert_eq!(json["sizeInBytes"], 4096);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Block count always covers the byte length with less than one block of slack
            #[test]
            fn blocks_cover_length(len in 0u64..(1u64 << 40)) {
                let blocks = blocks_for(len);
                prop_assert!(blocks_to_bytes(blocks) >= len);
                prop_assert!(blocks_to_bytes(blocks) < len + BLOCK_SIZE as u64);
            }

            /// Valid names survive the fixed-width field unchanged
            #[test]
            fn name_field_preserves_valid_names(name in "[A-Za-z0-9_.]{1,23}") {
                let field = name_to_bytes(&name);
                prop_assert_eq!(bytes_to_name(&field), name);
            }
        }
    }
}
