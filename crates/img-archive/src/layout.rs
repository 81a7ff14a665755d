//! On-disk layout variants and open options

use crate::constants::{RECORD_SIZE, UNIFIED_HEADER_SIZE, VER2_MAGIC};
use crate::entry::blocks_for;
use std::fmt;

/// Physical arrangement of table and payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Single buffer: `VER2` header, entry table, then payloads
    Unified,
    /// Separate index buffer of bare records and a payload-only data buffer
    Split,
}

impl Layout {
    /// Detect the layout from the first four bytes of a buffer
    ///
    /// Only an exact `VER2` tag identifies the unified layout; anything else,
    /// including a buffer too short to hold a tag, is treated as split.
    pub fn guess(data: &[u8]) -> Self {
        if data.len() >= VER2_MAGIC.len() && data[..VER2_MAGIC.len()] == VER2_MAGIC {
            Self::Unified
        } else {
            Self::Split
        }
    }

    /// Version tag used by the games for this layout
    pub fn version_name(self) -> &'static str {
        match self {
            Self::Unified => "VER2",
            Self::Split => "VER1",
        }
    }

    /// Bytes of header that precede the records in the data buffer
    pub fn header_prefix_size(self) -> usize {
        match self {
            Self::Unified => UNIFIED_HEADER_SIZE,
            Self::Split => 0,
        }
    }

    /// Bytes occupied by a table of `count` records, including any header prefix
    pub fn table_size(self, count: usize) -> u64 {
        (self.header_prefix_size() + count * RECORD_SIZE) as u64
    }

    /// Blocks the data buffer must reserve in front of the payloads for `count` records
    pub fn header_blocks(self, count: usize) -> u64 {
        match self {
            Self::Unified => blocks_for(self.table_size(count)),
            Self::Split => 0,
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.version_name())
    }
}

/// Whether mutating operations are permitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// Every mutating operation fails with `ReadOnly`
    ReadOnly,
    /// Full access
    #[default]
    ReadWrite,
}

impl AccessMode {
    /// Check if mutation is allowed
    pub fn is_writable(self) -> bool {
        self == Self::ReadWrite
    }
}

/// Options controlling how an archive is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArchiveOptions {
    /// Access mode
    pub mode: AccessMode,
    /// Fail on truncated headers instead of degrading to a shorter table
    pub strict: bool,
}

impl ArchiveOptions {
    /// Default options: read-write, lenient parsing
    pub fn new() -> Self {
        Self::default()
    }

    /// Open read-only
    pub fn read_only(mut self) -> Self {
        self.mode = AccessMode::ReadOnly;
        self
    }

    /// Set the access mode
    pub fn mode(mut self, mode: AccessMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable or disable strict header parsing
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}
