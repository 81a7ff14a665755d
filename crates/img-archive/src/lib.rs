//! Read/modify/write engine for IMG game asset archives
//!
#![allow(clippy::cast_possible_truncation)] // Block counts are range-checked before narrowing
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::doc_markdown)] // Format tags like VER2 don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::return_self_not_must_use)] // Builder patterns
//! An IMG archive is a flat table of `(name, block offset, block length)`
//! records followed by raw file payloads, everything addressed in 2048-byte
//! blocks. This crate parses such archives from byte buffers, edits them in
//! memory and serializes them back, byte for byte.
//!
//! # Supported Layouts
//!
//! - **Unified (`VER2`)**: one file holding a `VER2` tag, an entry count, the
//!   table and then the payloads
//! - **Split (`VER1`)**: an index file of bare records next to a data file
//!   holding only payloads
//!
//! # Design Principles
//!
//! - **Buffers In, Buffers Out**: the caller performs all file I/O
//! - **Lazy Headers**: mutations edit the table in memory; [`Archive::sync`]
//!   writes it back
//! - **All or Nothing**: a failed operation leaves table, index and buffers
//!   untouched
//! - **Round-Trip Guarantee**: syncing an unmodified archive reproduces its
//!   input bytes
//!
//! # Example
//!
//! ```rust
//! use img_archive::{Archive, Layout};
//!
//! let mut archive = Archive::create(Layout::Unified);
//! archive.add("a.txt", &[1u8; 5000])?;
//! archive.add("b.txt", b"hello")?;
//! archive.remove("a.txt")?;
//!
//! let blocks = archive.pack()?;
//! assert_eq!(blocks, 2); // one header block, one payload block
//!
//! archive.sync()?;
//! let bytes = archive.into_buffers().data;
//! assert_eq!(&bytes[..4], b"VER2");
//! # Ok::<(), img_archive::ArchiveError>(())
//! ```

#![warn(missing_docs)]

/// In-memory archive with parsing, mutation, packing and serialization
pub mod archive;
/// Entry value type and block/name conversions
pub mod entry;
mod error;
/// Binary codec for headers and table records
pub mod header;
/// Layout variants and open options
pub mod layout;

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
pub(crate) mod test_utils;

pub use archive::{Archive, ArchiveBuffers};
pub use entry::{Entry, blocks_for, blocks_to_bytes, bytes_to_name, name_to_bytes, validate_name};
pub use error::{ArchiveError, ArchiveResult};
pub use layout::{AccessMode, ArchiveOptions, Layout};

/// Archive format constants
pub mod constants {
    /// Size of one allocation block in bytes
    pub const BLOCK_SIZE: usize = 2048;

    /// Size of one table record in bytes (offset + size + name)
    pub const RECORD_SIZE: usize = 32;

    /// Width of the name field in bytes
    pub const NAME_FIELD_SIZE: usize = 24;

    /// Longest name that still leaves room for a NUL terminator
    pub const MAX_NAME_LENGTH: usize = NAME_FIELD_SIZE - 1;

    /// Tag opening a unified archive
    pub const VER2_MAGIC: [u8; 4] = *b"VER2";

    /// Size of the unified header (tag + entry count)
    pub const UNIFIED_HEADER_SIZE: usize = 8;
}
