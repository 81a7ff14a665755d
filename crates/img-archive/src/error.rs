//! Error types for archive operations

use thiserror::Error;

/// Archive operation result type
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Error types for archive operations
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Mutating operation attempted on an archive opened read-only
    #[error("Archive is read-only")]
    ReadOnly,

    /// Entry name does not fit in the 24-byte name field
    #[error("Entry name '{name}' is {len} bytes, maximum is {max}")]
    NameTooLong {
        /// The rejected name
        name: String,
        /// Length of the name in bytes
        len: usize,
        /// Maximum permitted length
        max: usize,
    },

    /// Entry name cannot be encoded in the name field
    #[error("Invalid entry name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name
        name: String,
        /// Why the name was rejected
        reason: &'static str,
    },

    /// An entry with the same name (ignoring case) already exists
    #[error("An entry named '{0}' already exists")]
    DuplicateName(String),

    /// No entry with the given name
    #[error("No entry found with name '{0}'")]
    NotFound(String),

    /// Payload range lies outside the data buffer
    #[error("Entry data exceeds archive bounds: bytes {start}..{end}, buffer holds {len}")]
    OutOfBounds {
        /// First byte of the requested range
        start: u64,
        /// One past the last byte of the requested range
        end: u64,
        /// Length of the data buffer
        len: u64,
    },

    /// In-place write larger than the blocks reserved for the entry
    #[error("Data size ({size}) exceeds entry size ({capacity})")]
    TooLarge {
        /// Size of the rejected data in bytes
        size: u64,
        /// Bytes reserved for the entry
        capacity: u64,
    },

    /// Header is truncated or inconsistent with the buffer
    #[error("Malformed archive header: {0}")]
    MalformedHeader(String),

    /// Header space could not be reserved, or block arithmetic left the 32-bit range
    #[error("Failed to reserve header space: {0}")]
    DuplicateReservation(String),

    /// Binary read/write error
    #[error("Binary format error: {0}")]
    BinRead(#[from] binrw::Error),
}

impl ArchiveError {
    /// Check if this error was caused by the archive's access mode
    pub fn is_permission_error(&self) -> bool {
        matches!(self, Self::ReadOnly)
    }

    /// Check if this error rejects caller input without touching the archive
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::NameTooLong { .. }
                | Self::InvalidName { .. }
                | Self::DuplicateName(_)
                | Self::NotFound(_)
                | Self::TooLarge { .. }
        )
    }

    /// Check if this error points at damaged archive contents
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::OutOfBounds { .. } | Self::MalformedHeader(_) | Self::BinRead(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(ArchiveError::ReadOnly.is_permission_error());
        assert!(!ArchiveError::ReadOnly.is_validation_error());

        assert!(ArchiveError::NotFound("a.dff".to_string()).is_validation_error());
        assert!(ArchiveError::DuplicateName("a.dff".to_string()).is_validation_error());
        assert!(
            ArchiveError::TooLarge {
                size: 4097,
                capacity: 4096
            }
            .is_validation_error()
        );

        assert!(
            ArchiveError::OutOfBounds {
                start: 0,
                end: 2048,
                len: 8
            }
            .is_corruption()
        );
        assert!(ArchiveError::MalformedHeader("short".to_string()).is_corruption());
        assert!(!ArchiveError::DuplicateReservation("overflow".to_string()).is_corruption());
    }

    #[test]
    fn test_error_messages() {
        let err = ArchiveError::NameTooLong {
            name: "a".repeat(24),
            len: 24,
            max: 23,
        };
        assert!(err.to_string().contains("maximum is 23"));

        let err = ArchiveError::TooLarge {
            size: 5000,
            capacity: 4096,
        };
        assert_eq!(err.to_string(), "Data size (5000) exceeds entry size (4096)");
    }
}
