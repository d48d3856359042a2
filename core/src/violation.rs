// Consistency rule violations
// The Display text of each variant is the diagnostic printed by the checker and must not change.

use thiserror::Error;

/// A broken consistency rule, with enough context to locate the offender.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("bad inode.")]
    BadInode { inum: u32, raw_type: u16 },

    #[error("bad direct address in inode.")]
    BadDirectAddress { inum: u32, slot: usize, block: u32 },

    #[error("bad indirect address in inode.")]
    BadIndirectAddress { inum: u32, block: u32 },

    #[error("root directory does not exist.")]
    RootDirectoryMissing,

    #[error("directory not properly formatted.")]
    DirectoryNotFormatted { inum: u32 },

    #[error("address used by inode but marked free in bitmap.")]
    AddressMarkedFree { inum: u32, block: u32 },

    #[error("bitmap marks block in use but it is not in use.")]
    BitmapBlockUnused { block: u32 },

    #[error("direct address used more than once.")]
    DirectAddressReused { inum: u32, block: u32 },

    #[error("indirect address used more than once.")]
    IndirectAddressReused { inum: u32, block: u32 },

    #[error("inode marked use but not found in a directory.")]
    InodeNotInDirectory { inum: u32 },

    #[error("inode referred to in directory but marked free.")]
    InodeReferencedButFree { dir: u32, inum: u32 },

    #[error("bad reference count for file.")]
    BadFileReferenceCount { inum: u32, nlink: u16, references: u32 },

    #[error("directory appears more than once in file system.")]
    DirectoryLinkedTwice { inum: u32, references: u32 },
}

impl Violation {
    /// Number of the consistency rule this violation breaks (1 through 12).
    pub fn rule(&self) -> u8 {
        match self {
            Violation::BadInode { .. } => 1,
            Violation::BadDirectAddress { .. } | Violation::BadIndirectAddress { .. } => 2,
            Violation::RootDirectoryMissing => 3,
            Violation::DirectoryNotFormatted { .. } => 4,
            Violation::AddressMarkedFree { .. } => 5,
            Violation::BitmapBlockUnused { .. } => 6,
            Violation::DirectAddressReused { .. } => 7,
            Violation::IndirectAddressReused { .. } => 8,
            Violation::InodeNotInDirectory { .. } => 9,
            Violation::InodeReferencedButFree { .. } => 10,
            Violation::BadFileReferenceCount { .. } => 11,
            Violation::DirectoryLinkedTwice { .. } => 12,
        }
    }
}
