// xv6 filesystem constants
// Fixed geometry of the on-disk format; every image this checker accepts uses these values.

/// Block size in bytes
pub const BSIZE: usize = 512;

/// Root directory inode number
pub const ROOT_INO: u32 = 1;

// Block indices of the fixed header
pub const SUPERBLOCK_BLOCK: u32 = 1;
pub const INODE_TABLE_BLOCK: u32 = 2;

// Superblock field offsets (all u32, little-endian)
pub const SB_SIZE: usize = 0x00;
pub const SB_NBLOCKS: usize = 0x04;
pub const SB_NINODES: usize = 0x08;
pub const SB_NLOG: usize = 0x0C;
pub const SUPERBLOCK_SIZE: usize = 16;

/// Direct block pointers per inode
pub const NDIRECT: usize = 12;
/// Block pointers stored in one indirect block
pub const NINDIRECT: usize = BSIZE / 4;

// On-disk inode field offsets
pub const DI_TYPE: usize = 0x00;
pub const DI_MAJOR: usize = 0x02;
pub const DI_MINOR: usize = 0x04;
pub const DI_NLINK: usize = 0x06;
pub const DI_SIZE: usize = 0x08;
pub const DI_ADDRS: usize = 0x0C;
pub const INODE_SIZE: usize = 64;

/// Inodes per block
pub const IPB: u32 = (BSIZE / INODE_SIZE) as u32;
/// Bitmap bits per block
pub const BPB: u32 = (BSIZE * 8) as u32;

// Directory entry layout
pub const DIRSIZ: usize = 14;
pub const DE_INUM: usize = 0x00;
pub const DE_NAME: usize = 0x02;
pub const DIRENT_SIZE: usize = 16;
pub const DIRENTS_PER_BLOCK: usize = BSIZE / DIRENT_SIZE;

// Inode type tags
pub const T_UNUSED: u16 = 0;
pub const T_DIR: u16 = 1;
pub const T_FILE: u16 = 2;
pub const T_DEV: u16 = 3;
