// Image geometry
// Layout: boot block, superblock, inode table, bitmap, then data blocks.

use super::constants::*;
use fcheck_core::{FsckError, FsckResult};

/// Block and byte positions derived from the superblock counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub inode_count: u32,
    pub block_count: u32,
    pub inode_blocks: u32,
    pub bitmap_start: u32,
    pub bitmap_blocks: u32,
    pub last_bitmap_block: u32,
    pub first_data_block: u32,
}

impl Geometry {
    pub fn resolve(inode_count: u32, block_count: u32) -> FsckResult<Self> {
        if inode_count == 0 {
            return Err(FsckError::Geometry("superblock declares zero inodes".to_string()));
        }
        if block_count == 0 {
            return Err(FsckError::Geometry("superblock declares zero blocks".to_string()));
        }

        let inode_blocks = (inode_count as u64).div_ceil(IPB as u64);
        let bitmap_start = INODE_TABLE_BLOCK as u64 + inode_blocks;
        let bitmap_blocks = (block_count as u64).div_ceil(BPB as u64);
        let last_bitmap_block = bitmap_start + bitmap_blocks - 1;
        let first_data_block = last_bitmap_block + 1;

        if first_data_block >= block_count as u64 {
            return Err(FsckError::Geometry(format!(
                "metadata ends at block {} but the image has only {} blocks",
                last_bitmap_block, block_count
            )));
        }

        // Everything below is < block_count, so the narrowing casts are lossless.
        Ok(Self {
            inode_count,
            block_count,
            inode_blocks: inode_blocks as u32,
            bitmap_start: bitmap_start as u32,
            bitmap_blocks: bitmap_blocks as u32,
            last_bitmap_block: last_bitmap_block as u32,
            first_data_block: first_data_block as u32,
        })
    }

    /// Byte offset of the inode table (inode 0)
    pub fn inode_table_offset(&self) -> u64 {
        INODE_TABLE_BLOCK as u64 * BSIZE as u64
    }

    /// Byte offset of the first bitmap block
    pub fn bitmap_offset(&self) -> u64 {
        self.bitmap_start as u64 * BSIZE as u64
    }

    pub fn inode_offset(&self, inum: u32) -> u64 {
        self.inode_table_offset() + inum as u64 * INODE_SIZE as u64
    }

    pub fn block_offset(block: u32) -> u64 {
        block as u64 * BSIZE as u64
    }

    /// True for blocks strictly between the last bitmap block and the block count.
    pub fn is_data_block(&self, block: u32) -> bool {
        block > self.last_bitmap_block && block < self.block_count
    }

    pub fn data_block_count(&self) -> u32 {
        self.block_count - self.first_data_block
    }

    /// Minimum image length in bytes for the declared block count
    pub fn image_len(&self) -> u64 {
        self.block_count as u64 * BSIZE as u64
    }
}
