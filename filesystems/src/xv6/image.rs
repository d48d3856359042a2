// Decoded view of an xv6 image
// Bounds-checked record access plus the block and directory walkers shared by the validators.

use super::bitmap::BlockBitmap;
use super::constants::*;
use super::geometry::Geometry;
use super::structures::{DirentRef, IndirectBlock, InodeRef, Superblock};
use fcheck_core::{region, FsckError, FsckResult};
use log::{debug, info, trace};

/// Where a block pointer was found inside an inode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRefKind {
    Direct { slot: usize },
    Indirect,
    IndirectEntry { slot: usize },
}

/// A non-zero block pointer reachable from an inode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRef {
    pub block: u32,
    pub kind: BlockRefKind,
}

impl BlockRef {
    pub fn is_direct(&self) -> bool {
        matches!(self.kind, BlockRefKind::Direct { .. })
    }

    /// True for blocks holding file contents (everything but the indirect block itself).
    pub fn is_data(&self) -> bool {
        !matches!(self.kind, BlockRefKind::Indirect)
    }
}

/// Read-only xv6 image: the raw buffer, its superblock, and the layout derived from it
#[derive(Debug, Clone, Copy)]
pub struct Xv6Image<'a> {
    bytes: &'a [u8],
    superblock: Superblock,
    geometry: Geometry,
}

impl<'a> Xv6Image<'a> {
    /// Decode the superblock and resolve the layout. The buffer must hold every declared block.
    pub fn new(bytes: &'a [u8]) -> FsckResult<Self> {
        let superblock = Superblock::decode(bytes)?;
        info!(
            "Superblock: size {} nblocks {} ninodes {} nlog {}",
            superblock.size, superblock.nblocks, superblock.ninodes, superblock.nlog
        );

        let geometry = Geometry::resolve(superblock.ninodes, superblock.size)?;
        debug!(
            "Geometry: {} inode blocks, bitmap blocks {}..={}, data blocks {}..{}",
            geometry.inode_blocks,
            geometry.bitmap_start,
            geometry.last_bitmap_block,
            geometry.first_data_block,
            geometry.block_count
        );

        if (bytes.len() as u64) < geometry.image_len() {
            return Err(FsckError::Decode {
                what: "image blocks declared by superblock",
                offset: 0,
                len: usize::try_from(geometry.image_len()).unwrap_or(usize::MAX),
                image_len: bytes.len(),
            });
        }

        Ok(Self { bytes, superblock, geometry })
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn superblock(&self) -> &Superblock {
        &self.superblock
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn inode_count(&self) -> u32 {
        self.geometry.inode_count
    }

    pub fn inode(&self, inum: u32) -> FsckResult<InodeRef<'a>> {
        let offset = self.geometry.inode_offset(inum);
        if inum >= self.geometry.inode_count {
            return Err(FsckError::Decode {
                what: "inode beyond inode table",
                offset,
                len: INODE_SIZE,
                image_len: self.bytes.len(),
            });
        }
        let raw = region(self.bytes, offset, INODE_SIZE, "inode")?;
        Ok(InodeRef::new(inum, raw))
    }

    /// Inodes 1 through `inode_count - 1`; slot 0 is never used.
    pub fn inodes(&self) -> impl Iterator<Item = FsckResult<InodeRef<'a>>> + '_ {
        (1..self.geometry.inode_count).map(move |inum| self.inode(inum))
    }

    pub fn block(&self, block: u32) -> FsckResult<&'a [u8]> {
        region(self.bytes, Geometry::block_offset(block), BSIZE, "block")
    }

    pub fn indirect_block(&self, block: u32) -> FsckResult<IndirectBlock<'a>> {
        let raw = region(self.bytes, Geometry::block_offset(block), BSIZE, "indirect block")?;
        Ok(IndirectBlock::new(block, raw))
    }

    pub fn dirent(&self, block: u32, slot: usize) -> FsckResult<DirentRef<'a>> {
        let offset = Geometry::block_offset(block) + (slot * DIRENT_SIZE) as u64;
        let raw = region(self.bytes, offset, DIRENT_SIZE, "directory entry")?;
        Ok(DirentRef::new(block, slot, raw))
    }

    pub fn bitmap(&self) -> FsckResult<BlockBitmap<'a>> {
        let len = self.geometry.bitmap_blocks as usize * BSIZE;
        let raw = region(self.bytes, self.geometry.bitmap_offset(), len, "bitmap")?;
        Ok(BlockBitmap::new(raw, self.geometry.block_count))
    }

    /// Every non-zero pointer of `inode`: direct slots in order, the indirect pointer,
    /// then the indirect block's slots in order. The indirect block is only read when it
    /// lies in the data region.
    pub fn block_refs(&self, inode: &InodeRef<'a>) -> FsckResult<Vec<BlockRef>> {
        let mut refs: Vec<BlockRef> = inode
            .direct()
            .filter(|&(_, block)| block != 0)
            .map(|(slot, block)| BlockRef { block, kind: BlockRefKind::Direct { slot } })
            .collect();

        let indirect = inode.indirect();
        if indirect == 0 {
            return Ok(refs);
        }
        refs.push(BlockRef { block: indirect, kind: BlockRefKind::Indirect });

        if self.geometry.is_data_block(indirect) {
            let table = self.indirect_block(indirect)?;
            trace!("inode {}: following indirect block {}", inode.inum(), table.block());
            refs.extend(
                table
                    .entries()
                    .filter(|&(_, block)| block != 0)
                    .map(|(slot, block)| BlockRef { block, kind: BlockRefKind::IndirectEntry { slot } }),
            );
        }

        Ok(refs)
    }

    /// Non-empty entries of a directory: direct blocks first, then indirect-referenced blocks.
    pub fn dir_entries(&self, dir: &InodeRef<'a>) -> FsckResult<Vec<DirentRef<'a>>> {
        let mut entries = Vec::new();
        for block_ref in self.block_refs(dir)?.into_iter().filter(BlockRef::is_data) {
            let raw = self.block(block_ref.block)?;
            entries.extend(
                raw.chunks_exact(DIRENT_SIZE)
                    .enumerate()
                    .map(|(slot, raw)| DirentRef::new(block_ref.block, slot, raw))
                    .filter(|entry| !entry.is_empty()),
            );
        }
        Ok(entries)
    }
}
