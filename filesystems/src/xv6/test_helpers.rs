// Test helpers: an in-memory mkfs
// Builds small, valid xv6 images and exposes raw patch helpers so tests can corrupt them precisely.

use super::constants::*;
use super::geometry::Geometry;
use super::structures::{DiskDirent, DiskInode, InodeRef, InodeType, Superblock};
use byteorder::{ByteOrder, LittleEndian};

/// Writes an xv6 image the way mkfs lays it out: metadata bits set, root directory with `.` and `..`.
#[derive(Debug, Clone)]
pub struct ImageBuilder {
    bytes: Vec<u8>,
    geometry: Geometry,
    superblock: Superblock,
    next_inode: u32,
    next_block: u32,
}

impl ImageBuilder {
    pub const DEFAULT_BLOCKS: u32 = 64;
    pub const DEFAULT_INODES: u32 = 16;

    pub fn new() -> Self {
        Self::with_geometry(Self::DEFAULT_INODES, Self::DEFAULT_BLOCKS)
    }

    pub fn with_geometry(inode_count: u32, block_count: u32) -> Self {
        let geometry = Geometry::resolve(inode_count, block_count).expect("builder geometry must be valid");
        let superblock = Superblock {
            size: block_count,
            nblocks: geometry.data_block_count(),
            ninodes: inode_count,
            nlog: 0,
        };

        let mut builder = Self {
            bytes: vec![0u8; geometry.image_len() as usize],
            geometry,
            superblock,
            next_inode: ROOT_INO,
            next_block: geometry.first_data_block,
        };
        builder.write_superblock();
        for block in 0..geometry.first_data_block {
            builder.set_bitmap_bit(block, true);
        }

        let root = builder.alloc_inode(InodeType::Directory);
        assert_eq!(root, ROOT_INO);
        builder.link(root, ".", root);
        builder.link(root, "..", root);
        builder
    }

    /// Rewrite superblock fields after layout (the layout itself is not recomputed).
    pub fn with_superblock(mut self, edit: impl FnOnce(&mut Superblock)) -> Self {
        edit(&mut self.superblock);
        self.write_superblock();
        self
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    fn write_superblock(&mut self) {
        let offset = SUPERBLOCK_BLOCK as usize * BSIZE;
        self.superblock.encode(&mut self.bytes[offset..offset + SUPERBLOCK_SIZE]);
    }

    /// Next free data block, marked in the bitmap
    pub fn alloc_block(&mut self) -> u32 {
        let block = self.next_block;
        assert!(block < self.geometry.block_count, "image is out of data blocks");
        self.next_block += 1;
        self.set_bitmap_bit(block, true);
        block
    }

    /// Next free inode with the given type and one link
    pub fn alloc_inode(&mut self, kind: InodeType) -> u32 {
        let inum = self.next_inode;
        assert!(inum < self.geometry.inode_count, "image is out of inodes");
        self.next_inode += 1;
        let disk = DiskInode { kind: kind.as_raw(), nlink: 1, ..Default::default() };
        self.put_inode(inum, &disk);
        inum
    }

    pub fn inode(&self, inum: u32) -> DiskInode {
        let offset = self.geometry.inode_offset(inum) as usize;
        InodeRef::new(inum, &self.bytes[offset..offset + INODE_SIZE]).to_disk()
    }

    pub fn put_inode(&mut self, inum: u32, disk: &DiskInode) {
        let offset = self.geometry.inode_offset(inum) as usize;
        disk.encode(&mut self.bytes[offset..offset + INODE_SIZE]);
    }

    pub fn set_nlink(&mut self, inum: u32, nlink: u16) {
        let mut disk = self.inode(inum);
        disk.nlink = nlink;
        self.put_inode(inum, &disk);
    }

    pub fn set_bitmap_bit(&mut self, block: u32, used: bool) {
        let offset = self.geometry.bitmap_offset() as usize + (block / 8) as usize;
        let mask = 1u8 << (block % 8);
        if used {
            self.bytes[offset] |= mask;
        } else {
            self.bytes[offset] &= !mask;
        }
    }

    pub fn put_dirent(&mut self, block: u32, slot: usize, inum: u16, name: &str) {
        let offset = block as usize * BSIZE + slot * DIRENT_SIZE;
        DiskDirent::new(inum, name).encode(&mut self.bytes[offset..offset + DIRENT_SIZE]);
    }

    pub fn indirect_entry(&self, block: u32, slot: usize) -> u32 {
        let offset = block as usize * BSIZE + slot * 4;
        LittleEndian::read_u32(&self.bytes[offset..])
    }

    pub fn put_indirect(&mut self, block: u32, slot: usize, value: u32) {
        let offset = block as usize * BSIZE + slot * 4;
        LittleEndian::write_u32(&mut self.bytes[offset..], value);
    }

    /// Block holding file block `index` of `disk`, allocated on first use
    fn file_block(&mut self, disk: &mut DiskInode, index: usize) -> u32 {
        if index < NDIRECT {
            if disk.addrs[index] == 0 {
                disk.addrs[index] = self.alloc_block();
            }
            return disk.addrs[index];
        }

        let slot = index - NDIRECT;
        assert!(slot < NINDIRECT, "file block {} is past the maximum file size", index);
        if disk.addrs[NDIRECT] == 0 {
            disk.addrs[NDIRECT] = self.alloc_block();
        }
        let table = disk.addrs[NDIRECT];
        let mut block = self.indirect_entry(table, slot);
        if block == 0 {
            block = self.alloc_block();
            self.put_indirect(table, slot, block);
        }
        block
    }

    /// Append a directory entry to `dir`, growing it by a block when the last one is full.
    pub fn link(&mut self, dir: u32, name: &str, target: u32) {
        let mut disk = self.inode(dir);
        let index = disk.size as usize / DIRENT_SIZE;
        let block = self.file_block(&mut disk, index / DIRENTS_PER_BLOCK);
        self.put_dirent(block, index % DIRENTS_PER_BLOCK, target as u16, name);
        disk.size += DIRENT_SIZE as u32;
        self.put_inode(dir, &disk);
    }

    pub fn mkdir(&mut self, parent: u32, name: &str) -> u32 {
        let inum = self.alloc_inode(InodeType::Directory);
        self.link(inum, ".", inum);
        self.link(inum, "..", parent);
        self.link(parent, name, inum);
        inum
    }

    /// Regular file with `blocks` full data blocks, linked once under `parent`.
    pub fn create_file(&mut self, parent: u32, name: &str, blocks: usize) -> u32 {
        let inum = self.alloc_inode(InodeType::File);
        let mut disk = self.inode(inum);
        for index in 0..blocks {
            self.file_block(&mut disk, index);
        }
        disk.size = (blocks * BSIZE) as u32;
        self.put_inode(inum, &disk);
        self.link(parent, name, inum);
        inum
    }

    pub fn mknod(&mut self, parent: u32, name: &str, major: u16, minor: u16) -> u32 {
        let inum = self.alloc_inode(InodeType::Device);
        let mut disk = self.inode(inum);
        disk.major = major;
        disk.minor = minor;
        self.put_inode(inum, &disk);
        self.link(parent, name, inum);
        inum
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}
